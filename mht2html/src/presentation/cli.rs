use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use mht_core::{BoundarySource, HashAlgo, RewriteMode};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Unpack .mht web archives into plain files", long_about = None)]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract images and text parts of an archive into a directory
    Convert {
        /// Archive to convert; asked for on stdin when omitted
        source: Option<PathBuf>,

        /// Output directory, created when missing
        #[arg(long, default_value = "./html")]
        out: PathBuf,

        /// Store images under a content hash and rewrite references to them
        #[arg(long)]
        rename_images: bool,

        /// Digest used by --rename-images
        #[arg(long, value_enum, default_value_t = HashArg::Md5)]
        hash: HashArg,

        #[arg(long, value_enum, default_value_t = RewriteArg::ImgAttribute)]
        rewrite: RewriteArg,

        #[arg(long, value_enum, default_value_t = BoundaryArg::FollowingLine)]
        boundary: BoundaryArg,

        /// Read size in bytes for scanning and copying (default 100 KiB)
        #[arg(long)]
        chunk_size: Option<NonZeroUsize>,

        /// Print a JSON report instead of the file list
        #[arg(long)]
        json: bool,
    },

    /// Index an archive and print its parts
    Parts {
        source: PathBuf,

        #[arg(long, value_enum, default_value_t = BoundaryArg::FollowingLine)]
        boundary: BoundaryArg,

        #[arg(long)]
        chunk_size: Option<NonZeroUsize>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum HashArg {
    Md5,
    Blake3,
}

impl From<HashArg> for HashAlgo {
    fn from(a: HashArg) -> Self {
        match a {
            HashArg::Md5 => HashAlgo::Md5,
            HashArg::Blake3 => HashAlgo::Blake3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RewriteArg {
    /// Only quoted values inside <img> tags
    ImgAttribute,
    /// Every occurrence of the original name
    Substring,
}

impl From<RewriteArg> for RewriteMode {
    fn from(a: RewriteArg) -> Self {
        match a {
            RewriteArg::ImgAttribute => RewriteMode::ImgAttribute,
            RewriteArg::Substring => RewriteMode::Substring,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BoundaryArg {
    /// First non-blank line after the boundary declaration
    FollowingLine,
    /// `--` plus the declared boundary value
    Declared,
}

impl From<BoundaryArg> for BoundarySource {
    fn from(a: BoundaryArg) -> Self {
        match a {
            BoundaryArg::FollowingLine => BoundarySource::FollowingLine,
            BoundaryArg::Declared => BoundarySource::Declared,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn convert_defaults() {
        let cli = Cli::try_parse_from(["mht2html", "convert", "page.mht"]).unwrap();
        match cli.command {
            Commands::Convert {
                source,
                out,
                rename_images,
                hash,
                rewrite,
                boundary,
                chunk_size,
                json,
            } => {
                assert_eq!(source, Some(PathBuf::from("page.mht")));
                assert_eq!(out, PathBuf::from("./html"));
                assert!(!rename_images);
                assert_eq!(hash, HashArg::Md5);
                assert_eq!(rewrite, RewriteArg::ImgAttribute);
                assert_eq!(boundary, BoundaryArg::FollowingLine);
                assert!(chunk_size.is_none());
                assert!(!json);
            }
            _ => panic!("expected convert"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn convert_flags() {
        let cli = Cli::try_parse_from([
            "mht2html",
            "-vv",
            "convert",
            "--out",
            "dst",
            "--rename-images",
            "--hash",
            "blake3",
            "--rewrite",
            "substring",
            "--boundary",
            "declared",
            "--chunk-size",
            "4096",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Convert {
            source,
            hash,
            rewrite,
            boundary,
            chunk_size,
            ..
        } = cli.command
        else {
            panic!("expected convert");
        };
        assert!(source.is_none());
        assert_eq!(HashAlgo::from(hash), HashAlgo::Blake3);
        assert_eq!(RewriteMode::from(rewrite), RewriteMode::Substring);
        assert_eq!(BoundarySource::from(boundary), BoundarySource::Declared);
        assert_eq!(chunk_size.map(NonZeroUsize::get), Some(4096));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        assert!(Cli::try_parse_from(["mht2html", "parts", "a.mht", "--chunk-size", "0"]).is_err());
    }
}
