use std::io::{self, BufRead, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;

use mht_core::error::{MhtError, Result};
use mht_core::{
    Archive, BoundarySource, Conversion, ConvertOptions, HashAlgo, PartDescriptor, RewriteMode,
    convert, index_parts, prepare_output_dir,
};
use serde::Serialize;
use tracing::info;

use super::diagnostics::RunStats;

#[derive(Serialize)]
struct ConvertReport<'a> {
    source: &'a Path,
    out_dir: &'a Path,
    #[serde(flatten)]
    conversion: &'a Conversion,
}

fn base_options(boundary: BoundarySource, chunk_size: Option<NonZeroUsize>) -> ConvertOptions {
    let mut opts = ConvertOptions {
        boundary,
        ..Default::default()
    };
    if let Some(n) = chunk_size {
        opts.chunk_size = n.get();
    }
    opts
}

#[allow(clippy::too_many_arguments)]
pub fn handle_convert(
    source: Option<PathBuf>,
    out: PathBuf,
    rename_images: bool,
    hash: HashAlgo,
    rewrite: RewriteMode,
    boundary: BoundarySource,
    chunk_size: Option<NonZeroUsize>,
    json: bool,
) -> Result<()> {
    let started = Instant::now();
    let source = match source {
        Some(p) => p,
        None => prompt_source(&mut io::stdin().lock(), &mut io::stderr())?,
    };

    let mut opts = base_options(boundary, chunk_size);
    opts.rewrite = rewrite;
    if rename_images {
        opts = opts.renaming(hash);
    }

    let out_dir = prepare_output_dir(&out)?;
    info!(source = %source.display(), out = %out_dir.display(), "converting");
    let conv = convert(&source, &out_dir, &opts)?;

    let mut stdout = io::stdout().lock();
    if json {
        let report = ConvertReport {
            source: &source,
            out_dir: &out_dir,
            conversion: &conv,
        };
        serde_json::to_writer_pretty(&mut stdout, &report).map_err(io::Error::from)?;
        writeln!(stdout)?;
    } else {
        for name in conv.images.iter().chain(&conv.texts) {
            writeln!(stdout, "{}", out_dir.join(name).display())?;
        }
    }

    eprintln!(
        "convert: {} parts, {} images, {} text files -> {}",
        conv.parts.len(),
        conv.images.len(),
        conv.texts.len(),
        out_dir.display()
    );
    eprintln!("{}", RunStats::since(started));
    Ok(())
}

pub fn handle_parts(
    source: PathBuf,
    boundary: BoundarySource,
    chunk_size: Option<NonZeroUsize>,
    json: bool,
) -> Result<()> {
    let opts = base_options(boundary, chunk_size);
    let mut archive = Archive::open(&source, &opts)?;
    let parts = index_parts(&mut archive, &opts)?;

    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &parts).map_err(io::Error::from)?;
        writeln!(stdout)?;
    } else {
        for p in &parts {
            writeln!(stdout, "{}", part_row(p))?;
        }
        eprintln!(
            "parts: {} (boundary {:?}, {} bytes)",
            parts.len(),
            String::from_utf8_lossy(archive.boundary()),
            archive.file_size()
        );
    }
    Ok(())
}

fn part_row(p: &PartDescriptor) -> String {
    format!(
        "#{:<4} {:<6} {:<10} off={:<10} len={:<9} {}",
        p.index,
        p.kind,
        if p.subformat.is_empty() { "-" } else { p.subformat.as_str() },
        p.payload_start,
        p.payload_len(),
        p.resource_name.as_deref().unwrap_or("-")
    )
}

/// Asks for the archive path on `output` and reads one line from `input`.
fn prompt_source<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<PathBuf> {
    write!(output, "MHT file: ")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let name = line.trim();
    if name.is_empty() {
        return Err(MhtError::Config("no source file given".to_string()));
    }
    Ok(PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mht_core::PartKind;

    #[test]
    fn prompt_reads_one_line() {
        let mut input = io::Cursor::new(b"  saved/page.mht \nignored\n".to_vec());
        let mut shown = Vec::new();
        let path = prompt_source(&mut input, &mut shown).unwrap();
        assert_eq!(path, PathBuf::from("saved/page.mht"));
        assert_eq!(shown, b"MHT file: ");
    }

    #[test]
    fn empty_prompt_is_config_error() {
        let mut input = io::Cursor::new(b"\n".to_vec());
        let err = prompt_source(&mut input, &mut io::sink()).unwrap_err();
        assert!(matches!(err, MhtError::Config(_)));
    }

    #[test]
    fn chunk_size_override() {
        let opts = base_options(BoundarySource::Declared, NonZeroUsize::new(64));
        assert_eq!(opts.chunk_size, 64);
        assert_eq!(opts.boundary, BoundarySource::Declared);
        let opts = base_options(BoundarySource::FollowingLine, None);
        assert_eq!(opts.chunk_size, ConvertOptions::default().chunk_size);
    }

    #[test]
    fn row_layout() {
        let p = PartDescriptor {
            index: 3,
            kind: PartKind::Image,
            subformat: "png".into(),
            resource_name: Some("a.png".into()),
            payload_start: 120,
            payload_end: 200,
        };
        let row = part_row(&p);
        assert!(row.starts_with("#3    image  png"));
        assert!(row.contains("off=120"));
        assert!(row.contains("len=80"));
        assert!(row.ends_with("a.png"));
    }

    #[test]
    fn convert_writes_into_fresh_directory() {
        let work = tempfile::tempdir().unwrap();
        let source = work.path().join("page.mht");
        std::fs::write(
            &source,
            "Content-Type: multipart/related; boundary=\"==b\"\n\n--==b\n\
             Content-Type: text/html\n\n<p>hi</p>\n--==b--\n",
        )
        .unwrap();
        let out = work.path().join("nested").join("html");
        handle_convert(
            Some(source),
            out.clone(),
            false,
            HashAlgo::Md5,
            RewriteMode::ImgAttribute,
            BoundarySource::FollowingLine,
            None,
            false,
        )
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(out.join("text0.html")).unwrap(),
            "<p>hi</p>"
        );
    }
}
