pub mod diagnostics;
pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use mht_core::error::Result;

pub fn run(cli: Cli) -> Result<()> {
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
        } => handlers::handle_convert(
            source,
            out,
            rename_images,
            hash.into(),
            rewrite.into(),
            boundary.into(),
            chunk_size,
            json,
        ),
        Commands::Parts {
            source,
            boundary,
            chunk_size,
            json,
        } => handlers::handle_parts(source, boundary.into(), chunk_size, json),
    }
}
