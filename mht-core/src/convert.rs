use crate::domain::{PartDescriptor, ResourceMap};
use crate::error::{MhtError, Result};
use crate::extract::images::materialize_images;
use crate::extract::text::reassemble_text;
use crate::index::parts::index_parts;
use crate::options::ConvertOptions;
use crate::read::archive::Archive;
use crate::rewrite::NameRewriter;

use serde::Serialize;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::info;

/// Everything one conversion produced.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Conversion {
    pub parts: Vec<PartDescriptor>,
    pub images: Vec<String>,
    pub texts: Vec<String>,
    pub renamed: ResourceMap,
}

/// Converts the archive at `source` into loose files under `out_dir`,
/// which must already exist and be writable (see `prepare_output_dir`).
pub fn convert(source: &Path, out_dir: &Path, opts: &ConvertOptions) -> Result<Conversion> {
    check_options(opts)?;
    let mut archive = Archive::open(source, opts)?;
    convert_archive(&mut archive, out_dir, opts)
}

/// Runs the phases in order: index, images, text. The name map is complete
/// before any text is rewritten.
pub fn convert_archive<R: Read + Seek>(
    archive: &mut Archive<R>,
    out_dir: &Path,
    opts: &ConvertOptions,
) -> Result<Conversion> {
    check_options(opts)?;
    let parts = index_parts(archive, opts)?;
    info!(parts = parts.len(), "archive indexed");

    let images = materialize_images(archive, &parts, out_dir, opts)?;

    let rewriter = if opts.renames_images() {
        NameRewriter::new(&images.names, opts.rewrite)?
    } else {
        None
    };
    let texts = reassemble_text(archive, &parts, out_dir, rewriter.as_ref(), opts.chunk_size)?;

    Ok(Conversion {
        parts,
        images: images.files,
        texts,
        renamed: images.names,
    })
}

fn check_options(opts: &ConvertOptions) -> Result<()> {
    if opts.chunk_size == 0 {
        return Err(MhtError::Config("chunk size must be positive".to_string()));
    }
    if opts.markers.boundary.is_empty()
        || opts.markers.content_type.is_empty()
        || opts.markers.content_location.is_empty()
    {
        return Err(MhtError::Config("header markers must not be empty".to_string()));
    }
    Ok(())
}
