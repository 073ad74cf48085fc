use crate::domain::{PartDescriptor, PartKind, ResourceMap};
use crate::error::Result;
use crate::hash::fingerprint::Fingerprinter;
use crate::options::{ConvertOptions, HashAlgo, ImageNaming};
use crate::read::archive::Archive;
use crate::read::stream::decode_base64;
use crate::util::hash_forward::HashingForward;
use crate::util::path::{image_extension, normalize_separators, safe_join};

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

#[derive(Clone, Debug, Default)]
pub struct ImageOutput {
    /// Stored file names relative to the output directory, first-seen order.
    pub files: Vec<String>,
    /// Populated only when images are renamed.
    pub names: ResourceMap,
}

/// Decodes every distinct image part into `out_dir`.
pub fn materialize_images<R: Read + Seek>(
    archive: &mut Archive<R>,
    parts: &[PartDescriptor],
    out_dir: &Path,
    opts: &ConvertOptions,
) -> Result<ImageOutput> {
    let mut out = ImageOutput::default();
    let mut seen = HashSet::new();
    let mut stored_names = HashSet::new();

    for part in parts.iter().filter(|p| p.kind == PartKind::Image) {
        let original = part.resource_name.clone().unwrap_or_else(|| {
            format!("image{}.{}", part.index, image_extension(&part.subformat))
        });
        if !seen.insert(original.clone()) {
            debug!(index = part.index, name = %original, "duplicate resource, skipped");
            continue;
        }
        let normalized = normalize_separators(&original);

        let stored = match opts.naming {
            ImageNaming::Original => {
                write_verbatim(archive, part, out_dir, &normalized)?;
                normalized
            }
            ImageNaming::Fingerprint(algo) => {
                let name = write_fingerprinted(archive, part, out_dir, algo)?;
                // pages may reference either spelling
                let respelled = normalized != original;
                out.names.insert(original, name.clone());
                if respelled {
                    out.names.insert(normalized, name.clone());
                }
                name
            }
        };
        if stored_names.insert(stored.clone()) {
            out.files.push(stored);
        }
    }

    info!(
        images = out.files.len(),
        renamed = out.names.len(),
        "images materialized"
    );
    Ok(out)
}

fn write_verbatim<R: Read + Seek>(
    archive: &mut Archive<R>,
    part: &PartDescriptor,
    out_dir: &Path,
    name: &str,
) -> Result<()> {
    let dest = safe_join(out_dir, name)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut w = BufWriter::new(File::create(&dest)?);
    let n = decode_base64(part.index, archive.payload(part)?, &mut w)?;
    w.flush()?;
    debug!(index = part.index, path = %dest.display(), bytes = n, "image written");
    Ok(())
}

/// Decodes into a temporary file while hashing, then moves it to
/// `<digest>.<ext>` unless that file already exists.
fn write_fingerprinted<R: Read + Seek>(
    archive: &mut Archive<R>,
    part: &PartDescriptor,
    out_dir: &Path,
    algo: HashAlgo,
) -> Result<String> {
    let mut tmp = NamedTempFile::new_in(out_dir)?;
    let mut hasher = Fingerprinter::new(algo);
    let n = {
        let mut w = HashingForward::new(BufWriter::new(tmp.as_file_mut()), &mut hasher);
        decode_base64(part.index, archive.payload(part)?, &mut w)?;
        w.flush()?;
        w.counted
    };

    let name = format!(
        "{}.{}",
        hasher.finalize_hex(),
        image_extension(&part.subformat)
    );
    let dest = out_dir.join(&name);
    if dest.exists() {
        // identical content already stored; dropping `tmp` deletes it
        debug!(index = part.index, name = %name, "duplicate content");
    } else {
        tmp.persist(&dest).map_err(|e| e.error)?;
        debug!(index = part.index, name = %name, bytes = n, "image written");
    }
    Ok(name)
}
