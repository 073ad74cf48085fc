//! Single forward pass that splits the archive body into part descriptors.
//!
//! Only offsets are recorded; payload bytes are never buffered beyond one
//! scan chunk.

use crate::domain::{PartDescriptor, PartKind};
use crate::error::Result;
use crate::options::{ConvertOptions, Markers};
use crate::read::archive::{Archive, find_bytes};

use std::io::{Read, Seek};
use tracing::{debug, warn};

/// How far back from a boundary trailing whitespace is trimmed.
pub const TRAILING_SCAN: u64 = 20;

/// Bytes after the last boundary that are expected (closing `--`, line break).
pub const TRAILING_SLACK: u64 = 10;

#[derive(Default)]
struct PartHeader {
    kind: Option<PartKind>,
    subformat: String,
    resource_name: Option<String>,
}

pub fn index_parts<R: Read + Seek>(
    archive: &mut Archive<R>,
    opts: &ConvertOptions,
) -> Result<Vec<PartDescriptor>> {
    let token = archive.boundary().to_vec();
    // Consecutive scan windows overlap by token.len() - 1 bytes.
    let chunk_len = opts.chunk_size.max(token.len() + 1);
    let overlap = (token.len() - 1) as u64;
    let file_size = archive.file_size();

    let mut parts = Vec::new();
    let mut buf = Vec::with_capacity(chunk_len);
    let mut block_start = archive.content_start();

    'blocks: loop {
        let mut cursor = block_start;
        let boundary_at = loop {
            archive.seek_to(cursor)?;
            buf.clear();
            let n = archive.read_append(&mut buf, chunk_len)? as u64;
            if n == 0 {
                break 'blocks;
            }
            if let Some(pos) = find_bytes(&buf, &token) {
                break cursor + pos as u64;
            }
            if cursor + n >= file_size {
                let trailing = file_size - block_start;
                if trailing >= TRAILING_SLACK && !is_blank_tail(archive, block_start)? {
                    warn!(trailing, "ignoring data after the last boundary");
                } else {
                    debug!(trailing, "reached end of archive");
                }
                break 'blocks;
            }
            cursor += n - overlap;
        };

        let part = read_part(archive, parts.len(), block_start, boundary_at, &opts.markers)?;
        debug!(
            index = part.index,
            kind = %part.kind,
            subformat = %part.subformat,
            name = part.resource_name.as_deref().unwrap_or(""),
            start = part.payload_start,
            end = part.payload_end,
            "indexed part"
        );
        parts.push(part);

        block_start = line_end(archive, boundary_at)?;
    }

    Ok(parts)
}

/// Parses the header block at `block_start` and locates the payload, which
/// runs up to the boundary found at `boundary_at`.
fn read_part<R: Read + Seek>(
    archive: &mut Archive<R>,
    index: usize,
    block_start: u64,
    boundary_at: u64,
    markers: &Markers,
) -> Result<PartDescriptor> {
    archive.seek_to(block_start)?;
    let mut header = PartHeader::default();
    let mut line = Vec::new();
    let mut payload_start = block_start;
    while payload_start < boundary_at {
        line.clear();
        let n = archive.read_line(&mut line)?;
        if n == 0 {
            break;
        }
        payload_start += n as u64;
        let trimmed = line.trim_ascii();
        if trimmed.is_empty() {
            break;
        }
        parse_header_line(&String::from_utf8_lossy(trimmed), markers, &mut header);
    }
    // A header block running into the boundary leaves an empty payload.
    let payload_start = payload_start.min(boundary_at);
    let payload_end = trim_trailing(archive, payload_start, boundary_at)?;

    if header.kind.is_none() {
        debug!(index, "part has no Content-Type");
    }
    Ok(PartDescriptor {
        index,
        kind: header.kind.unwrap_or(PartKind::Other(String::new())),
        subformat: header.subformat,
        resource_name: header.resource_name,
        payload_start,
        payload_end,
    })
}

fn parse_header_line(line: &str, markers: &Markers, header: &mut PartHeader) {
    if let Some(value) = value_after(line, &markers.content_type) {
        let mime = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        let (major, minor) = mime.split_once('/').unwrap_or((mime.as_str(), ""));
        header.kind = Some(PartKind::from_major(major.trim()));
        header.subformat = minor.trim().to_string();
        return;
    }
    if let Some(value) = value_after(line, &markers.content_location) {
        let name = value.trim();
        if !name.is_empty() {
            header.resource_name = Some(name.to_string());
        }
    }
}

/// Text following a case-insensitive `marker` anywhere in `line`.
fn value_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let at = line
        .to_ascii_lowercase()
        .find(&marker.to_ascii_lowercase())?;
    // ASCII lowercasing keeps byte offsets stable
    line.get(at + marker.len()..)
}

/// End of the payload: the boundary offset minus whitespace in the bytes
/// just before it (at most `TRAILING_SCAN`, never before `payload_start`).
fn trim_trailing<R: Read + Seek>(
    archive: &mut Archive<R>,
    payload_start: u64,
    boundary_at: u64,
) -> Result<u64> {
    let from = boundary_at.saturating_sub(TRAILING_SCAN).max(payload_start);
    archive.seek_to(from)?;
    let mut window = Vec::with_capacity(TRAILING_SCAN as usize);
    archive.read_append(&mut window, (boundary_at - from) as usize)?;
    let ws = window
        .iter()
        .rev()
        .take_while(|&&b| is_trailing_ws(b))
        .count() as u64;
    Ok(boundary_at - ws)
}

fn is_trailing_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\0' | 0x0B)
}

/// Offset just past the line containing `at`.
fn line_end<R: Read + Seek>(archive: &mut Archive<R>, at: u64) -> Result<u64> {
    archive.seek_to(at)?;
    let mut line = Vec::new();
    archive.read_line(&mut line)?;
    Ok(at + line.len() as u64)
}

/// True when everything from `from` to EOF is whitespace or closing dashes.
fn is_blank_tail<R: Read + Seek>(archive: &mut Archive<R>, from: u64) -> Result<bool> {
    archive.seek_to(from)?;
    let mut tail = Vec::new();
    loop {
        tail.clear();
        if archive.read_append(&mut tail, 8 * 1024)? == 0 {
            return Ok(true);
        }
        if tail.iter().any(|&b| !is_trailing_ws(b) && b != b'-') {
            return Ok(false);
        }
    }
}
