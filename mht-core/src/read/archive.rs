use crate::domain::PartDescriptor;
use crate::error::{MhtError, Result};
use crate::options::{BoundarySource, ConvertOptions};

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Take};
use std::path::Path;
use tracing::debug;

/// Open MHTML source: a buffered seekable reader plus the boundary token.
///
/// The read cursor belongs to whichever phase holds `&mut Archive`; every
/// phase seeks to an absolute offset before reading.
pub struct Archive<R> {
    reader: BufReader<R>,
    file_size: u64,
    boundary: Vec<u8>,
    content_start: u64,
}

impl Archive<File> {
    pub fn open(path: &Path, opts: &ConvertOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(MhtError::Format(format!(
                "file doesn't exist or isn't a regular file: {}",
                path.display()
            )));
        }
        let f = File::open(path)
            .map_err(|e| MhtError::Format(format!("cannot read {}: {e}", path.display())))?;
        Self::from_reader(f, opts)
    }
}

impl<R: Read + Seek> Archive<R> {
    pub fn from_reader(inner: R, opts: &ConvertOptions) -> Result<Self> {
        let mut reader = BufReader::new(inner);
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let (boundary, content_start) = match opts.boundary {
            BoundarySource::FollowingLine => {
                locate_following_line(&mut reader, &opts.markers.boundary)?
            }
            BoundarySource::Declared => locate_declared(&mut reader, &opts.markers.boundary)?,
        };
        debug!(
            boundary = %String::from_utf8_lossy(&boundary),
            content_start,
            file_size,
            "boundary located"
        );

        Ok(Self {
            reader,
            file_size,
            boundary,
            content_start,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn boundary(&self) -> &[u8] {
        &self.boundary
    }

    pub fn content_start(&self) -> u64 {
        self.content_start
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.reader.stream_position()?)
    }

    pub fn seek_to(&mut self, off: u64) -> Result<()> {
        if self.reader.stream_position()? != off {
            self.reader.seek(SeekFrom::Start(off))?;
        }
        Ok(())
    }

    /// Appends up to `max` bytes from the cursor to `buf`; short only at EOF.
    pub fn read_append(&mut self, buf: &mut Vec<u8>, max: usize) -> Result<usize> {
        let n = (&mut self.reader).take(max as u64).read_to_end(buf)?;
        Ok(n)
    }

    /// Appends one line (terminator included) to `line`; 0 at EOF.
    pub fn read_line(&mut self, line: &mut Vec<u8>) -> Result<usize> {
        Ok(self.reader.read_until(b'\n', line)?)
    }

    /// Positions the cursor at the payload and bounds reads to its length.
    pub fn payload(&mut self, part: &PartDescriptor) -> Result<Take<&mut BufReader<R>>> {
        self.seek_to(part.payload_start)?;
        Ok((&mut self.reader).take(part.payload_len()))
    }
}

fn not_found() -> MhtError {
    MhtError::Format("boundary string not found".to_string())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find_bytes(haystack, needle).is_some()
}

/// Offset of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Scans to the declaration line and returns the first non-blank line after
/// it, trimmed, together with the offset just past that line.
fn locate_following_line<B: BufRead + Seek>(r: &mut B, marker: &str) -> Result<(Vec<u8>, u64)> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if r.read_until(b'\n', &mut line)? == 0 {
            return Err(not_found());
        }
        if contains(line.trim_ascii(), marker.as_bytes()) {
            break;
        }
    }
    loop {
        line.clear();
        if r.read_until(b'\n', &mut line)? == 0 {
            return Err(not_found());
        }
        let token = line.trim_ascii();
        if !token.is_empty() {
            let token = token.to_vec();
            return Ok((token, r.stream_position()?));
        }
    }
}

/// Takes the quoted declaration value as the delimiter (`--` + value) and
/// starts content after the first delimiter line.
fn locate_declared<B: BufRead + Seek>(r: &mut B, marker: &str) -> Result<(Vec<u8>, u64)> {
    let mut line = Vec::new();
    let value = loop {
        line.clear();
        if r.read_until(b'\n', &mut line)? == 0 {
            return Err(not_found());
        }
        if let Some(at) = find_bytes(&line, marker.as_bytes()) {
            let rest = &line[at + marker.len()..];
            let end = rest.iter().position(|&b| b == b'"').unwrap_or(rest.len());
            break rest[..end].trim_ascii().to_vec();
        }
    };
    if value.is_empty() {
        return Err(MhtError::Format("empty boundary declaration".to_string()));
    }

    let mut token = b"--".to_vec();
    token.extend_from_slice(&value);
    loop {
        line.clear();
        if r.read_until(b'\n', &mut line)? == 0 {
            return Err(MhtError::Format(format!(
                "no delimiter line for boundary {}",
                String::from_utf8_lossy(&value)
            )));
        }
        if line.trim_ascii().starts_with(&token) {
            return Ok((token, r.stream_position()?));
        }
    }
}
