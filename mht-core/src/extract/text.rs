use crate::domain::{PartDescriptor, PartKind};
use crate::error::Result;
use crate::read::archive::Archive;
use crate::rewrite::NameRewriter;
use crate::util::path::file_token;

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info};

/// Writes every text part to `text<index>.<subformat>` under `out_dir`.
pub fn reassemble_text<R: Read + Seek>(
    archive: &mut Archive<R>,
    parts: &[PartDescriptor],
    out_dir: &Path,
    rewriter: Option<&NameRewriter>,
    chunk_size: usize,
) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for part in parts.iter().filter(|p| p.kind == PartKind::Text) {
        let name = text_file_name(part);
        let mut out = BufWriter::new(File::create(out_dir.join(&name))?);
        if part.subformat == "html" {
            let chunks = copy_lines(archive, part, &mut out, rewriter, chunk_size)?;
            debug!(index = part.index, name = %name, chunks, "html written");
        } else {
            let n = std::io::copy(&mut archive.payload(part)?, &mut out)?;
            debug!(index = part.index, name = %name, bytes = n, "text copied");
        }
        out.flush()?;
        files.push(name);
    }
    info!(texts = files.len(), "text parts written");
    Ok(files)
}

pub fn text_file_name(part: &PartDescriptor) -> String {
    let ext = if part.subformat.is_empty() {
        "txt".to_string()
    } else {
        file_token(&part.subformat)
    };
    format!("text{}.{}", part.index, ext)
}

/// Copies the payload in chunks that always end on a line break (except the
/// last), rewriting each chunk before it is written with a single
/// `write_all`. Returns the number of chunks written.
pub fn copy_lines<R: Read + Seek, W: Write>(
    archive: &mut Archive<R>,
    part: &PartDescriptor,
    out: &mut W,
    rewriter: Option<&NameRewriter>,
    chunk_size: usize,
) -> Result<usize> {
    let chunk_size = chunk_size.max(1);
    let end = part.payload_end;
    let mut cursor = part.payload_start;
    let mut chunk = Vec::with_capacity(chunk_size);
    let mut written = 0;

    while cursor < end {
        archive.seek_to(cursor)?;
        chunk.clear();
        let mut scanned = 0;
        loop {
            let remaining = end - cursor - chunk.len() as u64;
            if remaining == 0 {
                break;
            }
            let want = remaining.min(chunk_size as u64) as usize;
            if archive.read_append(&mut chunk, want)? == 0 {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "archive ended inside a text part",
                )
                .into());
            }
            if chunk[scanned..].contains(&b'\n') {
                break;
            }
            scanned = chunk.len();
        }

        // cut after the last complete line while payload remains
        if cursor + (chunk.len() as u64) < end {
            if let Some(nl) = chunk.iter().rposition(|&b| b == b'\n') {
                chunk.truncate(nl + 1);
            }
        }
        cursor += chunk.len() as u64;

        match rewriter {
            Some(r) => out.write_all(&r.rewrite(&chunk))?,
            None => out.write_all(&chunk)?,
        }
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceMap;
    use crate::index::parts::index_parts;
    use crate::options::{ConvertOptions, RewriteMode};
    use std::io::Cursor;

    /// Keeps each `write` call separately.
    #[derive(Default)]
    struct Recorder(Vec<Vec<u8>>);

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.push(buf.to_vec());
            Ok(buf.len())
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    const HTML: &str = "<html>\n<body>\n<p>first paragraph with some words</p>\n\
        <img src=\"pic.png\">\n<p>x</p>\n</body>\n</html>";

    fn archive(kind: &str, payload: &str) -> (Archive<Cursor<Vec<u8>>>, PartDescriptor) {
        let src = format!("boundary=\"x\"\n--b\nContent-Type: {kind}\n\n{payload}\n--b--\n");
        let opts = ConvertOptions::default();
        let mut a = Archive::from_reader(Cursor::new(src.into_bytes()), &opts).unwrap();
        let mut parts = index_parts(&mut a, &opts).unwrap();
        assert_eq!(parts.len(), 1);
        (a, parts.remove(0))
    }

    #[test]
    fn chunks_end_on_line_breaks() {
        let (mut a, part) = archive("text/html", HTML);
        for chunk_size in [1, 3, 7, 16, 40, 1000] {
            let mut rec = Recorder::default();
            let n = copy_lines(&mut a, &part, &mut rec, None, chunk_size).unwrap();
            assert_eq!(n, rec.0.len());
            assert_eq!(rec.0.concat(), HTML.as_bytes(), "chunk size {chunk_size}");
            for c in &rec.0[..rec.0.len() - 1] {
                assert_eq!(c.last(), Some(&b'\n'), "chunk size {chunk_size}");
            }
        }
    }

    #[test]
    fn long_line_is_kept_whole() {
        let payload = format!("{}\nshort line here\nend", "y".repeat(50));
        let (mut a, part) = archive("text/html", &payload);
        let mut rec = Recorder::default();
        copy_lines(&mut a, &part, &mut rec, None, 8).unwrap();
        assert_eq!(rec.0[0], format!("{}\n", "y".repeat(50)).as_bytes());
        assert_eq!(rec.0.concat(), payload.as_bytes());
    }

    #[test]
    fn rewriting_is_independent_of_chunk_size() {
        let mut map = ResourceMap::new();
        map.insert("pic.png".into(), "abc.png".into());
        let r = NameRewriter::new(&map, RewriteMode::ImgAttribute)
            .unwrap()
            .unwrap();
        let (mut a, part) = archive("text/html", HTML);
        let expected = HTML.replace("\"pic.png\"", "\"abc.png\"");
        for chunk_size in [2, 9, 4096] {
            let mut out = Vec::new();
            copy_lines(&mut a, &part, &mut out, Some(&r), chunk_size).unwrap();
            assert_eq!(String::from_utf8(out).unwrap(), expected);
        }
    }

    #[test]
    fn writes_named_files() {
        let (mut a, part) = archive("text/plain", "plain body\r\nline two");
        let dir = tempfile::tempdir().unwrap();
        let files = reassemble_text(&mut a, &[part], dir.path(), None, 4).unwrap();
        assert_eq!(files, ["text0.plain"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("text0.plain")).unwrap(),
            "plain body\r\nline two"
        );
    }

    #[test]
    fn empty_subformat_uses_txt() {
        let part = PartDescriptor {
            index: 4,
            kind: PartKind::Text,
            subformat: String::new(),
            resource_name: None,
            payload_start: 0,
            payload_end: 0,
        };
        assert_eq!(text_file_name(&part), "text4.txt");
    }
}
