use crate::error::{MhtError, Result};

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::read::DecoderReader;
use std::io::{Read, Write};

/// MIME bodies are wrapped and not always padded.
const MIME_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Drops ASCII whitespace (line wrapping) from the inner stream.
pub struct SkipWhitespace<R: Read> {
    inner: R,
}

impl<R: Read> SkipWhitespace<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read> Read for SkipWhitespace<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        loop {
            let n = self.inner.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                let b = buf[i];
                if !b.is_ascii_whitespace() {
                    buf[kept] = b;
                    kept += 1;
                }
            }
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}

/// Streams base64 text from `src` into `dst` as raw bytes.
/// Returns the decoded length; malformed input is a `Decode` error for `part`.
pub fn decode_base64<R: Read, W: Write + ?Sized>(part: usize, src: R, dst: &mut W) -> Result<u64> {
    let mut dec = DecoderReader::new(SkipWhitespace::new(src), &MIME_BASE64);
    std::io::copy(&mut dec, dst).map_err(|e| classify(part, e))
}

fn classify(part: usize, e: std::io::Error) -> MhtError {
    let is_decode = e.kind() == std::io::ErrorKind::InvalidData
        && e
            .get_ref()
            .is_some_and(|inner| inner.downcast_ref::<base64::DecodeError>().is_some());
    if is_decode {
        MhtError::Decode {
            part,
            reason: e.to_string(),
        }
    } else {
        MhtError::Io(e)
    }
}
