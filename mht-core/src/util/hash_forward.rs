use crate::hash::fingerprint::Fingerprinter;
use std::io::{Result, Write};

/// Write adapter that fingerprints every byte it forwards.
pub struct HashingForward<'a, W: Write> {
    inner: W,
    hasher: &'a mut Fingerprinter,
    pub counted: u64,
}

impl<'a, W: Write> HashingForward<'a, W> {
    pub fn new(inner: W, hasher: &'a mut Fingerprinter) -> Self {
        Self {
            inner,
            hasher,
            counted: 0,
        }
    }
}

impl<'a, W: Write> Write for HashingForward<'a, W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.counted += n as u64;
        Ok(n)
    }
    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::HashAlgo;

    #[test]
    fn forwards_and_hashes() {
        let mut hasher = Fingerprinter::new(HashAlgo::Md5);
        let mut sink = Vec::new();
        let mut w = HashingForward::new(&mut sink, &mut hasher);
        w.write_all(&[0xDE, 0xAD]).unwrap();
        w.write_all(&[0xBE, 0xEF]).unwrap();
        assert_eq!(w.counted, 4);
        drop(w);
        assert_eq!(sink, [0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(hasher.finalize_hex(), "2f249230a8e7c2bf6005ccd2679259ec");
    }
}
