use crate::options::HashAlgo;
use md5::{Digest, Md5};

/// Incremental content digest used to name extracted resources.
pub enum Fingerprinter {
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl Fingerprinter {
    pub fn new(algo: HashAlgo) -> Self {
        match algo {
            HashAlgo::Md5 => Fingerprinter::Md5(Md5::new()),
            HashAlgo::Blake3 => Fingerprinter::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Fingerprinter::Md5(h) => h.update(data),
            Fingerprinter::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        match self {
            Fingerprinter::Md5(h) => hex::encode(h.finalize()),
            Fingerprinter::Blake3(h) => hex::encode(h.finalize().as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_matches_known_digest() {
        let mut f = Fingerprinter::new(HashAlgo::Md5);
        f.update(&[0xDE, 0xAD]);
        f.update(&[0xBE, 0xEF]);
        assert_eq!(f.finalize_hex(), "2f249230a8e7c2bf6005ccd2679259ec");
    }

    #[test]
    fn blake3_matches_one_shot() {
        let mut f = Fingerprinter::new(HashAlgo::Blake3);
        f.update(b"hello ");
        f.update(b"world");
        assert_eq!(f.finalize_hex(), blake3::hash(b"hello world").to_hex().to_string());
    }
}
