#![forbid(unsafe_code)]

pub mod error;
pub mod options;

pub mod util {
    pub mod hash_forward;
    pub mod path;
}

pub mod hash {
    pub mod fingerprint;
}

pub mod domain;

pub mod read {
    pub mod archive;
    pub mod stream;
}

pub mod index {
    pub mod parts;
}

pub mod extract {
    pub mod images;
    pub mod text;
}

pub mod rewrite;

pub mod convert;
pub mod outdir;

// Re-exports: stable API surface
pub use convert::{Conversion, convert, convert_archive};
pub use domain::{PartDescriptor, PartKind, ResourceMap};
pub use error::{MhtError, Result};
pub use index::parts::index_parts;
pub use options::{BoundarySource, ConvertOptions, HashAlgo, ImageNaming, Markers, RewriteMode};
pub use outdir::prepare_output_dir;
pub use read::archive::Archive;
