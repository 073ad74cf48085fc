use serde::{Deserialize, Serialize};

/// Default read granularity for scanning and copying (100 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 100 * 1024;

/// How the boundary token is derived from the archive header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundarySource {
    /// The first non-blank line after the `boundary="` declaration is the token.
    #[default]
    FollowingLine,
    /// The quoted value of the declaration, prefixed with `--`.
    Declared,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgo {
    #[default]
    Md5,
    Blake3,
}

/// File naming for decoded images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageNaming {
    /// Keep the declared resource location (nested directories are created).
    #[default]
    Original,
    /// Name by content digest; identical payloads collapse to one file.
    Fingerprint(HashAlgo),
}

/// How renamed resources are substituted in HTML parts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewriteMode {
    /// Replace every occurrence of an original name.
    Substring,
    /// Replace only quoted attribute values inside `<img ...>` tags.
    #[default]
    ImgAttribute,
}

/// Header markers searched for while scanning. Matching of the two header
/// names is case-insensitive; the boundary marker is matched verbatim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Markers {
    pub boundary: String,
    pub content_type: String,
    pub content_location: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            boundary: "boundary=\"".to_string(),
            content_type: "Content-Type:".to_string(),
            content_location: "Content-Location:".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Bytes per read while scanning for boundaries and copying HTML.
    /// Output never depends on this value.
    pub chunk_size: usize,
    pub boundary: BoundarySource,
    pub naming: ImageNaming,
    /// Only consulted when `naming` renames images.
    pub rewrite: RewriteMode,
    pub markers: Markers,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            boundary: BoundarySource::default(),
            naming: ImageNaming::default(),
            rewrite: RewriteMode::default(),
            markers: Markers::default(),
        }
    }
}

impl ConvertOptions {
    /// Shorthand for fingerprint naming with `algo`.
    pub fn renaming(mut self, algo: HashAlgo) -> Self {
        self.naming = ImageNaming::Fingerprint(algo);
        self
    }

    pub fn renames_images(&self) -> bool {
        matches!(self.naming, ImageNaming::Fingerprint(_))
    }
}
