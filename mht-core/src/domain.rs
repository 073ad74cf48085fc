// mht_core/src/domain.rs
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartKind {
    Image,
    Text,
    /// Any other major type; empty when the part declared no Content-Type.
    Other(String),
}

impl PartKind {
    pub fn from_major(major: &str) -> Self {
        match major {
            "image" => PartKind::Image,
            "text" => PartKind::Text,
            other => PartKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Image => f.pad("image"),
            PartKind::Text => f.pad("text"),
            PartKind::Other(s) if s.is_empty() => f.pad("-"),
            PartKind::Other(s) => f.pad(s),
        }
    }
}

/// Location and type of one MIME part inside the archive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PartDescriptor {
    pub index: usize,
    pub kind: PartKind,
    pub subformat: String,
    pub resource_name: Option<String>,
    pub payload_start: u64,
    /// Exclusive; trailing line break before the boundary is not included.
    pub payload_end: u64,
}

impl PartDescriptor {
    pub fn payload_len(&self) -> u64 {
        self.payload_end - self.payload_start
    }
}

/// Original resource reference -> extracted file name, in insertion order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResourceMap {
    entries: Vec<(String, String)>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `original -> renamed`. The first mapping for a name wins;
    /// returns false when `original` was already present.
    pub fn insert(&mut self, original: String, renamed: String) -> bool {
        if self.lookup.contains_key(&original) {
            return false;
        }
        self.lookup.insert(original.clone(), self.entries.len());
        self.entries.push((original, renamed));
        true
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.lookup
            .get(original)
            .map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, original: &str) -> bool {
        self.lookup.contains_key(original)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(o, n)| (o.as_str(), n.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_mapping_wins() {
        let mut map = ResourceMap::new();
        assert!(map.insert("a.png".into(), "1.png".into()));
        assert!(!map.insert("a.png".into(), "2.png".into()));
        assert!(map.insert("b.png".into(), "1.png".into()));

        assert_eq!(map.get("a.png"), Some("1.png"));
        assert_eq!(map.len(), 2);
        let order: Vec<_> = map.iter().map(|(o, _)| o).collect();
        assert_eq!(order, ["a.png", "b.png"]);
    }

    #[test]
    fn kind_from_major() {
        assert_eq!(PartKind::from_major("image"), PartKind::Image);
        assert_eq!(PartKind::from_major("text"), PartKind::Text);
        assert_eq!(
            PartKind::from_major("application"),
            PartKind::Other("application".into())
        );
        assert_eq!(PartKind::Other(String::new()).to_string(), "-");
    }
}
