use crate::domain::ResourceMap;
use crate::error::{MhtError, Result};
use crate::options::RewriteMode;

use aho_corasick::{AhoCorasick, MatchKind};
use regex::bytes::{Captures, Regex};
use std::borrow::Cow;
use std::collections::HashMap;

/// Substitutes original resource names with their extracted names in HTML.
///
/// Pattern size does not grow with the number of names: substring mode uses
/// one automaton, `<img>` mode uses two fixed regexes plus a table lookup.
pub struct NameRewriter {
    matcher: Matcher,
}

enum Matcher {
    /// Leftmost-longest, so a replacement is never matched again by a
    /// shorter name.
    Substring {
        names: AhoCorasick,
        renamed: Vec<Vec<u8>>,
    },
    ImgAttribute {
        tag: Regex,
        value: Regex,
        names: HashMap<Vec<u8>, Vec<u8>>,
    },
}

impl NameRewriter {
    /// `None` when there is nothing to rewrite.
    pub fn new(map: &ResourceMap, mode: RewriteMode) -> Result<Option<Self>> {
        let pairs: Vec<(&str, &str)> = map.iter().filter(|(o, _)| !o.is_empty()).collect();
        if pairs.is_empty() {
            return Ok(None);
        }

        let matcher = match mode {
            RewriteMode::Substring => {
                let names = AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(pairs.iter().map(|(o, _)| o.as_bytes()))
                    .map_err(|e| MhtError::Config(format!("resource name matcher: {e}")))?;
                let renamed = pairs.iter().map(|(_, n)| n.as_bytes().to_vec()).collect();
                Matcher::Substring { names, renamed }
            }
            RewriteMode::ImgAttribute => Matcher::ImgAttribute {
                tag: fixed_regex(r"(?is)<img\s[^>]*>")?,
                value: fixed_regex(r#""([^"]*)"|'([^']*)'"#)?,
                names: pairs
                    .iter()
                    .map(|(o, n)| (o.as_bytes().to_vec(), n.as_bytes().to_vec()))
                    .collect(),
            },
        };
        Ok(Some(Self { matcher }))
    }

    pub fn mode(&self) -> RewriteMode {
        match self.matcher {
            Matcher::Substring { .. } => RewriteMode::Substring,
            Matcher::ImgAttribute { .. } => RewriteMode::ImgAttribute,
        }
    }

    pub fn rewrite<'a>(&self, chunk: &'a [u8]) -> Cow<'a, [u8]> {
        match &self.matcher {
            Matcher::Substring { names, renamed } => {
                if names.is_match(chunk) {
                    Cow::Owned(names.replace_all_bytes(chunk, renamed))
                } else {
                    Cow::Borrowed(chunk)
                }
            }
            Matcher::ImgAttribute { tag, value, names } => {
                tag.replace_all(chunk, |t: &Captures<'_>| {
                    value
                        .replace_all(&t[0], |v: &Captures<'_>| quoted_renamed(v, names))
                        .into_owned()
                })
            }
        }
    }
}

fn fixed_regex(source: &str) -> Result<Regex> {
    Regex::new(source).map_err(|e| MhtError::Config(format!("tag pattern: {e}")))
}

/// A quoted attribute value, replaced only when the whole value is a known
/// name. The quote character is kept.
fn quoted_renamed(v: &Captures<'_>, names: &HashMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let (quote, old) = match (v.get(1), v.get(2)) {
        (Some(m), _) => (b'"', m.as_bytes()),
        (None, Some(m)) => (b'\'', m.as_bytes()),
        (None, None) => return v[0].to_vec(),
    };
    match names.get(old) {
        Some(new) => {
            let mut out = Vec::with_capacity(new.len() + 2);
            out.push(quote);
            out.extend_from_slice(new);
            out.push(quote);
            out
        }
        None => v[0].to_vec(),
    }
}
