use std::fmt;

use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::Error;
use crate::jaxn;
use crate::tree::{Node, Rule};

type Result<T> = std::result::Result<T, Error>;

/// A resolved key path: an ordered sequence of opaque UTF-8 segments.
/// Two pointers are equal iff their segments are equal element-wise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Pointer {
    segments: SmallVec<[SmolStr; 4]>,
}

impl Pointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<SmolStr>) {
        self.segments.push(segment.into());
    }

    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `prefix` is a (non-strict) prefix of this pointer.
    pub fn starts_with(&self, prefix: &Pointer) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == prefix.segments[..]
    }

    /// Resolves a parsed key-path node into segments: identifier leaves are
    /// taken verbatim, quoted segments are decoded through the string
    /// literal grammar. Any other child shape means the grammar and this
    /// resolver are out of sync.
    pub fn from_key_node(node: &Node) -> Result<Pointer> {
        let mut pointer = Pointer::new();
        for part in node.children() {
            match part.rule() {
                Some(Rule::Identifier) => {
                    let text = part
                        .content()
                        .ok_or_else(|| Error::invariant("identifier without content"))?;
                    pointer.push(text);
                }
                Some(Rule::QuotedString) => {
                    let raw = part
                        .content()
                        .ok_or_else(|| Error::invariant("quoted segment without content"))?;
                    pointer.push(jaxn::decode_string(raw)?);
                }
                other => {
                    return Err(Error::invariant(format!(
                        "unexpected key segment: {other:?}"
                    )));
                }
            }
        }
        Ok(pointer)
    }
}

impl<S: Into<SmolStr>> FromIterator<S> for Pointer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_bare_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'-'))
}

impl fmt::Display for Pointer {
    /// Dot-joined; segments that are not bare identifiers are quoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            if is_bare_segment(segment) {
                f.write_str(segment)?;
            } else {
                write!(f, "\"")?;
                for ch in segment.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\r' => f.write_str("\\r")?,
                        '\t' => f.write_str("\\t")?,
                        other => write!(f, "{other}")?,
                    }
                }
                write!(f, "\"")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_element_wise() {
        let a: Pointer = ["a", "b"].into_iter().collect();
        let b: Pointer = ["a", "b"].into_iter().collect();
        let c: Pointer = ["a.b"].into_iter().collect();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn starts_with_checks_segment_prefixes() {
        let path: Pointer = ["a", "b", "c"].into_iter().collect();
        let prefix: Pointer = ["a", "b"].into_iter().collect();
        let other: Pointer = ["a", "c"].into_iter().collect();
        assert!(path.starts_with(&prefix));
        assert!(path.starts_with(&path));
        assert!(!path.starts_with(&other));
        assert!(!prefix.starts_with(&path));
    }

    #[test]
    fn display_quotes_non_identifier_segments() {
        let plain: Pointer = ["a", "b-c"].into_iter().collect();
        assert_eq!(plain.to_string(), "a.b-c");
        let dotted: Pointer = ["x.y", "z"].into_iter().collect();
        assert_eq!(dotted.to_string(), "\"x.y\".z");
        let tricky: Pointer = ["he said \"hi\""].into_iter().collect();
        assert_eq!(tricky.to_string(), "\"he said \\\"hi\\\"\"");
    }
}
