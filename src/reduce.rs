//! The second pass: fold parsed statements, in source order, into an
//! ordered map from resolved key path to the value subtree that defines it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::grammar;
use crate::jaxn;
use crate::options::{DeletePolicy, ReduceOptions};
use crate::pointer::Pointer;
use crate::tree::{Node, Rule};

type Result<T> = std::result::Result<T, Error>;

/// One top-level statement, extracted from the parse tree with its key path
/// already resolved. The statement owns its value subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Member { path: Pointer, value: Node },
    Delete { path: Pointer },
    Include { value: Node },
}

/// Consumes a parsed document root and extracts its statements in source
/// order. Node shapes the grammar cannot produce are invariant errors.
pub fn statements(root: Node) -> Result<Vec<Statement>> {
    if !root.is_root() {
        return Err(Error::invariant("statement extraction expects the root node"));
    }
    root.into_children()
        .into_iter()
        .map(Statement::from_node)
        .collect()
}

impl Statement {
    fn from_node(node: Node) -> Result<Statement> {
        match node.rule() {
            Some(Rule::Member) => {
                let mut children = node.into_children();
                if children.len() != 2 {
                    return Err(Error::invariant("member without key and value"));
                }
                let value = children.pop().expect("member value");
                let key = children.pop().expect("member key");
                let path = Pointer::from_key_node(&key)?;
                Ok(Statement::Member { path, value })
            }
            Some(Rule::DeleteKeys) => {
                let key = node
                    .into_children()
                    .pop()
                    .ok_or_else(|| Error::invariant("delete without a key"))?;
                let path = Pointer::from_key_node(&key)?;
                Ok(Statement::Delete { path })
            }
            Some(Rule::IncludeFile) => {
                let value = node
                    .into_children()
                    .pop()
                    .ok_or_else(|| Error::invariant("include without a path"))?;
                Ok(Statement::Include { value })
            }
            other => Err(Error::invariant(format!("unexpected statement: {other:?}"))),
        }
    }
}

/// The reduced document: an ordered mapping from key path to the owned
/// value subtree that last defined it.
#[derive(Debug, Default)]
pub struct Document {
    entries: Vec<(Pointer, Node)>,
    index: HashMap<Pointer, usize>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Document {
    /// Inserts at the end, or replaces the value in place when the path is
    /// already present: last write wins, first position kept.
    pub fn insert(&mut self, path: Pointer, value: Node) {
        if let Some(&idx) = self.index.get(&path) {
            self.entries[idx].1 = value;
            return;
        }
        let idx = self.entries.len();
        self.index.insert(path.clone(), idx);
        self.entries.push((path, value));
    }

    /// Removes entries per the delete policy; absent paths are not an
    /// error. Returns how many entries were removed.
    pub fn remove(&mut self, path: &Pointer, policy: DeletePolicy) -> usize {
        let before = self.entries.len();
        match policy {
            DeletePolicy::Exact => self.entries.retain(|(entry, _)| entry != path),
            DeletePolicy::Subtree => self.entries.retain(|(entry, _)| !entry.starts_with(path)),
        }
        if self.entries.len() != before {
            self.index.clear();
            for (idx, (entry, _)) in self.entries.iter().enumerate() {
                self.index.insert(entry.clone(), idx);
            }
        }
        before - self.entries.len()
    }

    pub fn get(&self, path: &Pointer) -> Option<&Node> {
        self.index.get(path).map(|&idx| &self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Pointer, &Node)> {
        self.entries.iter().map(|(path, value)| (path, value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Pointer> {
        self.entries.iter().map(|(path, _)| path)
    }
}

pub fn reduce(root: Node) -> Result<Document> {
    reduce_with_options(root, &ReduceOptions::default())
}

pub fn reduce_with_options(root: Node, options: &ReduceOptions) -> Result<Document> {
    let mut reducer = Reducer::new(options);
    let base = options.include_base.clone();
    reducer.fold(statements(root)?, base.as_deref())?;
    Ok(reducer.doc)
}

/// Reads, parses, and reduces one file; relative includes resolve against
/// the file's directory and the file itself seeds cycle detection.
pub fn reduce_file(path: &Path, options: &ReduceOptions) -> Result<Document> {
    let canonical = fs::canonicalize(path)
        .map_err(|err| Error::io(format!("{}: {err}", path.display())))?;
    let input = fs::read_to_string(&canonical)
        .map_err(|err| Error::io(format!("{}: {err}", path.display())))?;
    let root = grammar::parse(&input).map_err(|err| err.in_file(path))?;
    let mut reducer = Reducer::new(options);
    let base = canonical.parent().map(Path::to_path_buf);
    reducer.stack.push(canonical);
    reducer.fold(statements(root)?, base.as_deref())?;
    Ok(reducer.doc)
}

struct Reducer<'a> {
    options: &'a ReduceOptions,
    /// Canonical paths of the files currently being reduced, outermost
    /// first. Cycle detection checks membership before descending.
    stack: Vec<PathBuf>,
    doc: Document,
}

impl<'a> Reducer<'a> {
    fn new(options: &'a ReduceOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            doc: Document::default(),
        }
    }

    /// Folds statements strictly in source order; included statements are
    /// spliced at the include's position, so later statements in the
    /// including document still override them.
    fn fold(&mut self, statements: Vec<Statement>, base: Option<&Path>) -> Result<()> {
        for statement in statements {
            match statement {
                Statement::Member { path, value } => self.doc.insert(path, value),
                Statement::Delete { path } => {
                    self.doc.remove(&path, self.options.delete);
                }
                Statement::Include { value } => self.include(&value, base)?,
            }
        }
        Ok(())
    }

    fn include(&mut self, value: &Node, base: Option<&Path>) -> Result<()> {
        let text = include_path(value)?;
        let Some(base) = base else {
            return Err(Error::reduce(format!(
                "cannot resolve include {text:?}: no base directory"
            )));
        };
        let raw = if Path::new(&text).is_absolute() {
            PathBuf::from(&text)
        } else {
            base.join(&text)
        };
        let canonical = fs::canonicalize(&raw)
            .map_err(|err| Error::io(format!("{}: {err}", raw.display())))?;
        if self.stack.contains(&canonical) {
            return Err(Error::reduce(format!(
                "include cycle detected: {}",
                raw.display()
            )));
        }
        let input = fs::read_to_string(&canonical)
            .map_err(|err| Error::io(format!("{}: {err}", raw.display())))?;
        let root = grammar::parse(&input).map_err(|err| err.in_file(&raw))?;
        let parent = canonical.parent().map(Path::to_path_buf);
        self.stack.push(canonical);
        let result = self.fold(statements(root)?, parent.as_deref());
        self.stack.pop();
        result
    }
}

/// Decodes an include path from a parsed string node. Only literal
/// fragments can be resolved; embedded expressions would need evaluation.
fn include_path(value: &Node) -> Result<String> {
    if !value.is(Rule::String) {
        return Err(Error::invariant("include path is not a string"));
    }
    let mut path = String::new();
    for fragment in value.children() {
        match fragment.rule() {
            Some(Rule::StringFragment) => {
                let raw = fragment
                    .content()
                    .ok_or_else(|| Error::invariant("string fragment without content"))?;
                path.push_str(&jaxn::decode_string(raw)?);
            }
            Some(Rule::Expression) => {
                return Err(Error::not_implemented("expression in include path"));
            }
            other => {
                return Err(Error::invariant(format!(
                    "unexpected string fragment: {other:?}"
                )));
            }
        }
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Span;

    fn value(text: &str) -> Node {
        Node::leaf(Rule::Number, Span { start: 0, end: text.len() }, text)
    }

    fn path(segments: &[&str]) -> Pointer {
        segments.iter().copied().collect()
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut doc = Document::default();
        doc.insert(path(&["a"]), value("1"));
        doc.insert(path(&["b"]), value("2"));
        doc.insert(path(&["a"]), value("3"));
        assert_eq!(doc.len(), 2);
        let keys: Vec<_> = doc.keys().map(ToString::to_string).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(doc.get(&path(&["a"])).unwrap().content(), Some("3"));
    }

    #[test]
    fn remove_exact_leaves_descendants() {
        let mut doc = Document::default();
        doc.insert(path(&["a"]), value("1"));
        doc.insert(path(&["a", "b"]), value("2"));
        assert_eq!(doc.remove(&path(&["a"]), DeletePolicy::Exact), 1);
        assert_eq!(doc.len(), 1);
        assert!(doc.get(&path(&["a", "b"])).is_some());
    }

    #[test]
    fn remove_subtree_takes_descendants() {
        let mut doc = Document::default();
        doc.insert(path(&["a"]), value("1"));
        doc.insert(path(&["a", "b"]), value("2"));
        doc.insert(path(&["ab"]), value("3"));
        assert_eq!(doc.remove(&path(&["a"]), DeletePolicy::Subtree), 2);
        let keys: Vec<_> = doc.keys().map(ToString::to_string).collect();
        assert_eq!(keys, ["ab"]);
        // index stays coherent after compaction
        assert_eq!(doc.get(&path(&["ab"])).unwrap().content(), Some("3"));
    }

    #[test]
    fn remove_of_absent_path_is_not_an_error() {
        let mut doc = Document::default();
        doc.insert(path(&["a"]), value("1"));
        assert_eq!(doc.remove(&path(&["zzz"]), DeletePolicy::Subtree), 0);
        assert_eq!(doc.len(), 1);
    }
}
