pub mod error;
pub mod options;
pub mod pointer;
pub mod reduce;
pub mod tree;

mod cursor;
mod grammar;
mod jaxn;

use std::path::Path;

pub use crate::error::{Error, ErrorKind, Location};
pub use crate::options::{DeletePolicy, ReduceOptions};
pub use crate::pointer::Pointer;
pub use crate::reduce::{statements, Document, Statement};
pub use crate::tree::{Node, Rule, Span};

pub type Result<T> = std::result::Result<T, Error>;

/// Parses one configuration document into its retained parse tree.
pub fn parse_str(input: &str) -> Result<Node> {
    grammar::parse(input)
}

/// Reduces a parsed document with default options (subtree deletes,
/// includes refused for lack of a base directory).
pub fn reduce(root: Node) -> Result<Document> {
    reduce::reduce(root)
}

pub fn reduce_with_options(root: Node, options: &ReduceOptions) -> Result<Document> {
    reduce::reduce_with_options(root, options)
}

/// Parses and reduces a file; includes resolve relative to it.
pub fn reduce_file(path: impl AsRef<Path>, options: &ReduceOptions) -> Result<Document> {
    reduce::reduce_file(path.as_ref(), options)
}
