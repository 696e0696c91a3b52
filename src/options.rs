use std::path::PathBuf;

/// What `delete a.b` removes from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Only an entry whose path equals the deleted path.
    Exact,
    /// The entry and every entry whose path it prefixes.
    #[default]
    Subtree,
}

#[derive(Debug, Clone, Default)]
pub struct ReduceOptions {
    pub delete: DeletePolicy,
    /// Directory that relative include paths resolve against. With no base,
    /// an `include` statement is an error rather than a silent no-op.
    pub include_base: Option<PathBuf>,
}

impl ReduceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delete(mut self, delete: DeletePolicy) -> Self {
        self.delete = delete;
        self
    }

    pub fn with_include_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.include_base = Some(base.into());
        self
    }
}
