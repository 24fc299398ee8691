//! Generated component source text.

use std::fmt;
use std::sync::Arc;

/// The latest generated component source.
///
/// Cheap to clone and never modified after construction; a new generation
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceText(Arc<str>);

impl SourceText {
    /// Wrap a source string.
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self(source.into())
    }

    /// Borrow the raw source.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the source holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the source is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for SourceText {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for SourceText {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl AsRef<str> for SourceText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
