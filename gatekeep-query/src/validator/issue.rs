//! Validation diagnostics.

use smallvec::SmallVec;
use smol_str::SmolStr;
use std::fmt;

/// One step in the path to a rejected value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key.
    Key(SmolStr),
    /// Array index.
    Index(usize),
}

impl PathSegment {
    /// Object key segment.
    pub fn key(key: impl Into<SmolStr>) -> Self {
        Self::Key(key.into())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(i) => write!(f, "[{i}]"),
        }
    }
}

/// Path from the argument root to a value.
pub type Path = SmallVec<[PathSegment; 8]>;

/// Render a path as `data.posts[0].title`.
pub fn format_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
        }
    }
    out
}

/// How an issue came about. Drives union branch selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// The value has the wrong type at this path.
    TypeMismatch,
    /// Missing, unknown or conflicting keys, wrong item counts.
    Structural,
    /// The shape matched but a refinement or value check rejected it.
    Refinement,
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    /// Where the rejected value sits.
    pub path: Path,
    /// Human-readable reason.
    pub message: String,
    /// Issue category.
    pub kind: IssueKind,
}

impl Issue {
    /// Create an issue.
    pub fn new(path: Path, message: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            path,
            message: message.into(),
            kind,
        }
    }

    /// The path rendered as a dotted string.
    pub fn path_string(&self) -> String {
        format_path(&self.path)
    }

    /// Path segments as plain strings (indices rendered as numbers).
    pub fn path_segments(&self) -> Vec<String> {
        self.path.iter().map(|s| match s {
            PathSegment::Key(k) => k.to_string(),
            PathSegment::Index(i) => i.to_string(),
        }).collect()
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}
