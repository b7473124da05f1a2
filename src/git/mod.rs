//! Staged-change inspection using git2-rs.
//!
//! The pipeline only depends on [`RepositoryProvider`]; [`Git2Repository`]
//! is the implementation backed by an on-disk repository.

pub mod content;
pub mod repository;
pub mod status;

use std::fmt;

use crate::error::{ContentError, RepositoryError};

pub use content::{FileSnapshot, resolve_snapshot};
pub use repository::{Git2Repository, StagedSource};
pub use status::enumerate_changes;

/// Staging-area state of one path relative to the last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Unmodified,
}

impl fmt::Display for StagingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StagingStatus::Added => write!(f, "Added"),
            StagingStatus::Modified => write!(f, "Modified"),
            StagingStatus::Deleted => write!(f, "Deleted"),
            StagingStatus::Renamed => write!(f, "Renamed"),
            StagingStatus::Unmodified => write!(f, "Unmodified"),
        }
    }
}

/// Raw status entry as reported by a [`RepositoryProvider`].
///
/// Providers may report paths whose staging status is `Unmodified`
/// (for example files changed only in the working tree).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: String,
    pub staging_status: StagingStatus,
    /// Path in the last commit, for renamed entries.
    pub old_path: Option<String>,
}

/// A path whose staged state differs from the last commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub staging_status: StagingStatus,
    /// Old path for renamed files (None for non-rename changes).
    pub old_path: Option<String>,
}

impl FileChange {
    /// Path to look the file up under in the last commit.
    pub fn committed_path(&self) -> &str {
        self.old_path.as_deref().unwrap_or(&self.path)
    }
}

/// The narrow repository contract the pipeline depends on.
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryProvider {
    /// Staging status of every path that differs between HEAD, index or
    /// working tree.
    fn staging_status(&self) -> Result<Vec<StatusEntry>, RepositoryError>;

    /// Content of `path` in the last commit, or `None` if the path did not
    /// exist there.
    fn committed_content(&self, path: &str) -> Result<Option<String>, ContentError>;

    /// Current staged content of `path`.
    fn staged_content(&self, path: &str) -> Result<String, ContentError>;
}
