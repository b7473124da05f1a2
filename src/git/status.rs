//! Staged change enumeration.

use tracing::debug;

use crate::error::RepositoryError;
use crate::git::{FileChange, RepositoryProvider, StagingStatus};

/// List every path whose staged state differs from the last commit.
///
/// Entries the provider reports as `Unmodified` (worktree-only edits) are
/// dropped. The result is sorted by path so prompt layout does not depend on
/// the provider's traversal order.
pub fn enumerate_changes<R>(repo: &R) -> Result<Vec<FileChange>, RepositoryError>
where
    R: RepositoryProvider + ?Sized,
{
    let mut changes: Vec<FileChange> = repo
        .staging_status()?
        .into_iter()
        .filter(|entry| entry.staging_status != StagingStatus::Unmodified)
        .map(|entry| FileChange {
            path: entry.path,
            staging_status: entry.staging_status,
            old_path: entry.old_path,
        })
        .collect();

    changes.sort_by(|a, b| a.path.cmp(&b.path));
    changes.dedup_by(|a, b| a.path == b.path);

    debug!("Found {} staged change(s)", changes.len());
    Ok(changes)
}
