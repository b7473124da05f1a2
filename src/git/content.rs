//! Old/new content resolution for a single staged change.

use tracing::trace;

use crate::error::ContentError;
use crate::git::{FileChange, RepositoryProvider, StagingStatus};

/// Committed and staged content of one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    pub path: String,
    /// None when the file is newly added.
    pub committed_content: Option<String>,
    /// None when the file was deleted from the index.
    pub staged_content: Option<String>,
}

impl FileSnapshot {
    /// Old side as text, empty when absent.
    pub fn old_text(&self) -> &str {
        self.committed_content.as_deref().unwrap_or("")
    }

    /// New side as text, empty when absent.
    pub fn new_text(&self) -> &str {
        self.staged_content.as_deref().unwrap_or("")
    }
}

/// Resolve the last-committed and staged content for `change`.
///
/// A path missing from the last commit is not an error: it resolves to
/// `committed_content: None`. Deleted files resolve to
/// `staged_content: None` without consulting the staged view.
pub fn resolve_snapshot<R>(repo: &R, change: &FileChange) -> Result<FileSnapshot, ContentError>
where
    R: RepositoryProvider + ?Sized,
{
    let committed_content = repo.committed_content(change.committed_path())?;

    let staged_content = match change.staging_status {
        StagingStatus::Deleted => None,
        _ => Some(repo.staged_content(&change.path)?),
    };

    trace!(
        path = %change.path,
        had_committed = committed_content.is_some(),
        has_staged = staged_content.is_some(),
        "Resolved snapshot"
    );

    Ok(FileSnapshot {
        path: change.path.clone(),
        committed_content,
        staged_content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepositoryProvider;
    use mockall::predicate::eq;

    fn change(path: &str, staging_status: StagingStatus) -> FileChange {
        FileChange {
            path: path.to_string(),
            staging_status,
            old_path: None,
        }
    }

    #[test]
    fn test_resolve_added_file_has_no_committed_content() {
        let mut repo = MockRepositoryProvider::new();
        repo.expect_committed_content()
            .with(eq("hello.txt"))
            .returning(|_| Ok(None));
        repo.expect_staged_content()
            .with(eq("hello.txt"))
            .returning(|_| Ok("hi\n".to_string()));

        let snapshot = resolve_snapshot(&repo, &change("hello.txt", StagingStatus::Added)).unwrap();
        assert_eq!(snapshot.committed_content, None);
        assert_eq!(snapshot.staged_content.as_deref(), Some("hi\n"));
        assert_eq!(snapshot.old_text(), "");
    }

    #[test]
    fn test_resolve_deleted_file_skips_staged_lookup() {
        let mut repo = MockRepositoryProvider::new();
        repo.expect_committed_content()
            .returning(|_| Ok(Some("gone\n".to_string())));
        repo.expect_staged_content().never();

        let snapshot = resolve_snapshot(&repo, &change("old.txt", StagingStatus::Deleted)).unwrap();
        assert_eq!(snapshot.committed_content.as_deref(), Some("gone\n"));
        assert_eq!(snapshot.staged_content, None);
        assert_eq!(snapshot.new_text(), "");
    }

    #[test]
    fn test_resolve_renamed_file_reads_old_path_from_commit() {
        let mut repo = MockRepositoryProvider::new();
        repo.expect_committed_content()
            .with(eq("before.rs"))
            .returning(|_| Ok(Some("fn a() {}\n".to_string())));
        repo.expect_staged_content()
            .with(eq("after.rs"))
            .returning(|_| Ok("fn a() {}\n".to_string()));

        let renamed = FileChange {
            path: "after.rs".to_string(),
            staging_status: StagingStatus::Renamed,
            old_path: Some("before.rs".to_string()),
        };
        let snapshot = resolve_snapshot(&repo, &renamed).unwrap();
        assert_eq!(snapshot.path, "after.rs");
        assert_eq!(snapshot.old_text(), snapshot.new_text());
    }

    #[test]
    fn test_resolve_staged_read_failure_is_fatal() {
        let mut repo = MockRepositoryProvider::new();
        repo.expect_committed_content()
            .returning(|_| Ok(Some("a\n".to_string())));
        repo.expect_staged_content().returning(|path| {
            Err(ContentError::NotStaged {
                path: path.to_string(),
            })
        });

        let err = resolve_snapshot(&repo, &change("a.txt", StagingStatus::Modified)).unwrap_err();
        assert_eq!(err.path(), "a.txt");
    }

    #[test]
    fn test_resolve_committed_lookup_failure_is_fatal() {
        let mut repo = MockRepositoryProvider::new();
        repo.expect_committed_content().returning(|path| {
            Err(ContentError::CommittedLookup {
                path: path.to_string(),
                source: git2::Error::from_str("object database corrupt"),
            })
        });
        repo.expect_staged_content().never();

        let err = resolve_snapshot(&repo, &change("a.txt", StagingStatus::Modified)).unwrap_err();
        assert!(matches!(err, ContentError::CommittedLookup { .. }));
    }
}
