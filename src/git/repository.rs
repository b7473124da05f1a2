//! [`RepositoryProvider`] backed by an on-disk repository.

use std::fs;
use std::io;
use std::path::Path;

use git2::{ErrorCode, Repository, Status, StatusOptions};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ContentError, RepositoryError};
use crate::git::{RepositoryProvider, StagingStatus, StatusEntry};

/// Where the "staged" side of a diff is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StagedSource {
    /// The blob recorded in the index.
    #[default]
    Index,
    /// The file as it currently exists in the working directory.
    Worktree,
}

/// A git2 repository exposed through the [`RepositoryProvider`] contract.
pub struct Git2Repository {
    repo: Repository,
    staged_source: StagedSource,
}

impl Git2Repository {
    /// Open the repository rooted exactly at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|source| RepositoryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_repository(repo)
    }

    /// Open the repository containing `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|source| RepositoryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_repository(repo)
    }

    /// Wrap an already-open repository. Bare repositories are rejected.
    pub fn from_repository(repo: Repository) -> Result<Self, RepositoryError> {
        if repo.is_bare() {
            return Err(RepositoryError::Bare);
        }
        Ok(Self {
            repo,
            staged_source: StagedSource::default(),
        })
    }

    pub fn with_staged_source(mut self, staged_source: StagedSource) -> Self {
        self.staged_source = staged_source;
        self
    }

    /// Root of the working directory.
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Fail with `NoCommits` on an unborn branch, `Head` on a corrupt HEAD.
    fn ensure_head_commit(&self) -> Result<(), RepositoryError> {
        let head_ref = match self.repo.head() {
            Ok(r) => r,
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                return Err(RepositoryError::NoCommits);
            }
            Err(e) => return Err(RepositoryError::Head(e)),
        };

        head_ref.peel_to_tree().map_err(RepositoryError::Head)?;
        Ok(())
    }

    fn read_blob(&self, path: &str, id: git2::Oid) -> Result<String, ContentError> {
        let blob = self
            .repo
            .find_blob(id)
            .map_err(|source| ContentError::BlobRead {
                path: path.to_string(),
                source,
            })?;
        Ok(String::from_utf8_lossy(blob.content()).into_owned())
    }

    fn read_index(&self, path: &str) -> Result<String, ContentError> {
        let index = self.repo.index().map_err(|source| ContentError::IndexRead {
            path: path.to_string(),
            source,
        })?;

        let entry = index
            .get_path(Path::new(path), 0)
            .ok_or_else(|| ContentError::NotStaged {
                path: path.to_string(),
            })?;

        self.read_blob(path, entry.id)
    }

    fn read_worktree(&self, path: &str) -> Result<String, ContentError> {
        let worktree_err = |source| ContentError::WorktreeRead {
            path: path.to_string(),
            source,
        };

        let workdir = self.repo.workdir().ok_or_else(|| {
            worktree_err(io::Error::new(
                io::ErrorKind::NotFound,
                "repository has no working directory",
            ))
        })?;

        let bytes = fs::read(workdir.join(path)).map_err(worktree_err)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Collapse the index half of a git2 status into a [`StagingStatus`].
fn staging_status_from(status: Status) -> StagingStatus {
    if status.is_index_new() {
        StagingStatus::Added
    } else if status.is_index_deleted() {
        StagingStatus::Deleted
    } else if status.is_index_renamed() {
        StagingStatus::Renamed
    } else if status.is_index_modified() || status.is_index_typechange() {
        StagingStatus::Modified
    } else {
        StagingStatus::Unmodified
    }
}

/// Decode a status path. Staged paths must be UTF-8 so their content can be
/// looked up again; other entries are filtered out later and decode lossily.
fn decode_path(bytes: Option<&[u8]>, staged: bool) -> Result<String, RepositoryError> {
    let bytes = bytes.unwrap_or_default();
    match std::str::from_utf8(bytes) {
        Ok(path) => Ok(path.to_string()),
        Err(_) if staged => Err(RepositoryError::NonUtf8Path(
            String::from_utf8_lossy(bytes).into_owned(),
        )),
        Err(_) => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

impl RepositoryProvider for Git2Repository {
    fn staging_status(&self) -> Result<Vec<StatusEntry>, RepositoryError> {
        self.ensure_head_commit()?;

        let mut opts = StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .renames_head_to_index(true);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(RepositoryError::Status)?;

        let mut entries = Vec::with_capacity(statuses.len());
        for entry in statuses.iter() {
            let status = entry.status();
            let staging_status = staging_status_from(status);
            let staged = staging_status != StagingStatus::Unmodified;

            // For renames the entry's own path is the old side; the delta
            // carries both.
            let (path, old_path) = match entry.head_to_index() {
                Some(delta) if staging_status == StagingStatus::Renamed => (
                    decode_path(delta.new_file().path_bytes(), staged)?,
                    Some(decode_path(delta.old_file().path_bytes(), staged)?),
                ),
                _ => (decode_path(Some(entry.path_bytes()), staged)?, None),
            };

            if status.is_conflicted() {
                return Err(RepositoryError::Unmerged(path));
            }

            entries.push(StatusEntry {
                path,
                staging_status,
                old_path,
            });
        }

        debug!("Repository reported {} status entries", entries.len());
        Ok(entries)
    }

    fn committed_content(&self, path: &str) -> Result<Option<String>, ContentError> {
        let lookup_err = |source| ContentError::CommittedLookup {
            path: path.to_string(),
            source,
        };

        let tree = self
            .repo
            .head()
            .and_then(|head| head.peel_to_tree())
            .map_err(lookup_err)?;

        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(lookup_err(e)),
        };

        self.read_blob(path, entry.id()).map(Some)
    }

    fn staged_content(&self, path: &str) -> Result<String, ContentError> {
        match self.staged_source {
            StagedSource::Index => self.read_index(path),
            StagedSource::Worktree => self.read_worktree(path),
        }
    }
}
