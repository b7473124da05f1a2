//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use commitscribe::error::{ContentError, GenerationError, RepositoryError};
use commitscribe::git::{RepositoryProvider, StagingStatus, StatusEntry};
use commitscribe::llm::{CancelToken, GeneratedMessage, MessageGenerator};
use commitscribe::prompt::Prompt;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write `content` to `path` in the working tree.
    pub fn write(&self, path: &str, content: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(full, content).expect("Failed to write test file");
    }

    /// Write and stage `path`.
    pub fn stage(&self, path: &str, content: &str) {
        self.write(path, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(path)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Delete `path` from the working tree and the index.
    pub fn stage_removal(&self, path: &str) {
        std::fs::remove_file(self.dir.path().join(path)).expect("Failed to remove file");
        let mut index = self.repo.index().expect("Failed to get index");
        index.remove_path(Path::new(path)).expect("Failed to remove from index");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is currently in the index. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        let sig = self.signature();

        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Stage and commit the given files in one commit.
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> Oid {
        for (path, content) in files {
            self.stage(path, content);
        }
        self.commit(message)
    }
}

/// In-memory [`RepositoryProvider`] for pipeline scenarios.
#[derive(Default)]
pub struct FakeRepository {
    pub entries: Vec<StatusEntry>,
    pub committed: BTreeMap<String, String>,
    pub staged: BTreeMap<String, String>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_change(
        mut self,
        path: &str,
        staging_status: StagingStatus,
        committed: Option<&str>,
        staged: Option<&str>,
    ) -> Self {
        self.entries.push(StatusEntry {
            path: path.to_string(),
            staging_status,
            old_path: None,
        });
        if let Some(content) = committed {
            self.committed.insert(path.to_string(), content.to_string());
        }
        if let Some(content) = staged {
            self.staged.insert(path.to_string(), content.to_string());
        }
        self
    }
}

impl RepositoryProvider for FakeRepository {
    fn staging_status(&self) -> Result<Vec<StatusEntry>, RepositoryError> {
        Ok(self.entries.clone())
    }

    fn committed_content(&self, path: &str) -> Result<Option<String>, ContentError> {
        Ok(self.committed.get(path).cloned())
    }

    fn staged_content(&self, path: &str) -> Result<String, ContentError> {
        self.staged
            .get(path)
            .cloned()
            .ok_or_else(|| ContentError::NotStaged {
                path: path.to_string(),
            })
    }
}

/// Generator returning a fixed reply and recording every prompt it sees.
#[derive(Clone)]
pub struct StubGenerator {
    reply: String,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<Prompt>>>,
}

impl StubGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<Prompt> {
        self.prompts.lock().expect("prompt log poisoned").last().cloned()
    }
}

#[async_trait]
impl MessageGenerator for StubGenerator {
    async fn generate(
        &self,
        prompt: &Prompt,
        _cancel: &CancelToken,
    ) -> Result<GeneratedMessage, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("prompt log poisoned")
            .push(prompt.clone());
        Ok(GeneratedMessage::new(&self.reply))
    }
}
