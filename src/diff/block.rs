//! Rendered diff blocks, one per staged file.

use crate::diff::render::{DiffOptions, render_text};
use crate::git::{FileChange, FileSnapshot, StagingStatus};

/// The rendered diff of one file plus the metadata needed to label it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffBlock {
    pub path: String,
    pub status: StagingStatus,
    pub old_path: Option<String>,
    /// Mode line followed by the rendered edit script.
    pub rendered_text: String,
}

/// Synthetic mode line describing what happened to the file.
fn mode_line(change: &FileChange) -> String {
    match change.staging_status {
        StagingStatus::Added => "new file".to_string(),
        StagingStatus::Deleted => "deleted file".to_string(),
        StagingStatus::Renamed => format!("renamed from {}", change.committed_path()),
        StagingStatus::Modified => "modified file".to_string(),
        StagingStatus::Unmodified => "unchanged file".to_string(),
    }
}

/// Render the diff block for `change` from its resolved `snapshot`.
pub fn render_block(change: &FileChange, snapshot: &FileSnapshot, options: &DiffOptions) -> DiffBlock {
    let body = render_text(snapshot.old_text(), snapshot.new_text(), options);

    let mut rendered_text = mode_line(change);
    rendered_text.push('\n');
    rendered_text.push_str(&body);

    DiffBlock {
        path: change.path.clone(),
        status: change.staging_status,
        old_path: change.old_path.clone(),
        rendered_text,
    }
}
