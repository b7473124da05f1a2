//! Prompt composition: fold per-file diff blocks into one model prompt.

pub mod template;

use tracing::debug;

use crate::diff::DiffBlock;
use crate::git::StagingStatus;

pub use template::{DIFF_PLACEHOLDER, InstructionTemplate};

/// How the diff payload is laid out and wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPolicy {
    pub template: InstructionTemplate,
    /// Precede each block with `--- a/<path>` / `+++ b/<path>`.
    pub file_headers: bool,
    /// Truncate the payload to this many characters.
    pub max_payload_chars: Option<usize>,
}

impl Default for PromptPolicy {
    fn default() -> Self {
        Self {
            template: InstructionTemplate::generic(),
            file_headers: true,
            max_payload_chars: None,
        }
    }
}

/// The instruction template plus the diff payload it wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub instruction_text: String,
    pub diff_payload: String,
}

impl Prompt {
    /// Full text sent to the model.
    pub fn text(&self) -> String {
        template::render(&self.instruction_text, &self.diff_payload)
    }

    /// Whether there is no diff to describe.
    pub fn is_empty(&self) -> bool {
        self.diff_payload.is_empty()
    }
}

/// Fold rendered blocks into a [`Prompt`].
///
/// Blocks for unmodified paths are skipped; the rest keep their order and
/// are separated by one blank line. With no blocks the payload is empty and
/// the template still applies.
pub fn compose(blocks: &[DiffBlock], policy: &PromptPolicy) -> Prompt {
    let payload = blocks
        .iter()
        .filter(|block| block.status != StagingStatus::Unmodified)
        .map(|block| format_block(block, policy.file_headers))
        .collect::<Vec<_>>()
        .join("\n\n");

    let diff_payload = match policy.max_payload_chars {
        Some(max) => truncate_payload(payload, max),
        None => payload,
    };

    debug!(
        "Composed prompt from {} block(s), payload {} chars",
        blocks.len(),
        diff_payload.chars().count()
    );

    Prompt {
        instruction_text: policy.template.text().to_string(),
        diff_payload,
    }
}

fn format_block(block: &DiffBlock, file_headers: bool) -> String {
    let body = block.rendered_text.trim_end_matches('\n');
    if !file_headers {
        return body.to_string();
    }

    let old_side = match block.status {
        StagingStatus::Added => "/dev/null".to_string(),
        _ => format!("a/{}", block.old_path.as_deref().unwrap_or(&block.path)),
    };
    let new_side = match block.status {
        StagingStatus::Deleted => "/dev/null".to_string(),
        _ => format!("b/{}", block.path),
    };

    format!("--- {old_side}\n+++ {new_side}\n{body}")
}

fn truncate_payload(payload: String, max_chars: usize) -> String {
    let Some((cut, _)) = payload.char_indices().nth(max_chars) else {
        return payload;
    };

    let omitted = payload[cut..].chars().count();
    let mut truncated = payload[..cut].to_string();
    truncated.push_str(&format!(
        "\n[diff truncated: {omitted} more characters omitted]"
    ));
    truncated
}
