//! Instruction templates wrapped around the diff payload.

use crate::error::ConfigError;

/// Placeholder replaced by the concatenated diff payload.
pub const DIFF_PLACEHOLDER: &str = "{diff}";

/// Placeholder replaced by the configured output language.
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

/// Default template when no output language is fixed.
pub const GENERIC_TEMPLATE: &str = "Given the following diff of staged changes in a Git repository, generate a commit message:\n\n{diff}\n\nCommit message:";

/// Default template when an output language is configured.
pub const LOCALIZED_TEMPLATE: &str = "Given the following diff of staged changes in a Git repository, generate a commit message written in {language}. Reply with the commit message only.\n\n{diff}\n\nCommit message:";

/// A validated instruction template containing exactly one `{diff}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionTemplate {
    text: String,
}

impl InstructionTemplate {
    /// Validate `text` as a template.
    pub fn parse(text: impl Into<String>) -> Result<Self, ConfigError> {
        let text = text.into();
        let found = text.matches(DIFF_PLACEHOLDER).count();
        if found != 1 {
            return Err(ConfigError::InvalidTemplate { found });
        }
        Ok(Self { text })
    }

    pub fn generic() -> Self {
        Self {
            text: GENERIC_TEMPLATE.to_string(),
        }
    }

    pub fn localized(language: &str) -> Self {
        Self {
            text: LOCALIZED_TEMPLATE.replace(LANGUAGE_PLACEHOLDER, language),
        }
    }

    /// Pick the template for a run.
    ///
    /// A custom template wins over the built-ins. `{language}` in a custom
    /// template requires `language` to be set.
    pub fn resolve(custom: Option<&str>, language: Option<&str>) -> Result<Self, ConfigError> {
        let Some(custom) = custom else {
            return Ok(match language {
                Some(language) => Self::localized(language),
                None => Self::generic(),
            });
        };

        let text = if custom.contains(LANGUAGE_PLACEHOLDER) {
            let language = language.ok_or_else(|| ConfigError::InvalidValue {
                key: "template",
                value: custom.to_string(),
                reason: "template uses {language} but no language is configured".to_string(),
            })?;
            custom.replace(LANGUAGE_PLACEHOLDER, language)
        } else {
            custom.to_string()
        };

        Self::parse(text)
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Substitute `payload` for the `{diff}` placeholder in `text`.
///
/// Text without a placeholder gets the payload appended.
pub fn render(text: &str, payload: &str) -> String {
    let (prefix, suffix) = text.split_once(DIFF_PLACEHOLDER).unwrap_or((text, ""));
    let mut out = String::with_capacity(prefix.len() + payload.len() + suffix.len());
    out.push_str(prefix);
    out.push_str(payload);
    out.push_str(suffix);
    out
}

impl Default for InstructionTemplate {
    fn default() -> Self {
        Self::generic()
    }
}
