use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};

const DEFAULT_TEMPLATE: &str = include_str!("default_prompts/generate-test-cases.md");
const TEMPLATE_FILENAME: &str = "generate-test-cases.md";

/// System turn sent ahead of every generated prompt.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert QA engineer who creates comprehensive test cases. Always respond with valid JSON format for test cases.";

pub const DEFAULT_CATEGORIES: &[&str] = &["functional", "negative", "edge_case"];
pub const DEFAULT_LANGUAGE: &str = "English";

#[derive(Serialize)]
struct PromptVars<'a> {
    requirement: &'a str,
    categories: String,
    language: &'a str,
}

/// Builds the user prompt from the embedded template or a user override.
#[derive(Debug, Clone)]
pub struct PromptEngine {
    override_dir: Option<PathBuf>,
    language: String,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new(None, DEFAULT_LANGUAGE)
    }
}

impl PromptEngine {
    pub fn new(override_dir: Option<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            override_dir,
            language: language.into(),
        }
    }

    /// Load the prompt template.
    /// `generate-test-cases.md` in `override_dir` takes precedence over the default.
    pub fn load_template(&self) -> Result<String> {
        if let Some(ref dir) = self.override_dir {
            let path = Path::new(dir).join(TEMPLATE_FILENAME);
            if path.exists() {
                debug!(path = %path.display(), "using prompt override");
                return std::fs::read_to_string(&path).map_err(|e| {
                    Error::Prompt(format!(
                        "failed to read override template {}: {e}",
                        path.display()
                    ))
                });
            }
        }
        Ok(DEFAULT_TEMPLATE.to_string())
    }

    /// Render the prompt for a requirement. An empty `categories` slice means
    /// the default functional/negative/edge_case set.
    pub fn build(&self, requirement: &str, categories: &[String]) -> Result<String> {
        let template = self.load_template()?;
        render_template(&template, requirement, categories, &self.language)
    }
}

/// Render `template` with the requirement, the comma-joined categories and
/// the output language.
pub fn render_template(
    template: &str,
    requirement: &str,
    categories: &[String],
    language: &str,
) -> Result<String> {
    let categories = if categories.is_empty() {
        DEFAULT_CATEGORIES.join(", ")
    } else {
        categories.join(", ")
    };
    let vars = PromptVars {
        requirement: requirement.trim(),
        categories,
        language,
    };

    let engine = upon::Engine::new();
    let compiled = engine
        .compile(template)
        .map_err(|e| Error::Prompt(format!("invalid prompt template: {e}")))?;
    compiled
        .render(&engine, &vars)
        .to_string()
        .map_err(|e| Error::Prompt(format!("failed to render prompt: {e}")))
}
