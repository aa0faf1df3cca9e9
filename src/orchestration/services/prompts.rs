//! Prompt templates for each engine-driven phase.

use super::{OrchestrationError, OrchestrationResult};
use minijinja::Environment;
use serde_json::{Map, Value};
use std::io;
use std::path::Path;
use tracing::debug;

/// File name of the planner template.
pub const PLANNER_TEMPLATE: &str = "planner.j2";
/// File name of the architect template.
pub const ARCHITECT_TEMPLATE: &str = "architect.j2";
/// File name of the coder template.
pub const CODER_TEMPLATE: &str = "coder.j2";

const BUILTIN_PLANNER: &str = r#"You are the planning engine for the project "{{ project_name }}".

Break the specification below into small engineering tasks that can each be
implemented and verified on their own.

Specification:
{{ specification }}

Answer with a single ```json block shaped like:
{"tasks": [{"title": "...", "description": "...", "priority": 0,
  "dependencies": [], "gates": [{"name": "...", "command": "...",
  "pass_criteria": "exit_code_0"}]}]}
"#;

const BUILTIN_ARCHITECT: &str = r##"You are the architect for the task "{{ task_title }}".

Task description:
{{ task_description }}
{% if context %}
Additional context:
{{ context }}
{% endif %}
Describe the candidate designs in a ```json block with an "options" list and
a "recommendation". Record each significant decision as its own ```markdown
block that starts with a "# " heading.
"##;

const BUILTIN_CODER: &str = r"Implement the task {{ task_title }} (attempt {{ attempt }}).

{{ task_description }}
{% if history %}
Version history:
{% for version in history %}- v{{ version.version }}: {{ version.title }}
{% endfor %}{% endif %}{% if gates %}
The change must pass these checks, run from the project root:
{% for gate in gates %}- {{ gate.name }}: `{{ gate.command }}`
{% endfor %}{% endif %}{% if attempt > 1 %}
Earlier attempts did not pass every check. Their changes are still in the
working tree; fix them rather than starting over.
{% endif %}";

/// Templates used to build planner, architect, and coder prompts.
///
/// Templates are `minijinja` sources. Missing files fall back to built-in
/// prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLibrary {
    planner: String,
    architect: String,
    coder: String,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptLibrary {
    /// Returns the built-in prompts.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            planner: BUILTIN_PLANNER.to_owned(),
            architect: BUILTIN_ARCHITECT.to_owned(),
            coder: BUILTIN_CODER.to_owned(),
        }
    }

    /// Loads `planner.j2`, `architect.j2`, and `coder.j2` from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Template`] when a template exists but
    /// cannot be read.
    pub fn from_dir(dir: &Path) -> OrchestrationResult<Self> {
        Ok(Self {
            planner: load(dir, PLANNER_TEMPLATE, BUILTIN_PLANNER)?,
            architect: load(dir, ARCHITECT_TEMPLATE, BUILTIN_ARCHITECT)?,
            coder: load(dir, CODER_TEMPLATE, BUILTIN_CODER)?,
        })
    }

    /// Replaces the planner template source.
    #[must_use]
    pub fn with_planner(mut self, source: impl Into<String>) -> Self {
        self.planner = source.into();
        self
    }

    /// Replaces the architect template source.
    #[must_use]
    pub fn with_architect(mut self, source: impl Into<String>) -> Self {
        self.architect = source.into();
        self
    }

    /// Replaces the coder template source.
    #[must_use]
    pub fn with_coder(mut self, source: impl Into<String>) -> Self {
        self.coder = source.into();
        self
    }

    /// Renders the planner prompt. Context keys: `project_name`,
    /// `specification`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Template`] when rendering fails.
    pub fn render_planner(&self, context: Map<String, Value>) -> OrchestrationResult<String> {
        render(PLANNER_TEMPLATE, &self.planner, context)
    }

    /// Renders the architect prompt. Context keys: `task_title`,
    /// `task_description`, `context`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Template`] when rendering fails.
    pub fn render_architect(&self, context: Map<String, Value>) -> OrchestrationResult<String> {
        render(ARCHITECT_TEMPLATE, &self.architect, context)
    }

    /// Renders the coder prompt. Context keys: `task_title`,
    /// `task_description`, `attempt`, `history`, `gates`.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestrationError::Template`] when rendering fails.
    pub fn render_coder(&self, context: Map<String, Value>) -> OrchestrationResult<String> {
        render(CODER_TEMPLATE, &self.coder, context)
    }
}

fn load(dir: &Path, name: &str, fallback: &str) -> OrchestrationResult<String> {
    let path = dir.join(name);
    match std::fs::read_to_string(&path) {
        Ok(source) => {
            debug!(template = name, path = %path.display(), "loaded prompt template");
            Ok(source)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(fallback.to_owned()),
        Err(err) => Err(OrchestrationError::Template {
            template: name.to_owned(),
            reason: err.to_string(),
        }),
    }
}

fn render(name: &str, source: &str, context: Map<String, Value>) -> OrchestrationResult<String> {
    let environment = Environment::new();
    environment
        .render_str(source, context)
        .map_err(|error| OrchestrationError::Template {
            template: name.to_owned(),
            reason: error.to_string(),
        })
}
