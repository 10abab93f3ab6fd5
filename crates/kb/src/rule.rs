//! Rule records: the on-disk definition and its compiled form.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use shellbuddy_core::Severity;

/// Compiled regex size cap. Corpus patterns come from a generated,
/// partially-trusted file; anything that blows past this is rejected at
/// load time instead of admitted into a bucket.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// One rule as it appears in `kb.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleDef {
    /// Stable identifier, e.g. `git-014`.
    pub id: String,

    /// Regular expression anchored at the start of the command.
    pub pattern: String,

    /// Primary command token used for bucketing (e.g. `git`). May be empty,
    /// in which case the token is extracted from the pattern itself.
    #[serde(default)]
    pub cmd: String,

    pub severity: Severity,

    /// Short actionable hint, rendering budget ~70 chars. `{arg}` is
    /// substituted with the first argument of the matching command.
    pub hint: String,

    /// Longer expert context injected into `/tip` prompts.
    #[serde(default)]
    pub detail: String,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// A rule admitted into the dispatcher: definition plus compiled pattern.
#[derive(Debug, Clone)]
pub struct Rule {
    pub def: RuleDef,
    pub regex: Regex,
}

impl Rule {
    /// Compile a definition, rejecting invalid or oversized patterns.
    pub fn compile(def: RuleDef) -> Option<Rule> {
        match RegexBuilder::new(&def.pattern)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => Some(Rule { def, regex }),
            Err(e) => {
                tracing::debug!(id = %def.id, error = %e, "Skipping invalid pattern");
                None
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.def.id
    }

    pub fn severity(&self) -> Severity {
        self.def.severity
    }

    /// Whether the compiled pattern matches the command text.
    pub fn matches(&self, cmd: &str) -> bool {
        self.regex.is_match(cmd)
    }
}
