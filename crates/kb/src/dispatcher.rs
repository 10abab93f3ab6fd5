//! The dispatcher: bucketed pattern matching over the rule corpus.
//!
//! Rules are partitioned by leading command token at load time, so a scan
//! evaluates only one bucket plus the small generic set instead of the whole
//! corpus. Bucketing is a performance optimization, not a semantic filter:
//! a bucketed scan returns exactly what a linear scan over every rule would.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use regex::Regex;
use shellbuddy_core::error::CorpusError;
use shellbuddy_core::{CommandEvent, Severity};
use tracing::{info, warn};

use crate::rule::{Rule, RuleDef};

/// Privilege-elevation wrappers: bucketing uses the token that follows.
const ELEVATION_WRAPPERS: &[&str] = &["sudo", "doas"];

/// Max hints surfaced per reflex cycle.
const MAX_HINTS: usize = 3;

/// `{arg}` substitution budget in rendered hints.
const ARG_BUDGET: usize = 40;

/// Load outcome counters, reported once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub total: usize,
    pub buckets: usize,
    pub generic: usize,
    pub skipped: usize,
}

/// One ranked, rendered hint ready for the panel.
#[derive(Debug, Clone)]
pub struct RankedHint {
    pub rule_id: String,
    pub severity: Severity,
    pub text: String,
}

/// Dispatcher engine for the shellbuddy knowledge base.
///
/// Buckets are keyed by primary command token (e.g. "git", "docker");
/// patterns without a clear leading token (pipes, compound commands) land
/// in the generic set and are evaluated on every scan.
pub struct RuleDispatcher {
    rules: Vec<Rule>,
    buckets: HashMap<String, Vec<usize>>,
    generic: Vec<usize>,
    stats: LoadStats,
}

impl RuleDispatcher {
    /// Build a dispatcher from rule definitions.
    ///
    /// Invalid patterns and duplicate ids/patterns are skipped and counted,
    /// never fatal.
    pub fn load(defs: impl IntoIterator<Item = RuleDef>) -> Self {
        let started = Instant::now();
        let token_from_pattern =
            Regex::new(r"^\^?\(?([A-Za-z][A-Za-z0-9_-]*)").expect("static pattern");

        let mut rules: Vec<Rule> = Vec::new();
        let mut buckets: HashMap<String, Vec<usize>> = HashMap::new();
        let mut generic: Vec<usize> = Vec::new();
        let mut seen_ids: HashMap<String, ()> = HashMap::new();
        let mut seen_patterns: HashMap<String, ()> = HashMap::new();
        let mut skipped = 0usize;

        for def in defs {
            if seen_ids.contains_key(&def.id) || seen_patterns.contains_key(&def.pattern) {
                skipped += 1;
                continue;
            }

            let Some(rule) = Rule::compile(def) else {
                skipped += 1;
                continue;
            };

            seen_ids.insert(rule.def.id.clone(), ());
            seen_patterns.insert(rule.def.pattern.clone(), ());

            let idx = rules.len();
            let declared = rule.def.cmd.trim().to_lowercase();
            let is_token = |s: &str| {
                !s.is_empty()
                    && s.chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            };
            let mut tokens: Vec<String> = Vec::new();
            if is_token(&declared) {
                tokens.push(declared);
            }
            // the pattern can admit spellings beyond the declared token:
            // `^pip3?` (cmd "pip") must also land in the "pip3" bucket, or
            // bucketing would filter commands a linear scan matches
            if let Some(caps) = token_from_pattern.captures(&rule.def.pattern) {
                let m = caps.get(1).expect("group 1 always present on match");
                let token = m.as_str().to_lowercase();
                if rule.def.pattern[m.end()..].starts_with('?') && token.len() > 1 {
                    tokens.push(token[..token.len() - 1].to_string());
                }
                tokens.push(token);
            }
            if tokens.is_empty() {
                generic.push(idx);
            } else {
                tokens.sort_unstable();
                tokens.dedup();
                for token in tokens {
                    buckets.entry(token).or_default().push(idx);
                }
            }
            rules.push(rule);
        }

        let stats = LoadStats {
            total: rules.len(),
            buckets: buckets.len(),
            generic: generic.len(),
            skipped,
        };

        info!(
            rules = stats.total,
            buckets = stats.buckets,
            generic = stats.generic,
            skipped = stats.skipped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Rule corpus loaded"
        );

        Self {
            rules,
            buckets,
            generic,
            stats,
        }
    }

    /// Load from a `kb.json` file: a JSON array of rule records.
    ///
    /// Malformed individual records are skipped and counted; only an
    /// unreadable or structurally invalid file is an error (callers then
    /// fall back to the built-in rule set).
    pub fn load_file(path: &Path) -> Result<Self, CorpusError> {
        let content = std::fs::read_to_string(path).map_err(|e| CorpusError::ReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let raw: Vec<serde_json::Value> =
            serde_json::from_str(&content).map_err(|e| CorpusError::ParseError {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut malformed = 0usize;
        let defs: Vec<RuleDef> = raw
            .into_iter()
            .filter_map(|v| match serde_json::from_value::<RuleDef>(v) {
                Ok(def) => Some(def),
                Err(_) => {
                    malformed += 1;
                    None
                }
            })
            .collect();

        if malformed > 0 {
            warn!(malformed, path = %path.display(), "Skipped malformed corpus entries");
        }

        let mut dispatcher = Self::load(defs);
        dispatcher.stats.skipped += malformed;
        Ok(dispatcher)
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match a command against the relevant rules.
    ///
    /// Returns matched rules ordered bucket matches first, then generic.
    pub fn scan(&self, cmd: &str) -> Vec<&Rule> {
        let cmd = cmd.trim();
        if cmd.is_empty() {
            return Vec::new();
        }

        let mut matches = Vec::new();
        if let Some(token) = lead_token(cmd) {
            if let Some(indices) = self.buckets.get(&token) {
                matches.extend(
                    indices
                        .iter()
                        .map(|&i| &self.rules[i])
                        .filter(|r| r.matches(cmd)),
                );
            }
        }
        matches.extend(
            self.generic
                .iter()
                .map(|&i| &self.rules[i])
                .filter(|r| r.matches(cmd)),
        );
        matches
    }

    /// Rank hints for the reflex tier: tally match frequency across the
    /// recent window, most frequent first (rule id breaks ties), skip rules
    /// still in cooldown, except danger rules, which always surface.
    pub fn rank_hints(
        &self,
        recent: &[CommandEvent],
        last_shown: &HashMap<String, Instant>,
        cooldown: Duration,
    ) -> Vec<RankedHint> {
        let now = Instant::now();
        let mut freq: HashMap<&str, usize> = HashMap::new();
        // rule id → (rule, most recent matching example)
        let mut matched: HashMap<&str, (&Rule, &str)> = HashMap::new();

        for event in recent {
            for rule in self.scan(&event.cmd) {
                *freq.entry(rule.id()).or_default() += 1;
                matched.insert(rule.id(), (rule, event.cmd.trim()));
            }
        }

        let mut ordered: Vec<(&str, usize)> = freq.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let mut hints = Vec::new();
        for (rid, count) in ordered {
            if hints.len() >= MAX_HINTS {
                break;
            }
            let (rule, example) = matched[rid];
            let in_cooldown = last_shown
                .get(rid)
                .is_some_and(|shown| now.duration_since(*shown) < cooldown);
            if in_cooldown && !rule.severity().bypasses_cooldown() {
                continue;
            }
            hints.push(RankedHint {
                rule_id: rid.to_string(),
                severity: rule.severity(),
                text: render_hint(rule, example, count),
            });
        }
        hints
    }

    /// Detail text of rules that matched recent commands, for `/tip`
    /// prompt injection: gives the model expert context without inference.
    pub fn detail_context(&self, recent: &[CommandEvent], max_rules: usize) -> String {
        let mut seen: HashMap<&str, ()> = HashMap::new();
        let mut lines: Vec<String> = Vec::new();
        let window = recent.len().saturating_sub(15);

        'outer: for event in &recent[window..] {
            for rule in self.scan(&event.cmd) {
                if seen.contains_key(rule.id()) {
                    continue;
                }
                seen.insert(rule.id(), ());
                lines.push(format!(
                    "[{}] {}",
                    rule.severity().to_string().to_uppercase(),
                    rule.def.hint
                ));
                if !rule.def.detail.is_empty() {
                    lines.push(format!("  {}", rule.def.detail));
                }
                if seen.len() >= max_rules {
                    break 'outer;
                }
            }
        }
        lines.join("\n")
    }

    /// Linear scan over every rule, bypassing buckets. Used to verify that
    /// bucketing never changes scan semantics.
    #[doc(hidden)]
    pub fn scan_linear(&self, cmd: &str) -> Vec<&Rule> {
        let cmd = cmd.trim();
        if cmd.is_empty() {
            return Vec::new();
        }
        self.rules.iter().filter(|r| r.matches(cmd)).collect()
    }
}

/// Extract the token a command is bucketed under: the first word, skipping
/// privilege-elevation wrappers and leading `NAME=value` assignments.
fn lead_token(cmd: &str) -> Option<String> {
    let mut parts = cmd.split_whitespace();
    let first = parts.next()?;

    let mut token = first;
    if ELEVATION_WRAPPERS.contains(&token.to_lowercase().as_str()) {
        token = parts.next().unwrap_or(first);
    }
    // env var prefixes: 'CUDA_VISIBLE_DEVICES=0 python train.py'
    while token.contains('=') {
        token = parts.next()?;
    }
    Some(token.to_lowercase())
}

/// Render a ranked hint: severity prefix, match count, and the hint with
/// `{arg}` replaced by the example command's first argument.
fn render_hint(rule: &Rule, example: &str, count: usize) -> String {
    let arg: String = example
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim_start())
        .unwrap_or("")
        .chars()
        .take(ARG_BUDGET)
        .collect();
    let arg = if arg.is_empty() { "..." } else { &arg };
    let hint = rule.def.hint.replace("{arg}", arg);
    format!("{}[{}x] {}", rule.severity().prefix(), count, hint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shellbuddy_core::Severity;

    fn def(id: &str, pattern: &str, cmd: &str, severity: Severity, hint: &str) -> RuleDef {
        RuleDef {
            id: id.into(),
            pattern: pattern.into(),
            cmd: cmd.into(),
            severity,
            hint: hint.into(),
            detail: format!("detail for {id}"),
            tags: vec![],
        }
    }

    fn sample_corpus() -> Vec<RuleDef> {
        vec![
            def(
                "git-001",
                r"^git\s+push\s+.*--force\b",
                "git",
                Severity::Danger,
                "force push → --force-with-lease",
            ),
            def(
                "git-002",
                r"^git\s+log\b",
                "git",
                Severity::Upgrade,
                "git log → lazygit",
            ),
            def(
                "grep-001",
                r"^grep\s+",
                "grep",
                Severity::Upgrade,
                "grep → rg '{arg}'",
            ),
            def(
                "rm-001",
                r"^rm\s+-rf\s+/(\s|$)",
                "rm",
                Severity::Danger,
                "rm -rf / — destroys the filesystem",
            ),
            // no cmd field: token extracted from pattern
            def(
                "py-001",
                r"^python3?\s+-m\s+json",
                "",
                Severity::Tip,
                "python json → jq '.'",
            ),
            // declared cmd narrower than the pattern admits
            def(
                "pip-001",
                r"^pip3?\s+install\b",
                "pip",
                Severity::Tip,
                "pip install → uv pip install",
            ),
            // unbucketable: generic set
            def(
                "gen-001",
                r"\|\s*python3?\s+-m\s+json\.tool",
                "|",
                Severity::Tip,
                "pipe to jq instead",
            ),
        ]
    }

    fn cmds(texts: &[&str]) -> Vec<CommandEvent> {
        texts.iter().map(|t| CommandEvent::new(*t, "/tmp")).collect()
    }

    #[test]
    fn scan_routes_to_bucket() {
        let d = RuleDispatcher::load(sample_corpus());
        let hits = d.scan("git log --oneline");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), "git-002");
    }

    #[test]
    fn bucketed_scan_matches_linear_scan() {
        let d = RuleDispatcher::load(sample_corpus());
        let inputs = [
            "git push --force origin main",
            "git log",
            "grep TODO src/",
            "rm -rf /",
            "rm -rf /tmp/x",
            "python3 -m json.tool data.json",
            "python -m json.tool data.json",
            "pip install requests",
            "pip3 install requests",
            "curl https://x.dev | python3 -m json.tool",
            "sudo git log",
            "CUDA_VISIBLE_DEVICES=0 python3 -m json.tool x",
            "unmatched command",
            "",
        ];
        for cmd in inputs {
            let bucketed: Vec<&str> = d.scan(cmd).iter().map(|r| r.id()).collect();
            let mut linear: Vec<&str> = d.scan_linear(cmd).iter().map(|r| r.id()).collect();
            let mut sorted = bucketed.clone();
            sorted.sort_unstable();
            linear.sort_unstable();
            assert_eq!(sorted, linear, "bucket/linear divergence for: {cmd}");
        }
    }

    #[test]
    fn builtin_corpus_bucketing_matches_linear_scan() {
        let d = RuleDispatcher::load(crate::builtin::builtin_rules());
        let inputs = [
            "pip install requests",
            "pip3 install requests",
            "rm -rf /",
            "git push --force origin main",
            "htop",
            "top",
            "kill -9 4242",
            "grep TODO src/",
            "man tar",
        ];
        for cmd in inputs {
            let mut bucketed: Vec<&str> = d.scan(cmd).iter().map(|r| r.id()).collect();
            let mut linear: Vec<&str> = d.scan_linear(cmd).iter().map(|r| r.id()).collect();
            bucketed.sort_unstable();
            linear.sort_unstable();
            assert!(!linear.is_empty(), "expected a builtin match for: {cmd}");
            assert_eq!(bucketed, linear, "bucket/linear divergence for: {cmd}");
        }
    }

    #[test]
    fn sudo_resolves_to_wrapped_command() {
        assert_eq!(lead_token("sudo git commit -m \"x\""), Some("git".into()));
        assert_eq!(lead_token("doas rm -rf /tmp"), Some("rm".into()));
        assert_eq!(lead_token("sudo"), Some("sudo".into()));
    }

    #[test]
    fn env_assignments_are_skipped() {
        assert_eq!(
            lead_token("CUDA_VISIBLE_DEVICES=0 python3 train.py"),
            Some("python3".into())
        );
        assert_eq!(lead_token("A=1 B=2 make all"), Some("make".into()));
        assert_eq!(lead_token("A=1 B=2"), None);
    }

    #[test]
    fn wrapper_then_env_assignment_resolves_to_the_command() {
        assert_eq!(
            lead_token("sudo VAR=1 python train.py"),
            Some("python".into())
        );
    }

    #[test]
    fn duplicate_ids_and_patterns_are_skipped() {
        let mut corpus = sample_corpus();
        corpus.push(def("git-001", r"^git\s+blame", "git", Severity::Tip, "dup id"));
        corpus.push(def("git-099", r"^git\s+log\b", "git", Severity::Tip, "dup pattern"));
        let d = RuleDispatcher::load(corpus);
        assert_eq!(d.stats().total, 7);
        assert_eq!(d.stats().skipped, 2);
    }

    #[test]
    fn invalid_pattern_skipped_not_fatal() {
        let mut corpus = sample_corpus();
        corpus.push(def("bad-001", r"^git\s+(unclosed", "git", Severity::Tip, "bad"));
        let d = RuleDispatcher::load(corpus);
        assert_eq!(d.stats().skipped, 1);
        assert_eq!(d.stats().total, 7);
    }

    #[test]
    fn rank_orders_by_frequency() {
        let d = RuleDispatcher::load(sample_corpus());
        let recent = cmds(&["grep a x", "grep b y", "git log"]);
        let hints = d.rank_hints(&recent, &HashMap::new(), Duration::from_secs(120));
        assert_eq!(hints[0].rule_id, "grep-001");
        assert!(hints[0].text.contains("[2x]"));
        assert_eq!(hints[1].rule_id, "git-002");
    }

    #[test]
    fn arg_substitution_uses_latest_example() {
        let d = RuleDispatcher::load(sample_corpus());
        let recent = cmds(&["grep first x", "grep second y"]);
        let hints = d.rank_hints(&recent, &HashMap::new(), Duration::from_secs(120));
        assert!(hints[0].text.contains("rg 'second y'"), "{}", hints[0].text);
    }

    #[test]
    fn cooldown_suppresses_non_danger() {
        let d = RuleDispatcher::load(sample_corpus());
        let recent = cmds(&["git log"]);
        let mut last_shown = HashMap::new();
        last_shown.insert("git-002".to_string(), Instant::now());
        let hints = d.rank_hints(&recent, &last_shown, Duration::from_secs(120));
        assert!(hints.is_empty());
    }

    #[test]
    fn cooldown_elapses() {
        let d = RuleDispatcher::load(sample_corpus());
        let recent = cmds(&["git log"]);
        let mut last_shown = HashMap::new();
        last_shown.insert(
            "git-002".to_string(),
            Instant::now() - Duration::from_secs(300),
        );
        let hints = d.rank_hints(&recent, &last_shown, Duration::from_secs(120));
        assert_eq!(hints.len(), 1);
    }

    #[test]
    fn danger_bypasses_cooldown() {
        let d = RuleDispatcher::load(sample_corpus());
        let recent = cmds(&["rm -rf /"]);
        let mut last_shown = HashMap::new();
        last_shown.insert("rm-001".to_string(), Instant::now());
        let hints = d.rank_hints(&recent, &last_shown, Duration::from_secs(120));
        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].severity, Severity::Danger);
        assert!(hints[0].text.starts_with("!! "));
    }

    #[test]
    fn at_most_three_hints() {
        let mut corpus = Vec::new();
        for i in 0..6 {
            corpus.push(def(
                &format!("ls-{i:03}"),
                &format!(r"^ls.*{i}"),
                "ls",
                Severity::Tip,
                "x",
            ));
        }
        let d = RuleDispatcher::load(corpus);
        let recent = cmds(&["ls 012345"]);
        let hints = d.rank_hints(&recent, &HashMap::new(), Duration::from_secs(0));
        assert_eq!(hints.len(), 3);
    }

    #[test]
    fn detail_context_dedupes_rules() {
        let d = RuleDispatcher::load(sample_corpus());
        let recent = cmds(&["git log", "git log --stat", "grep x y"]);
        let ctx = d.detail_context(&recent, 3);
        assert_eq!(ctx.matches("lazygit").count(), 1);
        assert!(ctx.contains("[UPGRADE]"));
        assert!(ctx.contains("detail for git-002"));
    }

    #[test]
    fn load_file_skips_malformed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"[
              {"id":"a-001","pattern":"^ls\\b","cmd":"ls","severity":"tip","hint":"h"},
              {"id":"a-002","severity":"tip"},
              {"id":"a-003","pattern":"^du\\b","cmd":"du","severity":"nonsense","hint":"h"}
            ]"#,
        )
        .unwrap();
        let d = RuleDispatcher::load_file(&path).unwrap();
        assert_eq!(d.stats().total, 1);
        assert_eq!(d.stats().skipped, 2);
    }

    #[test]
    fn load_file_missing_is_error() {
        assert!(RuleDispatcher::load_file(Path::new("/nonexistent/kb.json")).is_err());
    }
}
