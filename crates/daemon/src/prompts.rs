//! Prompt construction for the model-backed tiers.
//!
//! Backends are pure transports, so all prompt text lives here. The
//! wording is tuned for small local models: strict line budgets, no
//! markdown, explicit "output only" framing.

use std::path::Path;

use shellbuddy_core::CommandEvent;

/// Directory contents that identify the project type.
const PROJECT_INDICATORS: &[(&str, &str)] = &[
    ("pyproject.toml", "Python"),
    ("requirements.txt", "Python"),
    ("setup.py", "Python"),
    ("package.json", "Node.js"),
    ("Cargo.toml", "Rust"),
    ("go.mod", "Go"),
    ("Gemfile", "Ruby"),
    ("Makefile", "Make"),
    ("justfile", "just"),
    ("docker-compose.yml", "Docker"),
    ("Dockerfile", "Docker"),
    (".git", "git repo"),
];

/// Describe the project type from directory contents, e.g.
/// "Rust, git repo". Falls back to "general".
pub fn project_context(cwd: &Path) -> String {
    let mut signals: Vec<&str> = Vec::new();
    for &(indicator, lang) in PROJECT_INDICATORS {
        if cwd.join(indicator).exists() && !signals.contains(&lang) {
            signals.push(lang);
        }
    }
    if signals.is_empty() {
        "general".to_string()
    } else {
        signals.join(", ")
    }
}

/// Infer what the user is trying to do from their last few commands.
pub fn detect_intent(recent: &[CommandEvent]) -> Option<&'static str> {
    let window = recent.len().saturating_sub(6);
    let texts: Vec<&str> = recent[window..].iter().map(|c| c.cmd.as_str()).collect();
    let joined = texts.join(" ").to_lowercase();

    if ["git add", "git commit", "git push", "git diff"]
        .iter()
        .any(|w| joined.contains(w))
    {
        return Some("committing/pushing code");
    }
    if ["pytest", "npm test", "cargo test", "go test"]
        .iter()
        .any(|w| joined.contains(w))
    {
        return Some("running tests");
    }
    if ["docker", "compose", "kubectl"].iter().any(|w| joined.contains(w)) {
        return Some("working with containers/infra");
    }
    if ["pip install", "conda install", "npm install", "brew install"]
        .iter()
        .any(|w| joined.contains(w))
    {
        return Some("installing dependencies");
    }
    if ["ssh", "scp", "rsync"].iter().any(|w| joined.contains(w)) {
        return Some("working with remote servers");
    }
    if ["vim", "nano", "code", "edit"].iter().any(|w| joined.contains(w)) {
        return Some("editing files");
    }
    if let Some(last) = texts.last() {
        if texts.iter().filter(|t| *t == last).count() >= 2 {
            return Some("retrying a failing command");
        }
    }
    None
}

fn command_summary(recent: &[CommandEvent], n: usize) -> String {
    let window = recent.len().saturating_sub(n);
    recent[window..]
        .iter()
        .map(|c| format!("  {}  {}", c.ts.format("%H:%M:%S"), c.cmd))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ambient-hint prompt: 2-3 one-line suggestions from the recent window.
pub fn ambient_prompt(recent: &[CommandEvent], cwd: &str) -> String {
    let project = project_context(Path::new(cwd));
    let summary = command_summary(recent, 10);

    let mut prompt = format!(
        "You are an ambient terminal coach. A developer is working in their shell.\n\
         Analyse their recent commands, understand what they're trying to do, \
         and give 2-3 SPECIFIC, actionable hints to help them work faster.\n\n\
         Directory: {cwd}\n\
         Project: {project}\n"
    );
    if let Some(intent) = detect_intent(recent) {
        prompt.push_str(&format!("They appear to be: {intent}\n"));
    }
    prompt.push_str(&format!(
        "Recent commands (oldest to newest):\n{summary}\n\n\
         Rules:\n\
         - Each hint on ONE line, max 70 chars\n\
         - Use exact paths/filenames from their commands\n\
         - Prioritise: faster alternatives, missing flags, common mistakes\n\
         - If they're retrying something, suggest what might fix it\n\
         - No bullets, no markdown, no greetings\n\
         - Max 5 lines total\n\
         - If workflow looks fine: Good flow, keep going\n"
    ));
    prompt
}

/// Expert-tier prompt for an on-demand query, enriched with session
/// context and the detail text of recently matched rules.
pub fn tip_prompt(
    query: &str,
    recent: &[CommandEvent],
    session_context: &str,
    rule_detail: &str,
) -> String {
    let cwd = recent
        .last()
        .map(|c| c.cwd.as_str())
        .filter(|c| !c.is_empty())
        .unwrap_or("~");

    let mut prompt = format!(
        "You are a senior terminal/CLI expert. Think carefully about the question, \
         then give a precise, practical answer.\n\n\
         Environment: zsh\n\
         Working directory: {cwd}\n"
    );
    let recent_ctx = command_summary(recent, 5);
    if !recent_ctx.is_empty() {
        prompt.push_str(&format!("Recent commands (for context):\n{recent_ctx}\n"));
    }
    if !session_context.is_empty() {
        prompt.push_str(&format!("Session so far:\n{session_context}"));
    }
    if !rule_detail.is_empty() {
        prompt.push_str(&format!("Relevant tool notes:\n{rule_detail}\n"));
    }
    prompt.push_str(&format!(
        "\nRules:\n\
         - Give the exact command(s) first, then a brief explanation\n\
         - For multi-step tasks, number the steps\n\
         - Show common flags and variations when relevant\n\
         - If the question relates to the recent commands above, use that context\n\
         - Max 15 lines total\n\
         - No markdown formatting, no code fences\n\n\
         Question: {query}\n"
    ));
    prompt
}

/// Advisor prompt: exactly three lines (intent, observation, prediction).
pub fn advisor_prompt(recent: &[CommandEvent], session_context: &str) -> String {
    let summary = command_summary(recent, recent.len());
    format!(
        "You are quietly observing a developer's shell session. Form an opinion.\n\n\
         Session log:\n{session_context}\n\
         Recent commands (oldest to newest):\n{summary}\n\n\
         Output EXACTLY three lines, nothing else:\n\
         line 1: what they are trying to do (their intent)\n\
         line 2: one risk or pattern you notice\n\
         line 3: what they will most likely do next\n\
         No labels, no bullets, no markdown. Each line under 70 chars.\n"
    )
}

/// Post-mortem prompt: a commit message draft from the session narrative.
pub fn post_mortem_prompt(recent: &[CommandEvent], session_context: &str) -> String {
    let summary = command_summary(recent, 20);
    format!(
        "A developer just committed. Draft a commit message from their session.\n\n\
         Session log:\n{session_context}\n\
         Commands leading to the commit (oldest to newest):\n{summary}\n\n\
         Output:\n\
         line 1: imperative subject line, max 50 chars\n\
         then optionally: one blank line and a short body (max 4 lines)\n\
         No markdown, no quotes around the message.\n"
    )
}

/// Whether a command is a commit, the post-mortem trigger.
pub fn is_commit_command(cmd: &str) -> bool {
    let trimmed = cmd.trim_start();
    trimmed.starts_with("git commit") || trimmed.starts_with("gc ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(cmd: &str) -> CommandEvent {
        CommandEvent::new(cmd, "/home/u/proj")
    }

    #[test]
    fn project_context_reads_directory_markers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert_eq!(project_context(dir.path()), "Rust, git repo");
    }

    #[test]
    fn project_context_defaults_to_general() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(project_context(dir.path()), "general");
    }

    #[test]
    fn intent_detects_committing() {
        let recent = vec![ev("git add -A"), ev("git commit -m 'x'")];
        assert_eq!(detect_intent(&recent), Some("committing/pushing code"));
    }

    #[test]
    fn intent_detects_retry_loop() {
        let recent = vec![ev("make build"), ev("make build")];
        assert_eq!(detect_intent(&recent), Some("retrying a failing command"));
    }

    #[test]
    fn intent_is_none_for_mixed_browsing() {
        let recent = vec![ev("ls"), ev("pwd")];
        assert_eq!(detect_intent(&recent), None);
    }

    #[test]
    fn ambient_prompt_includes_commands_and_intent() {
        let recent = vec![ev("cargo test"), ev("cargo test")];
        let prompt = ambient_prompt(&recent, "/home/u/proj");
        assert!(prompt.contains("cargo test"));
        assert!(prompt.contains("They appear to be: running tests"));
        assert!(prompt.contains("Max 5 lines total"));
    }

    #[test]
    fn tip_prompt_ends_with_the_question() {
        let recent = vec![ev("tar xf data.tar.gz")];
        let prompt = tip_prompt("how do I list a tar", &recent, "", "");
        assert!(prompt.trim_end().ends_with("Question: how do I list a tar"));
        assert!(prompt.contains("tar xf data.tar.gz"));
    }

    #[test]
    fn advisor_prompt_requests_three_lines() {
        let prompt = advisor_prompt(&[ev("git push")], "[10:00:00] $ git push\n");
        assert!(prompt.contains("EXACTLY three lines"));
    }

    #[test]
    fn commit_detection() {
        assert!(is_commit_command("git commit -m 'fix'"));
        assert!(is_commit_command("  git commit"));
        assert!(!is_commit_command("git log"));
        assert!(!is_commit_command("echo git commit"));
    }
}
