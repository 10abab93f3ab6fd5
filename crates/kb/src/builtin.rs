//! Built-in fallback rules, used when no `kb.json` corpus is installed.
//!
//! A trimmed-down set covering the classic modern-tool upgrades plus the
//! footguns that must never go unwarned. The generated corpus supersedes
//! these the moment it exists.

use shellbuddy_core::Severity;

use crate::rule::RuleDef;

struct BuiltinRule {
    id: &'static str,
    pattern: &'static str,
    cmd: &'static str,
    severity: Severity,
    hint: &'static str,
    detail: &'static str,
}

const BUILTIN: &[BuiltinRule] = &[
    // Footguns first
    BuiltinRule {
        id: "builtin-rm-root",
        pattern: r"^rm\s+-[a-zA-Z]*r[a-zA-Z]*f[a-zA-Z]*\s+/(\s|$)",
        cmd: "rm",
        severity: Severity::Danger,
        hint: "rm -rf / destroys the filesystem — stop",
        detail: "Recursive force-remove of the root deletes everything the user can write. \
                 Modern coreutils require --no-preserve-root, but bind mounts and older \
                 systems offer no such protection.",
    },
    BuiltinRule {
        id: "builtin-git-force-push",
        pattern: r"^git\s+push\s+.*--force\b",
        cmd: "git",
        severity: Severity::Danger,
        hint: "--force overwrites remote history — use --force-with-lease",
        detail: "--force-with-lease refuses to push if the remote moved since your last \
                 fetch, so you cannot silently discard a colleague's commits.",
    },
    BuiltinRule {
        id: "builtin-chmod-777",
        pattern: r"^chmod\s+(-R\s+)?777\b",
        cmd: "chmod",
        severity: Severity::Danger,
        hint: "chmod 777 makes files world-writable — use 755/644",
        detail: "World-writable files are an immediate local privilege-escalation vector. \
                 Directories usually want 755, files 644; use group perms for sharing.",
    },
    BuiltinRule {
        id: "builtin-kill-9",
        pattern: r"^kill\s+-9\s+",
        cmd: "kill",
        severity: Severity::Warn,
        hint: "kill -9 skips cleanup — try kill -TERM first",
        detail: "SIGKILL cannot be caught, so the process gets no chance to flush buffers, \
                 remove lock files, or close sockets. SIGTERM first, SIGKILL as last resort.",
    },
    BuiltinRule {
        id: "builtin-rm-rf",
        pattern: r"^rm\s+-rf\s+",
        cmd: "rm",
        severity: Severity::Warn,
        hint: "rm -rf → trash {arg}  (recoverable)",
        detail: "trash-cli moves files to the freedesktop trash instead of unlinking, \
                 so a mistyped glob is recoverable.",
    },
    // Modern-tool upgrades
    BuiltinRule {
        id: "builtin-cat",
        pattern: r"^cat\s+",
        cmd: "cat",
        severity: Severity::Upgrade,
        hint: "cat → bat {arg}  (syntax highlighting + git diff)",
        detail: "bat adds syntax highlighting, git modification markers, and paging; \
                 bat -p gives plain output for piping.",
    },
    BuiltinRule {
        id: "builtin-ls",
        pattern: r"^ls\b",
        cmd: "ls",
        severity: Severity::Upgrade,
        hint: "ls → eza -la --git --icons",
        detail: "eza shows git status per file, tree view with -T, and relative \
                 timestamps with --time-style=relative.",
    },
    BuiltinRule {
        id: "builtin-grep",
        pattern: r"^grep\s+",
        cmd: "grep",
        severity: Severity::Upgrade,
        hint: "grep → rg '{arg}'  (10x faster, .gitignore aware)",
        detail: "ripgrep recurses by default, skips .gitignore'd and binary files, \
                 and is typically an order of magnitude faster than grep -r.",
    },
    BuiltinRule {
        id: "builtin-find",
        pattern: r"^find\s+",
        cmd: "find",
        severity: Severity::Upgrade,
        hint: "find → fd '{arg}'  (simpler syntax, auto .gitignore)",
        detail: "fd uses intuitive pattern-first syntax, respects .gitignore, and runs \
                 parallel directory traversal.",
    },
    BuiltinRule {
        id: "builtin-du",
        pattern: r"^du\s+",
        cmd: "du",
        severity: Severity::Upgrade,
        hint: "du → dust  (visual tree, human-readable)",
        detail: "dust renders a sorted usage tree with percentages, no flag memorizing.",
    },
    BuiltinRule {
        id: "builtin-top",
        pattern: r"^top\b",
        cmd: "top",
        severity: Severity::Upgrade,
        hint: "top → btm  (vim keys, multiple panels)",
        detail: "bottom combines process, CPU, memory, network, and disk panels with \
                 vim-style navigation and mouse support.",
    },
    BuiltinRule {
        id: "builtin-htop",
        pattern: r"^htop\b",
        cmd: "htop",
        severity: Severity::Upgrade,
        hint: "htop → btm  (vim keys, more panels)",
        detail: "bottom combines process, CPU, memory, network, and disk panels with \
                 vim-style navigation and mouse support.",
    },
    BuiltinRule {
        id: "builtin-curl-json",
        pattern: r"^curl\s+.*json",
        cmd: "curl",
        severity: Severity::Tip,
        hint: "curl + json → http {arg}  (httpie: auto-format)",
        detail: "httpie pretty-prints JSON responses and colorizes output by default; \
                 curl needs a jq pipe for the same result.",
    },
    BuiltinRule {
        id: "builtin-git-log",
        pattern: r"^git\s+log\b",
        cmd: "git",
        severity: Severity::Upgrade,
        hint: "git log → lazygit  (TUI: full log, diff, branch)",
        detail: "lazygit shows the commit graph, per-commit diffs, and branch \
                 operations in one TUI; space stages hunks interactively.",
    },
    BuiltinRule {
        id: "builtin-git-checkout",
        pattern: r"^git\s+checkout\b",
        cmd: "git",
        severity: Severity::Tip,
        hint: "git checkout → git switch / git restore",
        detail: "checkout overloads branch switching and file restoration; switch and \
                 restore split those concerns and refuse ambiguous invocations.",
    },
    BuiltinRule {
        id: "builtin-pip-install",
        pattern: r"^pip3?\s+install\b",
        cmd: "pip",
        severity: Severity::Upgrade,
        hint: "pip install → uv pip install {arg}  (10x faster)",
        detail: "uv resolves and installs with a Rust resolver and global cache, \
                 typically 10-100x faster than pip with identical semantics.",
    },
    BuiltinRule {
        id: "builtin-docker-ps",
        pattern: r"^docker\s+ps\b",
        cmd: "docker",
        severity: Severity::Upgrade,
        hint: "docker ps → lazydocker  (full TUI)",
        detail: "lazydocker shows containers, live logs, stats, and compose projects \
                 in one TUI pane set.",
    },
    BuiltinRule {
        id: "builtin-kubectl-get",
        pattern: r"^kubectl\s+get\b",
        cmd: "kubectl",
        severity: Severity::Upgrade,
        hint: "kubectl get → k9s  (live TUI, press : to filter)",
        detail: "k9s live-watches resources, tails pod logs with l, and opens shells \
                 with s — no flag juggling.",
    },
    BuiltinRule {
        id: "builtin-man",
        pattern: r"^man\s+",
        cmd: "man",
        severity: Severity::Upgrade,
        hint: "man → tldr {arg}  (example-first man pages)",
        detail: "tldr pages lead with the handful of invocations people actually use, \
                 with placeholders highlighted.",
    },
];

/// The compiled-in fallback corpus.
pub fn builtin_rules() -> Vec<RuleDef> {
    BUILTIN
        .iter()
        .map(|r| RuleDef {
            id: r.id.into(),
            pattern: r.pattern.into(),
            cmd: r.cmd.into(),
            severity: r.severity,
            hint: r.hint.into(),
            detail: r.detail.into(),
            tags: vec!["builtin".into()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::RuleDispatcher;

    #[test]
    fn builtins_all_compile() {
        let d = RuleDispatcher::load(builtin_rules());
        assert_eq!(d.stats().skipped, 0);
        assert_eq!(d.stats().total, BUILTIN.len());
    }

    #[test]
    fn rm_rf_root_is_danger() {
        let d = RuleDispatcher::load(builtin_rules());
        let hits = d.scan("rm -rf /");
        assert!(
            hits.iter()
                .any(|r| r.severity() == shellbuddy_core::Severity::Danger)
        );
    }

    #[test]
    fn rm_rf_tmp_is_not_root_danger() {
        let d = RuleDispatcher::load(builtin_rules());
        let hits = d.scan("rm -rf /tmp/build");
        assert!(hits.iter().all(|r| r.id() != "builtin-rm-root"));
        assert!(hits.iter().any(|r| r.id() == "builtin-rm-rf"));
    }

    #[test]
    fn hints_fit_render_budget() {
        for def in builtin_rules() {
            assert!(def.hint.len() <= 72, "hint too long: {}", def.id);
        }
    }
}
