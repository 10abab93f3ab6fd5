//! `shellbuddy scan`: Match one command against the rule corpus.
//!
//! A debugging surface for rule authors: shows every rule the dispatcher
//! would fire for the given command text.

use shellbuddy_config::Paths;
use shellbuddy_kb::{builtin_rules, RuleDispatcher};

pub fn run(paths: Paths, command: String) -> Result<(), Box<dyn std::error::Error>> {
    let command = command.trim().to_string();
    if command.is_empty() {
        return Err("usage: shellbuddy scan \"git push --force\"".into());
    }

    let dispatcher = if paths.kb().exists() {
        RuleDispatcher::load_file(&paths.kb())?
    } else {
        RuleDispatcher::load(builtin_rules())
    };

    let matches = dispatcher.scan(&command);
    if matches.is_empty() {
        println!("no rules match: {command}");
        return Ok(());
    }

    println!("{} rule(s) match: {command}", matches.len());
    for rule in matches {
        println!(
            "  {}{}  [{}]",
            rule.severity().prefix(),
            rule.def.hint,
            rule.id()
        );
        if !rule.def.detail.is_empty() {
            println!("      {}", rule.def.detail);
        }
    }
    Ok(())
}
