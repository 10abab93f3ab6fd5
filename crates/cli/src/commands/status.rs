//! `shellbuddy status`: Show config, paths, and backend availability.

use shellbuddy_backends::build_from_config;
use shellbuddy_config::{AppConfig, Paths};
use shellbuddy_kb::{builtin_rules, RuleDispatcher};

pub async fn run(paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(&paths);

    println!("shellbuddy status");
    println!("=================");
    println!("  Data dir:     {}", paths.data_dir().display());
    println!("  Hint tier:    {} / {}", config.hint_backend, config.hint_model);
    println!("  Tip tier:     {} / {}", config.tip_backend, config.tip_model);
    println!(
        "  Advisor:      {} / {}",
        config.advisor_backend, config.advisor_model
    );
    println!(
        "  Post-mortem:  {} / {}",
        config.post_mortem_backend, config.post_mortem_model
    );

    let running = std::fs::read_to_string(paths.pid_file()).ok();
    match running {
        Some(pid) => println!("  Daemon:       running (PID {})", pid.trim()),
        None => println!("  Daemon:       not running"),
    }

    let dispatcher = if paths.kb().exists() {
        RuleDispatcher::load_file(&paths.kb())?
    } else {
        RuleDispatcher::load(builtin_rules())
    };
    let stats = dispatcher.stats();
    println!(
        "  Rules:        {} in {} buckets ({} generic, {} skipped)",
        stats.total, stats.buckets, stats.generic, stats.skipped
    );

    println!("\n  Probing backends ...");
    let mut router = build_from_config(&config, &paths);
    router.probe_all().await;
    for name in router.names() {
        let mark = if router.is_available(name) { "ok " } else { "-- " };
        println!("  {mark}{name}");
    }

    Ok(())
}
