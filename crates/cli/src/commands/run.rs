//! `shellbuddy run`: Start the coaching daemon.

use shellbuddy_backends::build_from_config;
use shellbuddy_config::{AppConfig, Paths};
use shellbuddy_daemon::Orchestrator;
use shellbuddy_kb::{builtin_rules, RuleDispatcher};
use tracing::{info, warn};

pub async fn run(paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    paths.ensure()?;
    let config = AppConfig::load(&paths);

    // external corpus if present, builtin rules otherwise
    let dispatcher = if paths.kb().exists() {
        match RuleDispatcher::load_file(&paths.kb()) {
            Ok(d) => {
                let stats = d.stats();
                info!(
                    rules = stats.total,
                    buckets = stats.buckets,
                    skipped = stats.skipped,
                    "Loaded rule corpus"
                );
                d
            }
            Err(e) => {
                warn!(error = %e, "Failed to load rule corpus, using builtin rules");
                RuleDispatcher::load(builtin_rules())
            }
        }
    } else {
        info!("No rule corpus found, using builtin rules");
        RuleDispatcher::load(builtin_rules())
    };

    let mut router = build_from_config(&config, &paths);
    router.probe_all().await;

    let mut orchestrator = Orchestrator::new(config, paths, router, dispatcher);
    orchestrator.run().await?;
    Ok(())
}
