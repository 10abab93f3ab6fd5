//! The orchestrator: one control loop coordinating all tiers.
//!
//! Each iteration services the expert trigger first, then (on the slower
//! hint cadence) tails the command log, runs the reflex tier, gates the
//! background tiers into their single-flight slots, and renders the
//! panel. The loop itself never awaits a network call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use shellbuddy_backends::BackendRouter;
use shellbuddy_config::{AppConfig, Paths};
use shellbuddy_context::ContextLog;
use shellbuddy_core::ContextPayload;
use shellbuddy_kb::{RankedHint, RuleDispatcher};
use tracing::{info, warn};

use crate::cmd_log::{self, LogSnapshot};
use crate::output;
use crate::session::SessionState;
use crate::single_flight::TaskSlot;
use crate::tiers;

pub struct Orchestrator {
    config: Arc<AppConfig>,
    paths: Paths,
    router: Arc<BackendRouter>,
    dispatcher: Arc<RuleDispatcher>,
    log: Arc<ContextLog>,
    state: SessionState,
    last_hint_check: Option<Instant>,
    last_rule_hints: Vec<RankedHint>,
    ambient_slot: TaskSlot<Option<String>>,
    advisor_slot: TaskSlot<()>,
    expert_slot: TaskSlot<()>,
    post_mortem_slot: TaskSlot<()>,
}

impl Orchestrator {
    pub fn new(
        config: AppConfig,
        paths: Paths,
        router: BackendRouter,
        dispatcher: RuleDispatcher,
    ) -> Self {
        let log = ContextLog::open(paths.context_log(), config.context_max_entries);
        Self {
            config: Arc::new(config),
            paths,
            router: Arc::new(router),
            dispatcher: Arc::new(dispatcher),
            log: Arc::new(log),
            state: SessionState::new(),
            last_hint_check: None,
            last_rule_hints: Vec::new(),
            ambient_slot: TaskSlot::new(),
            advisor_slot: TaskSlot::new(),
            expert_slot: TaskSlot::new(),
            post_mortem_slot: TaskSlot::new(),
        }
    }

    /// Run until interrupted. Writes the pid file on entry and removes it
    /// on the way out.
    pub async fn run(&mut self) -> shellbuddy_core::Result<()> {
        self.paths
            .ensure()
            .map_err(|e| shellbuddy_core::Error::Internal(e.to_string()))?;
        if let Err(e) = std::fs::write(self.paths.pid_file(), std::process::id().to_string()) {
            warn!(error = %e, "Failed to write pid file");
        }
        info!(
            pid = std::process::id(),
            hint_backend = %self.config.hint_backend,
            tip_backend = %self.config.tip_backend,
            "Daemon started"
        );

        let poll = Duration::from_secs(self.config.poll_interval_secs.max(1));
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                _ = tokio::time::sleep(poll) => self.tick().await,
            }
        }

        let _ = std::fs::remove_file(self.paths.pid_file());
        info!("Daemon stopped");
        Ok(())
    }

    /// One control-loop iteration.
    pub async fn tick(&mut self) {
        // expert trigger has priority on every poll
        let _ = self.expert_slot.try_take().await;
        self.service_expert_trigger();

        // a finished ambient call updates the panel without a rescan
        if let Some(result) = self.ambient_slot.try_take().await {
            if let Some(text) = result {
                self.state.last_ambient_text = text;
            }
            self.render(self.state.last_cmd_count, &self.state.last_cwd.clone());
        }
        let _ = self.advisor_slot.try_take().await;
        let _ = self.post_mortem_slot.try_take().await;

        // hint generation runs on the slower cadence
        let hint_interval = Duration::from_secs(self.config.hint_interval_secs);
        if self
            .last_hint_check
            .is_some_and(|t| t.elapsed() < hint_interval)
        {
            return;
        }
        self.last_hint_check = Some(Instant::now());

        let Some(snapshot) = cmd_log::read_tail(&self.paths.cmd_log(), self.config.window) else {
            return;
        };
        let cwd = snapshot.cwd().unwrap_or("").to_string();

        let has_new = self.state.has_new_activity(snapshot.total);
        let cwd_changed = !cwd.is_empty() && self.state.cwd_changed(&cwd);
        if (!has_new && !cwd_changed) || snapshot.recent.len() < self.config.min_commands {
            return;
        }

        self.record_new_commands(&snapshot).await;

        // reflex, synchronous on the control path
        self.last_rule_hints = tiers::reflex::run(
            &self.dispatcher,
            &self.log,
            &mut self.state,
            &snapshot.recent,
            Duration::from_secs(self.config.rule_cooldown_secs),
        )
        .await;

        self.maybe_spawn_advisor(&snapshot);
        self.maybe_spawn_post_mortem(&snapshot);
        self.maybe_spawn_ambient(&snapshot, &cwd, has_new || cwd_changed);

        self.render(snapshot.total, &cwd);
        self.state.last_cmd_count = snapshot.total;
        self.state.last_cwd = cwd;
    }

    /// Append commands that arrived since the last processed poll.
    async fn record_new_commands(&mut self, snapshot: &LogSnapshot) {
        let new = snapshot.total.saturating_sub(self.state.last_cmd_count);
        let skip = snapshot.recent.len().saturating_sub(new);
        for event in &snapshot.recent[skip..] {
            let entry = ContextPayload::Cmd {
                cmd: event.cmd.clone(),
                cwd: event.cwd.clone(),
            };
            if let Err(e) = self.log.append(entry).await {
                warn!(error = %e, "Failed to log command");
            }
        }
    }

    fn service_expert_trigger(&mut self) {
        if !self.expert_slot.is_idle() {
            return;
        }
        let Some(query) = tiers::expert::take_query(&self.paths.tip_query()) else {
            return;
        };
        let recent = cmd_log::read_tail(&self.paths.cmd_log(), self.config.window)
            .map(|s| s.recent)
            .unwrap_or_default();
        self.expert_slot.spawn(tiers::expert::answer(
            self.router.clone(),
            self.log.clone(),
            self.dispatcher.clone(),
            self.config.tip_backend.clone(),
            self.config.tip_model.clone(),
            recent,
            query,
            self.paths.tip_result(),
        ));
    }

    fn maybe_spawn_advisor(&mut self, snapshot: &LogSnapshot) {
        let interval = Duration::from_secs(self.config.advisor_interval_secs);
        if !self.advisor_slot.is_idle() || !self.state.advisor_ready(snapshot.total, interval) {
            return;
        }
        self.advisor_slot.spawn(tiers::advisor::call(
            self.router.clone(),
            self.log.clone(),
            self.config.advisor_backend.clone(),
            self.config.advisor_model.clone(),
            snapshot.recent.clone(),
        ));
        self.state.last_advisor_run = Some(Instant::now());
        self.state.advisor_seen_count = snapshot.total;
    }

    fn maybe_spawn_post_mortem(&mut self, snapshot: &LogSnapshot) {
        let is_commit = snapshot
            .recent
            .last()
            .is_some_and(|c| crate::prompts::is_commit_command(&c.cmd));
        if !is_commit
            || !self.post_mortem_slot.is_idle()
            || self.state.post_mortem_fired_at == snapshot.total
        {
            return;
        }
        self.post_mortem_slot.spawn(tiers::post_mortem::call(
            self.router.clone(),
            self.log.clone(),
            self.config.post_mortem_backend.clone(),
            self.config.post_mortem_model.clone(),
            snapshot.recent.clone(),
            self.paths.post_mortem(),
        ));
        self.state.post_mortem_fired_at = snapshot.total;
    }

    fn maybe_spawn_ambient(&mut self, snapshot: &LogSnapshot, cwd: &str, activity: bool) {
        let throttle = Duration::from_secs(self.config.ai_throttle_secs);
        if !activity || !self.ambient_slot.is_idle() || !self.state.ambient_ready(throttle) {
            return;
        }
        self.ambient_slot.spawn(tiers::ambient::call(
            self.router.clone(),
            self.log.clone(),
            self.config.hint_backend.clone(),
            self.config.hint_chain(),
            snapshot.recent.clone(),
            cwd.to_string(),
        ));
        self.state.last_ambient_call = Some(Instant::now());
    }

    fn render(&self, cmd_count: usize, cwd: &str) {
        let thinking = !self.ambient_slot.is_idle();
        let panel = output::render_panel(
            &self.last_rule_hints,
            &self.state.last_ambient_text,
            cwd,
            cmd_count,
            thinking,
            self.config.max_hint_lines,
        );
        if let Err(e) = output::write_panel(&self.paths.hints_out(), &panel) {
            warn!(error = %e, "Failed to write hint panel");
        }
    }
}
