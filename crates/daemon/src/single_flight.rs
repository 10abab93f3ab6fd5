//! Single-flight task slots.
//!
//! Each background tier owns one slot: spawning into a busy slot is a
//! no-op, so at most one task per tier is ever in flight no matter how
//! many control-loop iterations pass while it runs.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::warn;

/// A bounded slot holding at most one in-flight background task.
pub struct TaskSlot<T> {
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> TaskSlot<T> {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Whether no task is currently in flight.
    pub fn is_idle(&self) -> bool {
        self.handle.is_none()
    }

    /// Spawn `fut` if the slot is idle. Returns false (and drops the
    /// future) when a task is already in flight.
    pub fn spawn<F>(&mut self, fut: F) -> bool
    where
        F: Future<Output = T> + Send + 'static,
    {
        if self.handle.is_some() {
            return false;
        }
        self.handle = Some(tokio::spawn(fut));
        true
    }

    /// Take the result of a finished task, if any.
    ///
    /// Never waits: an in-flight task stays in the slot and `None` is
    /// returned. A panicked task frees the slot and also yields `None`.
    pub async fn try_take(&mut self) -> Option<T> {
        let finished = self
            .handle
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(false);
        if !finished {
            return None;
        }
        let handle = self.handle.take()?;
        match handle.await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Background task failed");
                None
            }
        }
    }
}

impl<T: Send + 'static> Default for TaskSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn spawn_into_busy_slot_is_rejected() {
        let mut slot: TaskSlot<u32> = TaskSlot::new();
        assert!(slot.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            1
        }));
        assert!(!slot.is_idle());
        assert!(!slot.spawn(async { 2 }));
    }

    #[tokio::test]
    async fn try_take_returns_none_while_in_flight() {
        let mut slot: TaskSlot<u32> = TaskSlot::new();
        slot.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            1
        });
        assert_eq!(slot.try_take().await, None);
        assert!(!slot.is_idle());
    }

    #[tokio::test]
    async fn finished_task_yields_result_and_frees_slot() {
        let mut slot: TaskSlot<u32> = TaskSlot::new();
        slot.spawn(async { 7 });
        tokio::task::yield_now().await;
        // the spawned task completes almost immediately; poll until it lands
        let mut result = None;
        for _ in 0..100 {
            result = slot.try_take().await;
            if result.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(result, Some(7));
        assert!(slot.is_idle());
    }

    #[tokio::test]
    async fn panicked_task_frees_slot_without_result() {
        let mut slot: TaskSlot<u32> = TaskSlot::new();
        slot.spawn(async { panic!("boom") });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(slot.try_take().await, None);
        assert!(slot.is_idle());
    }
}
