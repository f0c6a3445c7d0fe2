// ── Poll timers ──
//
// Each poll concern (sensors, functions, alarms) runs on its own timer
// task with its own cancellation token chained off the session token.
// Stopping a timer cancels the token and awaits the task so an in-flight
// pass always runs to completion; pass failures never kill the timer.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Handle to a running poll timer.
#[derive(Debug)]
pub struct TimerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Stop the timer, letting any in-flight pass finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "poll timer task failed to join");
        }
    }
}

/// Spawn a periodic poll task. The first tick fires after one full
/// `period`; callers run an initial pass themselves before spawning.
pub fn spawn_interval<F, Fut>(
    name: &'static str,
    period: Duration,
    parent: &CancellationToken,
    mut tick: F,
) -> TimerHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), CoreError>> + Send,
{
    let cancel = parent.child_token();
    let task_cancel = cancel.clone();
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // interval fires immediately on first tick; consume it so the
        // first real pass lands one period from now.
        interval.tick().await;
        loop {
            tokio::select! {
                biased;
                () = task_cancel.cancelled() => {
                    debug!(timer = name, "poll timer stopped");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = tick().await {
                        warn!(timer = name, error = %e, "poll pass failed");
                    }
                }
            }
        }
    });
    TimerHandle { cancel, task }
}

/// The session's three poll timers. `None` means not running.
#[derive(Debug, Default)]
pub struct Timers {
    pub sensors: Option<TimerHandle>,
    pub functions: Option<TimerHandle>,
    pub alarms: Option<TimerHandle>,
}

impl Timers {
    pub async fn shutdown_all(&mut self) {
        for handle in [
            self.sensors.take(),
            self.functions.take(),
            self.alarms.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.shutdown().await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_full_period() {
        let ticks = Arc::new(AtomicU32::new(0));
        let parent = CancellationToken::new();
        let handle = {
            let ticks = Arc::clone(&ticks);
            spawn_interval("test", Duration::from_secs(10), &parent, move || {
                let ticks = Arc::clone(&ticks);
                async move {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        };

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn tick_failures_keep_the_timer_alive() {
        let ticks = Arc::new(AtomicU32::new(0));
        let parent = CancellationToken::new();
        let handle = {
            let ticks = Arc::clone(&ticks);
            spawn_interval("test", Duration::from_secs(1), &parent, move || {
                let ticks = Arc::clone(&ticks);
                async move {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    Err(CoreError::Internal("boom".into()))
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_the_timer() {
        let ticks = Arc::new(AtomicU32::new(0));
        let parent = CancellationToken::new();
        let handle = {
            let ticks = Arc::clone(&ticks);
            spawn_interval("test", Duration::from_secs(1), &parent, move || {
                let ticks = Arc::clone(&ticks);
                async move {
                    ticks.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(1500)).await;
        parent.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        // Already cancelled; shutdown just joins.
        handle.shutdown().await;
    }
}
