use crate::connection::{cancel::CancelToken, manager::Internal};

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, instrument};

/// Periodic keep-alive driver for one connection.
///
/// The loop posts a tick to the connection manager every interval and exits
/// as soon as its attempt's token is cancelled.
#[derive(Debug, Default)]
pub(crate) struct HeartbeatScheduler {
    task: Option<JoinHandle<()>>,
}

impl HeartbeatScheduler {
    pub(crate) fn start(
        &mut self,
        epoch: u64,
        interval: Duration,
        cancel: CancelToken,
        ticks: mpsc::UnboundedSender<Internal>,
    ) {
        self.stop();
        self.task = Some(tokio::spawn(run_heartbeat(epoch, interval, cancel, ticks)));
    }

    pub(crate) fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for HeartbeatScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[instrument(skip(cancel, ticks))]
async fn run_heartbeat(
    epoch: u64,
    period: Duration,
    mut cancel: CancelToken,
    ticks: mpsc::UnboundedSender<Internal>,
) {
    let start = tokio::time::Instant::now() + period;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if cancel.is_cancelled() || ticks.send(Internal::HeartbeatTick { epoch }).is_err() {
                    break;
                }
            }
        }
    }

    debug!("Heartbeat loop stopped");
}
