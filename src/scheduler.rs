//! Auto-skip: periodically move on to the next track while enabled.

use std::{future::pending, pin::Pin, time::Duration};

use futures::{
    future::LocalBoxFuture,
    stream::{FuturesUnordered, StreamExt as _},
};
use tokio::{
    select,
    time::{interval_at, sleep, Instant, Interval, MissedTickBehavior, Sleep},
};
use tracing::{debug, info, warn};

use crate::{
    error::{ErrorKind, ServiceError},
    output::Transition,
    service::PlaybackService,
    utils::one_shot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSkipConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for AutoSkipConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(30),
        }
    }
}

/// Something the event loop has to react to.
#[derive(Debug)]
pub enum SchedulerEvent {
    Fire,
    SkipDone(Result<(), ServiceError>),
    RefreshDue,
}

async fn fire(timer: &mut Option<Interval>) {
    match timer.as_mut() {
        Some(timer) => {
            timer.tick().await;
        }
        None => pending().await,
    }
}

async fn skip_completion(skips: &mut SkipsInFlight) -> Result<(), ServiceError> {
    match skips.next().await {
        Some(result) => result,
        None => pending().await,
    }
}

type SkipsInFlight = FuturesUnordered<LocalBoxFuture<'static, Result<(), ServiceError>>>;

pub struct AutoSkipScheduler {
    config: AutoSkipConfig,
    /// How long after an acknowledged skip to refresh the status
    refresh_delay: Duration,
    /// Exists exactly while enabled
    timer: Option<Interval>,
    skips: SkipsInFlight,
    forced_refresh: Option<Pin<Box<Sleep>>>,
}

impl AutoSkipScheduler {
    #[must_use]
    pub fn new(interval: Duration, refresh_delay: Duration) -> Self {
        Self {
            config: AutoSkipConfig {
                enabled: false,
                interval,
            },
            refresh_delay,
            timer: None,
            skips: FuturesUnordered::new(),
            forced_refresh: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> AutoSkipConfig {
        self.config
    }

    #[cfg(test)]
    pub const fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Flip between enabled and disabled. Disabling drops the timer at once.
    pub fn toggle(&mut self) -> Transition {
        self.config.enabled = !self.config.enabled;
        if self.config.enabled {
            let period = self.config.interval;
            let mut timer = interval_at(Instant::now() + period, period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            self.timer = Some(timer);
            info!(?period, "Auto-skip enabled");
            Transition::AutoSkipEnabled
        } else {
            self.timer = None;
            info!("Auto-skip disabled");
            Transition::AutoSkipDisabled
        }
    }

    /// Wait for whatever happens next: a timer fire, a skip answer, or the early refresh.
    ///
    /// Cancel safe. Pends forever while disabled with nothing outstanding.
    pub async fn next_event(&mut self) -> SchedulerEvent {
        select! {
            () = fire(&mut self.timer) => SchedulerEvent::Fire,
            result = skip_completion(&mut self.skips) => SchedulerEvent::SkipDone(result),
            () = one_shot(&mut self.forced_refresh) => SchedulerEvent::RefreshDue,
        }
    }

    /// Handle a timer fire. Returns whether a skip command went out.
    pub fn on_fire(&mut self, service: &impl PlaybackService, track_id: Option<&str>) -> bool {
        let Some(track_id) = track_id else {
            debug!("Auto-skip fired with nothing playing");
            return false;
        };
        info!(%track_id, "Auto-skipping");
        self.skips.push(service.skip_next());
        true
    }

    /// An acknowledged skip schedules one early status refresh; a failed one is only logged.
    pub fn on_skip_result(&mut self, result: Result<(), ServiceError>) {
        match result {
            Ok(()) => {
                debug!(delay = ?self.refresh_delay, "Skip acknowledged, refreshing early");
                self.forced_refresh = Some(Box::pin(sleep(self.refresh_delay)));
            }
            Err(e) => warn!(%e, kind = ?ErrorKind::SkipFailed, "Failed to skip song"),
        }
    }

    /// Drop the timer, the early refresh and any skips still in flight.
    pub fn shutdown(&mut self) {
        self.timer = None;
        self.forced_refresh = None;
        self.skips.clear();
    }
}
