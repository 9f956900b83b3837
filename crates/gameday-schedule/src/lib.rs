//! Automatic registration opening for Gameday.
//!
//! Schedule slots ([`GameEvent`]) carry a `registration_start`. A
//! background [`AutoOpener`] wakes up on a fixed interval, finds the
//! slots whose registration window has started, and asks a
//! [`RegistrationOpener`] to open them. The opener is the service layer;
//! it routes the request through the competition's own command queue, so
//! a timer-driven opening never races a manual admin action.
//!
//! # Integration
//!
//! ```ignore
//! let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
//! let opener = Arc::new(AutoOpener::new(schedule, service, AutoOpenConfig::default()));
//! tokio::spawn(Arc::clone(&opener).run(stop_rx));
//! // ...
//! stop_tx.send(true)?;
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use gameday_core::GameEvent;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing of the auto-open loop.
#[derive(Debug, Clone)]
pub struct AutoOpenConfig {
    /// Time between two checks of the schedule.
    pub interval: Duration,
    /// Random delay (0–max) before the *first* check, so several
    /// processes started together do not all hit the chat at once.
    pub initial_jitter: Duration,
}

impl Default for AutoOpenConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            initial_jitter: Duration::from_millis(2_000),
        }
    }
}

impl AutoOpenConfig {
    /// Shortest interval accepted; anything below is raised to it.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Fixes out-of-range values so the config is safe to use.
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            warn!(
                interval_ms = self.interval.as_millis() as u64,
                "auto-open interval too short, raising to 1s"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self
    }

    fn jitter(&self) -> Duration {
        let max = self.initial_jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::rng().random_range(0..max))
    }
}

// ---------------------------------------------------------------------------
// Opener
// ---------------------------------------------------------------------------

/// Whoever can actually open a registration.
pub trait RegistrationOpener: Send + Sync + 'static {
    type Error: std::fmt::Display + Send;

    /// Opens the registration for `event`'s competition.
    ///
    /// Returns `Ok(false)` when there was nothing to open, e.g. because
    /// an admin already opened or cancelled the game.
    fn open_registration(
        &self,
        event: &GameEvent,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send;
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// The upcoming game slots, ordered by date.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    events: Vec<GameEvent>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot. Returns `false` if a slot with the same key exists.
    pub fn add(&mut self, event: GameEvent) -> bool {
        let key = event.key();
        if self.events.iter().any(|e| e.key() == key) {
            return false;
        }
        let at = self.events.partition_point(|e| e.date <= event.date);
        self.events.insert(at, event);
        true
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Slots whose automatic opening should fire at `now`.
    pub fn due(&self, now: NaiveDateTime) -> Vec<&GameEvent> {
        self.events.iter().filter(|e| e.is_due(now)).collect()
    }

    /// Marks every due slot as opened and returns copies of them.
    fn take_due(&mut self, now: NaiveDateTime) -> Vec<GameEvent> {
        self.events
            .iter_mut()
            .filter(|e| e.is_due(now))
            .map(|e| {
                e.opened = true;
                e.clone()
            })
            .collect()
    }

    /// The `skip`-th valid game still ahead of `now` (0 = the next one).
    pub fn next_game(&self, skip: usize, now: NaiveDateTime) -> Option<&GameEvent> {
        self.events
            .iter()
            .filter(|e| e.valid && e.date > now)
            .nth(skip)
    }

    /// Drops slots dated before `now`. Returns how many were dropped.
    pub fn prune(&mut self, now: NaiveDateTime) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.date >= now);
        before - self.events.len()
    }
}

// ---------------------------------------------------------------------------
// AutoOpener
// ---------------------------------------------------------------------------

/// Periodically opens registrations whose window has started.
///
/// One opener per process. The schedule sits behind a mutex that is
/// never held across an `.await`, so admins can add slots while the
/// loop runs.
pub struct AutoOpener<O: RegistrationOpener> {
    config: AutoOpenConfig,
    schedule: Mutex<Schedule>,
    opener: Arc<O>,
    /// Set while a pass is running; a second pass started meanwhile
    /// returns immediately.
    running: AtomicBool,
}

impl<O: RegistrationOpener> AutoOpener<O> {
    pub fn new(schedule: Schedule, opener: Arc<O>, config: AutoOpenConfig) -> Self {
        Self {
            config: config.validated(),
            schedule: Mutex::new(schedule),
            opener,
            running: AtomicBool::new(false),
        }
    }

    /// Adds a slot to the schedule.
    pub fn add(&self, event: GameEvent) -> bool {
        lock(&self.schedule).add(event)
    }

    /// A copy of the current schedule.
    pub fn schedule(&self) -> Schedule {
        lock(&self.schedule).clone()
    }

    pub fn config(&self) -> &AutoOpenConfig {
        &self.config
    }

    /// Runs one pass: opens every slot due at `now`.
    ///
    /// Each slot is marked opened before the opener is asked, so a slot
    /// is requested at most once even if the request fails. Returns the
    /// number of registrations actually opened.
    pub async fn run_once(&self, now: NaiveDateTime) -> usize {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("auto-open pass already running, skipping");
            return 0;
        }
        let _guard = RunningGuard(&self.running);

        let due = {
            let mut schedule = lock(&self.schedule);
            let due = schedule.take_due(now);
            let pruned = schedule.prune(now);
            if pruned > 0 {
                trace!(pruned, "past slots dropped");
            }
            due
        };

        let mut opened = 0;
        for event in &due {
            match self.opener.open_registration(event).await {
                Ok(true) => {
                    opened += 1;
                    info!(slot = %event.key(), "registration opened by schedule");
                }
                Ok(false) => debug!(slot = %event.key(), "nothing to open"),
                Err(e) => warn!(slot = %event.key(), error = %e, "automatic opening failed"),
            }
        }
        opened
    }

    /// Runs passes on the configured interval until `shutdown` turns
    /// `true` or its sender is dropped.
    ///
    /// A pass that is under way always finishes; shutdown is only
    /// observed between passes.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let jitter = self.config.jitter();
        debug!(
            interval_s = self.config.interval.as_secs(),
            jitter_ms = jitter.as_millis() as u64,
            "auto-open loop started"
        );

        let mut ticker = time::interval_at(time::Instant::now() + jitter, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let opened = self.run_once(gameday_core::local_now()).await;
                    trace!(opened, "auto-open pass finished");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("auto-open loop stopped");
    }
}

struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
