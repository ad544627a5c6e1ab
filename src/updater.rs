use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{RecvTimeoutError, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::source::{Clock, RuleSource, SystemClock};
use crate::store::RuleStore;
use crate::version::VersionNumber;

const REFRESH_THREAD_NAME: &str = "uadetect-refresh";
const TIMER_THREAD_NAME: &str = "uadetect-timer";

/// Refresh scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    /// Time between two version checks.
    pub interval: Duration,
    /// Lower bound accepted for `interval`.
    pub minimum_interval: Duration,
    /// Also check on a background timer, not only when classifying.
    pub background_timer: bool,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            minimum_interval: Duration::from_secs(1),
            background_timer: false,
        }
    }
}

impl UpdaterConfig {
    pub fn validate(&self) -> Result<()> {
        check_interval(self.interval, self.minimum_interval)
    }
}

fn check_interval(interval: Duration, minimum: Duration) -> Result<()> {
    if interval < minimum {
        return Err(Error::InvalidConfiguration(format!(
            "refresh interval {interval:?} is below the minimum of {minimum:?}"
        )));
    }
    Ok(())
}

/// How one refresh attempt ended.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// A newer rule set was published.
    Updated { from: String, to: String },
    /// The source offered nothing newer than the current rules.
    UpToDate,
    /// Another attempt was already running; this trigger was folded into it.
    Coalesced,
    /// Shut down before the attempt could publish.
    Abandoned,
    /// The source failed; the current rules stay in place.
    Failed(Error),
}

impl RefreshOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}

struct Schedule {
    interval: Duration,
    minimum_interval: Duration,
    last_check: Option<Instant>,
}

impl Schedule {
    fn is_stale(&self, now: Instant) -> bool {
        match self.last_check {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }
}

struct Shared {
    store: Arc<RuleStore>,
    source: Arc<dyn RuleSource>,
    clock: Arc<dyn Clock>,
    schedule: Mutex<Schedule>,
    in_flight: AtomicBool,
    shut_down: AtomicBool,
}

/// Releases the in-flight flag when the attempt ends, including by panic.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Shared {
    /// Claim the single refresh slot and stamp the check time.
    ///
    /// The lazy path (`require_stale`) never waits for the schedule lock: a
    /// contended lock means another caller is already claiming or checking.
    fn try_claim(&self, require_stale: bool) -> bool {
        if self.shut_down.load(Ordering::Acquire) {
            return false;
        }
        let now = self.clock.now();
        let mut schedule = if require_stale {
            match self.schedule.try_lock() {
                Some(schedule) => schedule,
                None => return false,
            }
        } else {
            self.schedule.lock()
        };
        if require_stale && !schedule.is_stale(now) {
            return false;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        schedule.last_check = Some(now);
        true
    }

    fn maybe_refresh(self: &Arc<Self>) -> bool {
        if !self.try_claim(true) {
            return false;
        }
        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(REFRESH_THREAD_NAME.into())
            .spawn(move || {
                shared.run_claimed();
            });
        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn refresh thread");
            self.in_flight.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Run an attempt whose slot has already been claimed.
    fn run_claimed(&self) -> RefreshOutcome {
        let _guard = InFlight(&self.in_flight);
        let outcome = self.check_for_update();
        match &outcome {
            RefreshOutcome::Updated { from, to } => info!(%from, %to, "rules updated"),
            RefreshOutcome::UpToDate => debug!("rules up to date"),
            RefreshOutcome::Abandoned => debug!("refresh abandoned after shutdown"),
            RefreshOutcome::Failed(err) => warn!(error = %err, "rule refresh failed"),
            RefreshOutcome::Coalesced => {}
        }
        outcome
    }

    fn check_for_update(&self) -> RefreshOutcome {
        let current = self.store.current();
        let candidate = match self.source.fetch_version() {
            Ok(version) => version,
            Err(err) => return RefreshOutcome::Failed(err),
        };
        if VersionNumber::parse(&candidate) <= *current.version_number() {
            return RefreshOutcome::UpToDate;
        }
        let rules = match self.source.fetch_rule_set() {
            Ok(rules) => Arc::new(rules),
            Err(err) => return RefreshOutcome::Failed(err),
        };
        if self.shut_down.load(Ordering::Acquire) {
            return RefreshOutcome::Abandoned;
        }
        if self.store.publish_if_newer(Arc::clone(&rules)) {
            RefreshOutcome::Updated {
                from: current.version().to_string(),
                to: rules.version().to_string(),
            }
        } else {
            RefreshOutcome::UpToDate
        }
    }
}

/// Keeps a [`RuleStore`] current by polling a [`RuleSource`].
///
/// Checks are triggered lazily through [`Updater::maybe_refresh`] and,
/// optionally, by a timer thread. At most one attempt runs at a time and
/// concurrent triggers collapse onto it. Failures never reach the callers
/// that triggered them; the previous rules stay published.
pub struct Updater {
    shared: Arc<Shared>,
    timer: Mutex<Option<Sender<()>>>,
}

impl Updater {
    pub fn new(
        store: Arc<RuleStore>,
        source: Arc<dyn RuleSource>,
        config: UpdaterConfig,
    ) -> Result<Self> {
        Self::with_clock(store, source, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        store: Arc<RuleStore>,
        source: Arc<dyn RuleSource>,
        clock: Arc<dyn Clock>,
        config: UpdaterConfig,
    ) -> Result<Self> {
        config.validate()?;
        let shared = Arc::new(Shared {
            store,
            source,
            clock,
            schedule: Mutex::new(Schedule {
                interval: config.interval,
                minimum_interval: config.minimum_interval,
                last_check: None,
            }),
            in_flight: AtomicBool::new(false),
            shut_down: AtomicBool::new(false),
        });
        let timer = if config.background_timer {
            Some(spawn_timer(Arc::clone(&shared))?)
        } else {
            None
        };
        Ok(Self {
            shared,
            timer: Mutex::new(timer),
        })
    }

    /// Start a background check if the rules are stale and none is running.
    /// Returns immediately; `true` means this call started an attempt.
    pub fn maybe_refresh(&self) -> bool {
        self.shared.maybe_refresh()
    }

    /// Run a check on the calling thread, ignoring staleness.
    pub fn refresh_now(&self) -> RefreshOutcome {
        if self.shared.shut_down.load(Ordering::Acquire) {
            return RefreshOutcome::Abandoned;
        }
        if !self.shared.try_claim(false) {
            return RefreshOutcome::Coalesced;
        }
        self.shared.run_claimed()
    }

    /// Change the interval used from the next check on.
    pub fn set_interval(&self, interval: Duration) -> Result<()> {
        let mut schedule = self.shared.schedule.lock();
        check_interval(interval, schedule.minimum_interval)?;
        schedule.interval = interval;
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        self.shared.schedule.lock().interval
    }

    pub fn minimum_interval(&self) -> Duration {
        self.shared.schedule.lock().minimum_interval
    }

    /// When the last attempt was started, if any.
    pub fn last_update_check(&self) -> Option<Instant> {
        self.shared.schedule.lock().last_check
    }

    pub fn is_refreshing(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shut_down.load(Ordering::Acquire)
    }

    pub fn store(&self) -> &Arc<RuleStore> {
        &self.shared.store
    }

    /// Stop all further refresh activity without waiting for a running
    /// attempt; that attempt will not publish.
    pub fn shutdown(&self) {
        if !self.shared.shut_down.swap(true, Ordering::AcqRel) {
            debug!("updater shut down");
        }
        // Dropping the sender wakes the timer thread, which then exits.
        self.timer.lock().take();
    }
}

impl Drop for Updater {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Updater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updater")
            .field("interval", &self.interval())
            .field("last_update_check", &self.last_update_check())
            .field("refreshing", &self.is_refreshing())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

fn spawn_timer(shared: Arc<Shared>) -> Result<Sender<()>> {
    let (tx, rx) = crossbeam_channel::bounded::<()>(0);
    thread::Builder::new()
        .name(TIMER_THREAD_NAME.into())
        .spawn(move || loop {
            let interval = shared.schedule.lock().interval;
            match rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {
                    shared.maybe_refresh();
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        })?;
    Ok(tx)
}
