use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use dashmap::DashMap;
use tokio::sync::{Mutex, watch};
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

use crate::config::{BotConfig, ConfigError};
use crate::constants::HEARTBEAT_CRON;
use crate::dispatch;
use crate::schedule::types::{FireRule, JobName, ReminderKind};
use crate::store::JsonStore;
use crate::transport::Transport;
use crate::utils::locale::day_name_en;

/// Error registering or resyncing scheduled jobs
#[derive(Debug)]
pub enum ScheduleError {
    Config(ConfigError),
    InvalidCron(JobName, cron::error::Error),
    NoUpcomingFire(JobName),
}

impl std::fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduleError::Config(err) => write!(f, "Schedule configuration error: {}", err),
            ScheduleError::InvalidCron(name, err) => {
                write!(f, "Invalid cron expression for job {}: {}", name, err)
            }
            ScheduleError::NoUpcomingFire(name) => {
                write!(f, "No upcoming fire time for job {}", name)
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

impl From<ConfigError> for ScheduleError {
    fn from(err: ConfigError) -> Self {
        ScheduleError::Config(err)
    }
}

/// A job registered under a fixed name
struct RegisteredJob {
    cron_expression: String,
    schedule: cron::Schedule,
}

struct RegistryInner {
    jobs: DashMap<JobName, RegisteredJob>,
    tz: RwLock<Tz>,
    reload_tx: watch::Sender<()>,
    resync_lock: Mutex<()>,
    runner_started: AtomicBool,
    store: Arc<JsonStore>,
    transport: Arc<dyn Transport>,
}

/// Long-lived cron-style scheduler holding at most one job per name
///
/// The job table is the only mutable shared state of the scheduling engine;
/// all mutation goes through `upsert`/`remove`/`resync`. One runner task
/// sleeps until the earliest upcoming job or a reload signal, whichever
/// comes first.
#[derive(Clone)]
pub struct JobRegistry {
    inner: Arc<RegistryInner>,
}

impl JobRegistry {
    pub fn new(store: Arc<JsonStore>, transport: Arc<dyn Transport>) -> Self {
        let (reload_tx, _) = watch::channel(());
        Self {
            inner: Arc::new(RegistryInner {
                jobs: DashMap::new(),
                tz: RwLock::new(chrono_tz::UTC),
                reload_tx,
                resync_lock: Mutex::new(()),
                runner_started: AtomicBool::new(false),
                store,
                transport,
            }),
        }
    }

    /// Timezone all fire rules are evaluated in
    pub fn timezone(&self) -> Tz {
        self.inner.timezone()
    }

    /// Start the runner, or reconfigure its timezone in place
    ///
    /// Idempotent: never spawns a second runner task and never duplicates
    /// the heartbeat job.
    pub fn start(&self, tz: Tz) {
        self.inner.set_timezone(tz);
        self.inner.ensure_heartbeat();

        if self
            .inner
            .runner_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move {
                inner.run_loop().await;
            });
        } else {
            // Already running; wake the runner so it re-reads the timezone
            self.inner.notify_reload();
        }
    }

    /// Register a job, atomically replacing any previous one with this name
    ///
    /// A firing already in flight completes; no new firing of the replaced
    /// rule occurs afterwards (the runner recomputes on the reload signal).
    pub fn upsert(&self, name: JobName, rule: &FireRule) -> Result<(), ScheduleError> {
        let cron_expression = rule.cron_expression();
        let schedule = cron::Schedule::from_str(&cron_expression)
            .map_err(|e| ScheduleError::InvalidCron(name, e))?;
        self.inner.jobs.insert(
            name,
            RegisteredJob {
                cron_expression: cron_expression.clone(),
                schedule,
            },
        );
        self.inner.notify_reload();
        info!("Registered job {} with cron '{}'", name, cron_expression);
        Ok(())
    }

    /// Remove a job; removing a non-existent job is not an error
    pub fn remove(&self, name: JobName) {
        if self.inner.jobs.remove(&name).is_some() {
            info!("Removed job {}", name);
            self.inner.notify_reload();
        }
    }

    /// Recompute both reminder rules from the configuration and replace the
    /// named jobs, then make sure the runner is started
    ///
    /// Serialized with respect to itself; safe to call on every admin edit
    /// without leaking jobs or timers. Errors surface to the caller so the
    /// admin knows the schedule change did not take effect.
    pub async fn resync(&self, config: &BotConfig) -> Result<(), ScheduleError> {
        let _guard = self.inner.resync_lock.lock().await;

        let spec = config.schedule_spec()?;
        self.upsert(JobName::DayReminder, &spec.day_rule)?;
        self.upsert(JobName::PreEventReminder, &spec.pre_event_rule)?;
        self.start(spec.tz);

        info!(
            "Scheduler resynced: day reminder {} {}, pre-event reminder {} {} ({})",
            day_name_en(spec.day_rule.day),
            spec.day_rule.time_hhmm(),
            day_name_en(spec.pre_event_rule.day),
            spec.pre_event_rule.time_hhmm(),
            spec.tz
        );
        Ok(())
    }

    /// Earliest upcoming (job, fire instant) strictly after `now`
    pub(crate) fn next_job_after(&self, now: DateTime<Utc>) -> Option<(JobName, DateTime<Tz>)> {
        self.inner.next_job_after(now)
    }

    /// Next fire instant of one named job, strictly after `now`
    pub(crate) fn job_next_fire(&self, name: JobName, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        let local = now.with_timezone(&self.inner.timezone());
        self.inner
            .jobs
            .get(&name)
            .and_then(|job| job.schedule.after(&local).next())
    }

    #[cfg(test)]
    pub(crate) fn cron_expression_of(&self, name: JobName) -> Option<String> {
        self.inner
            .jobs
            .get(&name)
            .map(|job| job.cron_expression.clone())
    }

    #[cfg(test)]
    pub(crate) fn job_count(&self) -> usize {
        self.inner.jobs.len()
    }
}

impl RegistryInner {
    fn timezone(&self) -> Tz {
        *self.tz.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_timezone(&self, tz: Tz) {
        *self.tz.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = tz;
    }

    fn notify_reload(&self) {
        self.reload_tx.send_replace(());
    }

    /// Register the liveness heartbeat once per process lifetime
    fn ensure_heartbeat(&self) {
        if self.jobs.contains_key(&JobName::Heartbeat) {
            return;
        }
        match cron::Schedule::from_str(HEARTBEAT_CRON) {
            Ok(schedule) => {
                self.jobs.insert(
                    JobName::Heartbeat,
                    RegisteredJob {
                        cron_expression: HEARTBEAT_CRON.to_string(),
                        schedule,
                    },
                );
            }
            Err(e) => warn!("Failed to register heartbeat job: {}", e),
        }
    }

    fn next_job_after(&self, now: DateTime<Utc>) -> Option<(JobName, DateTime<Tz>)> {
        let local = now.with_timezone(&self.timezone());
        self.jobs
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .schedule
                    .after(&local)
                    .next()
                    .map(|when| (*entry.key(), when))
            })
            .min_by_key(|(_, when)| *when)
    }

    /// Runner task: sleep until the earliest job fires or the table changes
    async fn run_loop(self: Arc<Self>) {
        let mut reload_rx = self.reload_tx.subscribe();
        info!("Job runner started");

        loop {
            match self.next_job_after(Utc::now()) {
                Some((name, fire_at)) => {
                    let wait = (fire_at.with_timezone(&Utc) - Utc::now())
                        .to_std()
                        .unwrap_or(Duration::ZERO);
                    info!(
                        "Next job {} fires at {} (in {} minutes)",
                        name,
                        fire_at,
                        wait.as_secs() / 60
                    );

                    tokio::select! {
                        _ = sleep(wait) => {
                            self.run_job(name).await;
                        }
                        result = reload_rx.changed() => {
                            if result.is_err() {
                                break;
                            }
                            info!("Reload signal received, recomputing job schedule");
                        }
                    }
                }
                None => {
                    info!("No jobs registered, waiting for configuration...");
                    if reload_rx.changed().await.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Job runner stopped");
    }

    /// Fire one job; failures are contained so the runner and the other
    /// jobs keep going
    async fn run_job(&self, name: JobName) {
        // The job may have been removed while we slept
        if !self.jobs.contains_key(&name) {
            return;
        }
        match name {
            JobName::DayReminder => {
                dispatch::send_reminder_to_all(ReminderKind::Day, &self.store, self.transport.as_ref())
                    .await;
            }
            JobName::PreEventReminder => {
                dispatch::send_reminder_to_all(
                    ReminderKind::PreEvent,
                    &self.store,
                    self.transport.as_ref(),
                )
                .await;
            }
            JobName::Heartbeat => {
                info!("[heartbeat] Bot worker alive");
            }
        }
    }
}
