//! Wall-clock job scheduler driven by an external polling loop.
//!
//! Nothing runs on its own: the owner calls [`PeriodicScheduler::tick`]
//! repeatedly and every due job runs to completion inside that call.

use async_trait::async_trait;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use std::{fmt, future::Future};

use crate::error::SchedulerError;

/// Source of local wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Zero-argument action run by the scheduler.
#[async_trait]
pub trait Job: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> Job for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn run(&self) -> anyhow::Result<()> {
        (self)().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily(NaiveTime),
    Hourly,
    /// Every N minutes, N >= 1.
    Interval(u32),
}

impl Cadence {
    fn period(&self) -> Duration {
        match self {
            Cadence::Daily(_) => Duration::days(1),
            Cadence::Hourly => Duration::hours(1),
            Cadence::Interval(minutes) => Duration::minutes(i64::from(*minutes)),
        }
    }

    /// First due time for a job registered at `now`.
    pub fn first_due(&self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            Cadence::Daily(at) => {
                let today = now.date().and_time(*at);
                if today > now { today } else { today + Duration::days(1) }
            }
            Cadence::Hourly | Cadence::Interval(_) => now + self.period(),
        }
    }

    /// Advance `due` by whole periods until it lies after `now`.
    pub fn next_due(&self, due: NaiveDateTime, now: NaiveDateTime) -> NaiveDateTime {
        let period = self.period();
        let mut next = due + period;
        if next <= now {
            let behind = (now - next).num_seconds() / period.num_seconds() + 1;
            next += period * i32::try_from(behind).unwrap_or(i32::MAX);
        }
        next
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Daily(at) => write!(f, "daily at {}", at.format("%H:%M")),
            Cadence::Hourly => f.write_str("hourly"),
            Cadence::Interval(1) => f.write_str("every minute"),
            Cadence::Interval(minutes) => write!(f, "every {minutes} minutes"),
        }
    }
}

/// Parse "HH:MM" (or "HH:MM:SS") as a local time of day.
pub fn parse_time_of_day(value: &str) -> Result<NaiveTime, SchedulerError> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| SchedulerError::InvalidTime(value.to_string()))
}

struct ScheduledJob {
    cadence: Cadence,
    job: Box<dyn Job>,
    next_due: NaiveDateTime,
}

pub struct PeriodicScheduler<C: Clock = SystemClock> {
    clock: C,
    jobs: Vec<ScheduledJob>,
}

impl PeriodicScheduler<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for PeriodicScheduler<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> PeriodicScheduler<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock, jobs: Vec::new() }
    }

    pub fn schedule_daily(&mut self, job: impl Job + 'static, at: &str) -> Result<(), SchedulerError> {
        let at = parse_time_of_day(at)?;
        self.register(Cadence::Daily(at), Box::new(job));
        Ok(())
    }

    pub fn schedule_hourly(&mut self, job: impl Job + 'static) {
        self.register(Cadence::Hourly, Box::new(job));
    }

    pub fn schedule_interval(
        &mut self,
        job: impl Job + 'static,
        minutes: u32,
    ) -> Result<(), SchedulerError> {
        if minutes == 0 {
            return Err(SchedulerError::InvalidInterval);
        }
        self.register(Cadence::Interval(minutes), Box::new(job));
        Ok(())
    }

    fn register(&mut self, cadence: Cadence, job: Box<dyn Job>) {
        let next_due = cadence.first_due(self.clock.now());
        tracing::info!(%cadence, %next_due, "job scheduled");
        self.jobs.push(ScheduledJob { cadence, job, next_due });
    }

    /// Run every job whose due time has passed, in registration order.
    ///
    /// Job failures are logged and swallowed. Returns how many jobs ran.
    pub async fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let mut ran = 0;

        for (index, scheduled) in self.jobs.iter_mut().enumerate() {
            if now < scheduled.next_due {
                continue;
            }

            tracing::debug!(job = index, cadence = %scheduled.cadence, "running job");
            if let Err(err) = scheduled.job.run().await {
                tracing::error!(job = index, cadence = %scheduled.cadence, error = ?err, "scheduled job failed");
            }
            ran += 1;

            scheduled.next_due = scheduled.cadence.next_due(scheduled.next_due, self.clock.now());
            tracing::debug!(job = index, next_due = %scheduled.next_due, "job rescheduled");
        }

        ran
    }

    /// Earliest upcoming due time across all jobs.
    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.jobs.iter().map(|j| j.next_due).min()
    }

    pub fn jobs(&self) -> impl Iterator<Item = (Cadence, NaiveDateTime)> + '_ {
        self.jobs.iter().map(|j| (j.cadence, j.next_due))
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl<C: Clock> fmt::Debug for PeriodicScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicScheduler")
            .field("clock", &self.clock)
            .field("jobs", &self.jobs().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug, Clone)]
    struct ManualClock(Arc<Mutex<NaiveDateTime>>);

    impl ManualClock {
        fn at(h: u32, m: u32) -> Self {
            Self(Arc::new(Mutex::new(dt(14, h, m))))
        }

        fn set(&self, t: NaiveDateTime) {
            *self.0.lock().unwrap() = t;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    fn dt(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    struct CountingJob(Arc<AtomicUsize>);

    #[async_trait]
    impl Job for CountingJob {
        async fn run(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingJob(Arc<AtomicUsize>);

    #[async_trait]
    impl Job for FailingJob {
        async fn run(&self) -> anyhow::Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("provider exploded")
        }
    }

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    #[test]
    fn daily_due_rolls_to_tomorrow_when_passed() {
        let at = parse_time_of_day("08:00").unwrap();
        assert_eq!(Cadence::Daily(at).first_due(dt(14, 9, 0)), dt(15, 8, 0));
        assert_eq!(Cadence::Daily(at).first_due(dt(14, 7, 0)), dt(14, 8, 0));
        assert_eq!(Cadence::Daily(at).first_due(dt(14, 8, 0)), dt(15, 8, 0));
    }

    #[test]
    fn hourly_and_interval_start_one_period_out() {
        assert_eq!(Cadence::Hourly.first_due(dt(14, 9, 10)), dt(14, 10, 10));
        assert_eq!(Cadence::Interval(15).first_due(dt(14, 9, 10)), dt(14, 9, 25));
    }

    #[test]
    fn next_due_skips_missed_periods() {
        let cadence = Cadence::Interval(10);
        assert_eq!(cadence.next_due(dt(14, 9, 0), dt(14, 9, 0)), dt(14, 9, 10));
        assert_eq!(cadence.next_due(dt(14, 9, 0), dt(14, 9, 35)), dt(14, 9, 40));
        assert_eq!(cadence.next_due(dt(14, 9, 0), dt(14, 9, 40)), dt(14, 9, 50));
    }

    #[test]
    fn parse_time_of_day_accepts_and_rejects() {
        assert_eq!(parse_time_of_day("08:00").unwrap(), NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(
            parse_time_of_day("17:45:30").unwrap(),
            NaiveTime::from_hms_opt(17, 45, 30).unwrap()
        );
        assert_eq!(
            parse_time_of_day("24:61"),
            Err(SchedulerError::InvalidTime("24:61".into()))
        );
        assert!(parse_time_of_day("noon").is_err());
    }

    #[test]
    fn zero_minute_interval_is_rejected() {
        let mut scheduler = PeriodicScheduler::with_clock(ManualClock::at(9, 0));
        let err = scheduler.schedule_interval(CountingJob(counter()), 0).unwrap_err();
        assert_eq!(err, SchedulerError::InvalidInterval);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn invalid_daily_time_is_rejected() {
        let mut scheduler = PeriodicScheduler::with_clock(ManualClock::at(9, 0));
        assert!(scheduler.schedule_daily(CountingJob(counter()), "8am").is_err());
        assert!(scheduler.is_empty());
    }

    #[tokio::test]
    async fn tick_when_nothing_due_changes_nothing() {
        let clock = ManualClock::at(9, 0);
        let count = counter();
        let mut scheduler = PeriodicScheduler::with_clock(clock.clone());
        scheduler.schedule_daily(CountingJob(count.clone()), "08:00").unwrap();
        scheduler.schedule_interval(CountingJob(count.clone()), 30).unwrap();

        let before: Vec<_> = scheduler.jobs().collect();
        clock.set(dt(14, 9, 29));

        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.jobs().collect::<Vec<_>>(), before);
    }

    #[tokio::test]
    async fn daily_job_runs_once_then_waits_for_tomorrow() {
        let clock = ManualClock::at(7, 0);
        let count = counter();
        let mut scheduler = PeriodicScheduler::with_clock(clock.clone());
        scheduler.schedule_daily(CountingJob(count.clone()), "08:00").unwrap();
        assert_eq!(scheduler.next_run(), Some(dt(14, 8, 0)));

        clock.set(dt(14, 8, 0));
        assert_eq!(scheduler.tick().await, 1);
        assert_eq!(scheduler.next_run(), Some(dt(15, 8, 0)));

        clock.set(dt(14, 8, 1));
        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_job_does_not_stop_others() {
        let clock = ManualClock::at(9, 0);
        let failures = counter();
        let successes = counter();
        let mut scheduler = PeriodicScheduler::with_clock(clock.clone());
        scheduler.schedule_hourly(FailingJob(failures.clone()));
        scheduler.schedule_hourly(CountingJob(successes.clone()));

        clock.set(dt(14, 10, 0));
        assert_eq!(scheduler.tick().await, 2);

        clock.set(dt(14, 11, 0));
        assert_eq!(scheduler.tick().await, 2);

        assert_eq!(failures.load(Ordering::SeqCst), 2);
        assert_eq!(successes.load(Ordering::SeqCst), 2);
        assert_eq!(scheduler.next_run(), Some(dt(14, 12, 0)));
    }

    #[tokio::test]
    async fn late_tick_runs_once_without_catch_up() {
        let clock = ManualClock::at(9, 0);
        let count = counter();
        let mut scheduler = PeriodicScheduler::with_clock(clock.clone());
        scheduler.schedule_interval(CountingJob(count.clone()), 5).unwrap();

        clock.set(dt(14, 9, 22));
        assert_eq!(scheduler.tick().await, 1);
        assert_eq!(scheduler.tick().await, 0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.next_run(), Some(dt(14, 9, 25)));
    }

    #[tokio::test]
    async fn closures_are_jobs() {
        let clock = ManualClock::at(9, 0);
        let count = counter();
        let mut scheduler = PeriodicScheduler::with_clock(clock.clone());

        let c = count.clone();
        scheduler
            .schedule_interval(
                move || {
                    let c = c.clone();
                    async move {
                        c.fetch_add(1, Ordering::SeqCst);
                        Ok::<(), anyhow::Error>(())
                    }
                },
                1,
            )
            .unwrap();

        clock.set(dt(14, 9, 1));
        scheduler.tick().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cadence_display() {
        let at = parse_time_of_day("06:30").unwrap();
        assert_eq!(Cadence::Daily(at).to_string(), "daily at 06:30");
        assert_eq!(Cadence::Hourly.to_string(), "hourly");
        assert_eq!(Cadence::Interval(1).to_string(), "every minute");
        assert_eq!(Cadence::Interval(20).to_string(), "every 20 minutes");
    }
}
