//! Drives simulated users: spawn, start the session, then loop over weighted
//! tasks until the iteration budget or the run time is used up.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::time::Instant;

use crate::error::TaskError;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Weighted<T> {
    pub task: T,
    pub weight: u32,
}

impl<T> Weighted<T> {
    pub const fn new(task: T, weight: u32) -> Self {
        Self { task, weight }
    }
}

/// One kind of simulated user.
#[async_trait]
pub trait User: Send + 'static {
    type Task: Copy + fmt::Debug + Send + Sync + 'static;

    const NAME: &'static str;

    fn tasks() -> &'static [Weighted<Self::Task>];

    /// Runs once before the first task. An error stops this user.
    async fn on_start(&mut self) -> Result<(), TaskError> {
        Ok(())
    }

    async fn perform(&mut self, task: Self::Task) -> Result<(), TaskError>;
}

pub struct TaskSet<T> {
    tasks: Vec<T>,
    index: WeightedIndex<u32>,
}

impl<T: Copy> TaskSet<T> {
    pub fn new(weighted: &[Weighted<T>]) -> Result<Self, WeightedError> {
        let index = WeightedIndex::new(weighted.iter().map(|w| w.weight))?;
        Ok(Self {
            tasks: weighted.iter().map(|w| w.task).collect(),
            index,
        })
    }

    #[inline]
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.tasks[self.index.sample(rng)]
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub users: usize,
    /// Tasks per user.
    pub iterations: Option<u64>,
    pub run_time: Option<Duration>,
    /// Users started per second, all at once when unset.
    pub spawn_rate: Option<f64>,
    /// Pause after each task.
    pub wait: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            users: 1,
            iterations: Some(100),
            run_time: None,
            spawn_rate: None,
            wait: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub users_started: usize,
    pub users_failed: usize,
    pub tasks_ok: u64,
    pub task_failures: BTreeMap<String, u64>,
}

impl RunSummary {
    fn merge(&mut self, other: RunSummary) {
        self.users_started += other.users_started;
        self.users_failed += other.users_failed;
        self.tasks_ok += other.tasks_ok;
        for (task, n) in other.task_failures {
            *self.task_failures.entry(task).or_default() += n;
        }
    }

    #[must_use]
    pub fn failed_tasks(&self) -> u64 {
        self.task_failures.values().sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "users started: {}, users failed: {}, tasks ok: {}, tasks failed: {}",
            self.users_started,
            self.users_failed,
            self.tasks_ok,
            self.failed_tasks()
        )?;
        for (task, n) in &self.task_failures {
            writeln!(f, "    {task}: {n} failed")?;
        }
        Ok(())
    }
}

pub async fn run<U, F, Fut>(config: RunConfig, factory: F) -> anyhow::Result<RunSummary>
where
    U: User,
    F: Fn(usize) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = anyhow::Result<U>> + Send + 'static,
{
    if config.iterations.is_none() && config.run_time.is_none() {
        bail!("Either an iteration count or a run time is required");
    }
    let tasks = Arc::new(
        TaskSet::new(U::tasks()).with_context(|| format!("Invalid task weights for {}", U::NAME))?,
    );
    let deadline = config.run_time.map(|d| Instant::now() + d);
    let spawn_delay = match config.spawn_rate.filter(|r| r.is_finite() && *r > 0.0) {
        Some(rate) => Some(
            Duration::try_from_secs_f64(1.0 / rate)
                .with_context(|| format!("Spawn rate {rate} is too low"))?,
        ),
        None => None,
    };
    tracing::info!(user = U::NAME, users = config.users, "starting users");

    let mut handles = Vec::with_capacity(config.users);
    for id in 0..config.users {
        if id > 0 {
            if let Some(delay) = spawn_delay {
                tokio::time::sleep(delay).await;
            }
        }
        handles.push(tokio::spawn(run_user(
            id,
            factory.clone(),
            tasks.clone(),
            config.clone(),
            deadline,
        )));
    }
    let mut summary = RunSummary::default();
    for h in handles {
        summary.merge(h.await.context("Failed to join user task")?);
    }
    tracing::info!(
        user = U::NAME,
        tasks_ok = summary.tasks_ok,
        tasks_failed = summary.failed_tasks(),
        "run finished"
    );
    Ok(summary)
}

async fn run_user<U, F, Fut>(
    id: usize,
    factory: F,
    tasks: Arc<TaskSet<U::Task>>,
    config: RunConfig,
    deadline: Option<Instant>,
) -> RunSummary
where
    U: User,
    F: Fn(usize) -> Fut,
    Fut: Future<Output = anyhow::Result<U>>,
{
    let mut summary = RunSummary::default();
    let mut user = match factory(id).await {
        Ok(user) => user,
        Err(e) => {
            let err = format!("{e:#}");
            tracing::error!(user = id, error = %err, "failed to create user");
            summary.users_failed = 1;
            return summary;
        }
    };
    if let Err(e) = user.on_start().await {
        let err = format!("{:#}", anyhow::Error::new(e));
        tracing::error!(user = id, error = %err, "session start failed");
        summary.users_failed = 1;
        return summary;
    }
    summary.users_started = 1;

    let mut rng = StdRng::from_entropy();
    let mut done = 0u64;
    loop {
        if config.iterations.is_some_and(|n| done >= n) {
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        let task = tasks.pick(&mut rng);
        match user.perform(task).await {
            Ok(()) => summary.tasks_ok += 1,
            Err(e) => {
                let err = format!("{:#}", anyhow::Error::new(e));
                tracing::warn!(user = id, task = ?task, error = %err, "task failed");
                *summary.task_failures.entry(format!("{task:?}")).or_default() += 1;
            }
        }
        done += 1;
        if !config.wait.is_zero() {
            tokio::time::sleep(config.wait).await;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum Op {
        Read,
        Write,
    }

    const OPS: &[Weighted<Op>] = &[Weighted::new(Op::Write, 1), Weighted::new(Op::Read, 5)];

    #[derive(Default)]
    struct Counts {
        reads: AtomicU64,
        writes: AtomicU64,
    }

    struct CountingUser {
        counts: Arc<Counts>,
        fail_start: bool,
    }

    #[async_trait]
    impl User for CountingUser {
        type Task = Op;
        const NAME: &'static str = "counting";

        fn tasks() -> &'static [Weighted<Op>] {
            OPS
        }

        async fn on_start(&mut self) -> Result<(), TaskError> {
            if self.fail_start {
                return Err(TaskError::SessionInactive);
            }
            Ok(())
        }

        async fn perform(&mut self, task: Op) -> Result<(), TaskError> {
            match task {
                Op::Read => {
                    self.counts.reads.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                }
                Op::Write => {
                    self.counts.writes.fetch_add(1, Ordering::Relaxed);
                    Err(TaskError::PoolOutOfRange { len: 0 })
                }
            }
        }
    }

    #[test]
    fn weights_select_roughly_five_to_one() {
        let set = TaskSet::new(OPS).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let reads = (0..60_000).filter(|_| set.pick(&mut rng) == Op::Read).count();
        // expected 50_000
        assert!((48_500..51_500).contains(&reads), "{reads}");
    }

    #[test]
    fn all_zero_weights_are_rejected() {
        assert!(TaskSet::new(&[Weighted::new(Op::Read, 0)]).is_err());
        assert!(TaskSet::<Op>::new(&[]).is_err());
    }

    #[tokio::test]
    async fn runs_every_iteration_and_counts_failures() {
        let counts = Arc::new(Counts::default());
        let config = RunConfig {
            users: 4,
            iterations: Some(25),
            ..RunConfig::default()
        };
        let c = counts.clone();
        let summary = run(config, move |_| {
            let counts = c.clone();
            async move {
                Ok::<_, anyhow::Error>(CountingUser {
                    counts,
                    fail_start: false,
                })
            }
        })
        .await
        .unwrap();
        let reads = counts.reads.load(Ordering::Relaxed);
        let writes = counts.writes.load(Ordering::Relaxed);
        assert_eq!(reads + writes, 100);
        assert_eq!(summary.users_started, 4);
        assert_eq!(summary.tasks_ok, reads);
        assert_eq!(summary.failed_tasks(), writes);
    }

    #[tokio::test]
    async fn failed_session_start_runs_no_tasks() {
        let counts = Arc::new(Counts::default());
        let c = counts.clone();
        let summary = run(RunConfig::default(), move |_| {
            let counts = c.clone();
            async move {
                Ok::<_, anyhow::Error>(CountingUser {
                    counts,
                    fail_start: true,
                })
            }
        })
        .await
        .unwrap();
        assert_eq!(summary.users_failed, 1);
        assert_eq!(summary.users_started, 0);
        assert_eq!(counts.reads.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn requires_a_stop_condition() {
        let config = RunConfig {
            iterations: None,
            ..RunConfig::default()
        };
        let res = run(config, |_| async {
            Ok::<_, anyhow::Error>(CountingUser {
                counts: Arc::default(),
                fail_start: false,
            })
        })
        .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn rejects_spawn_rate_too_low_for_a_delay() {
        let counts = Arc::new(Counts::default());
        let config = RunConfig {
            users: 2,
            spawn_rate: Some(1e-20),
            ..RunConfig::default()
        };
        let c = counts.clone();
        let res = run(config, move |_| {
            let counts = c.clone();
            async move {
                Ok::<_, anyhow::Error>(CountingUser {
                    counts,
                    fail_start: false,
                })
            }
        })
        .await;
        let err = res.unwrap_err();
        assert!(format!("{err:#}").contains("Spawn rate"), "{err:#}");
        assert_eq!(counts.reads.load(Ordering::Relaxed), 0);
    }
}
