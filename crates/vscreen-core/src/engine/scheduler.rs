use super::error::EngineError;
use super::launcher::JobLauncher;
use super::progress::{Progress, ProgressReporter};
use crate::core::models::job::JobDescriptor;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// How a job ended, as observed by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Succeeded,
    /// Non-zero exit; `code` is `None` when the process was killed by a signal.
    Failed { code: Option<i32> },
    /// The process was started but its exit status could not be collected.
    WaitFailed,
    /// Never started because the batch was cancelled first.
    NotLaunched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub job: JobDescriptor,
    /// Position in launch sequence; `None` for jobs that were never launched.
    pub launch_order: Option<usize>,
    pub status: JobStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// One outcome per input descriptor, in input order.
    pub outcomes: Vec<JobOutcome>,
    /// Largest number of simultaneously active jobs observed by the coordinator.
    pub peak_active: usize,
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn launched(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.launch_order.is_some())
            .count()
    }
}

/// Lock-free counters that can be polled from any thread while a batch runs.
#[derive(Debug, Clone, Default)]
pub struct BatchProgress {
    launched: Arc<AtomicUsize>,
    completed: Arc<AtomicUsize>,
}

impl BatchProgress {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::Acquire)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }
}

/// A descriptor bound to its live child process.
struct RunningJob {
    job: JobDescriptor,
    launch_order: usize,
    child: Child,
}

impl RunningJob {
    async fn wait(mut self) -> JobOutcome {
        let status = match self.child.wait().await {
            Ok(status) if status.success() => JobStatus::Succeeded,
            Ok(status) => JobStatus::Failed {
                code: status.code(),
            },
            Err(e) => {
                warn!(
                    "Could not collect exit status for molecule '{}': {}",
                    self.job.molecule_id(),
                    e
                );
                JobStatus::WaitFailed
            }
        };
        JobOutcome {
            job: self.job,
            launch_order: Some(self.launch_order),
            status,
        }
    }
}

/// Runs job descriptors as external processes with at most `max_concurrency` alive at once.
///
/// A single coordinator owns the active set. Every running job is a task whose completion
/// is the notification that frees its slot; the coordinator then launches the next pending
/// descriptor in input order. Exit status never affects scheduling, but a process that
/// cannot be started at all aborts the batch and kills every job still running.
pub struct Scheduler<L: JobLauncher> {
    launcher: L,
    max_concurrency: usize,
    cancel: Option<watch::Receiver<bool>>,
    progress: BatchProgress,
}

impl<L: JobLauncher> Scheduler<L> {
    pub fn new(launcher: L, max_concurrency: usize) -> Self {
        Self {
            launcher,
            max_concurrency: max_concurrency.max(1),
            cancel: None,
            progress: BatchProgress::default(),
        }
    }

    /// Stops launching new jobs once the channel reads `true`; jobs already running are
    /// allowed to finish.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn progress(&self) -> BatchProgress {
        self.progress.clone()
    }

    pub async fn run(
        &self,
        jobs: Vec<JobDescriptor>,
        reporter: &ProgressReporter<'_>,
    ) -> Result<BatchOutcome, EngineError> {
        let total = jobs.len();
        info!(
            "Scheduling {} job(s) with at most {} running concurrently.",
            total, self.max_concurrency
        );
        reporter.report(Progress::TaskStart {
            total_steps: total as u64,
        });

        let mut slots: Vec<Option<JobOutcome>> = vec![None; total];
        let mut pending = jobs.into_iter().enumerate();
        let mut active: JoinSet<(usize, JobOutcome)> = JoinSet::new();
        let mut cancel = self.cancel.clone();
        let mut cancelled = false;
        let mut peak_active = 0;
        let mut next_launch = 0;
        let mut failed = 0;
        let mut last_status = String::new();

        loop {
            if !cancelled && is_cancelled(&cancel) {
                cancelled = true;
                info!("Cancellation requested; no further jobs will be launched.");
            }

            while !cancelled && active.len() < self.max_concurrency {
                let Some((index, job)) = pending.next() else {
                    break;
                };
                let running = self.launch(job, next_launch)?;
                next_launch += 1;
                active.spawn(async move { (index, running.wait().await) });
                peak_active = peak_active.max(active.len());
            }

            let status = status_text(cancelled, active.len(), failed);
            if status != last_status {
                reporter.report(Progress::StatusUpdate {
                    text: status.clone(),
                });
                last_status = status;
            }

            if active.is_empty() {
                break;
            }

            tokio::select! {
                joined = active.join_next() => {
                    let Some(joined) = joined else { break };
                    let (index, outcome) = joined.map_err(|e| {
                        EngineError::Internal(format!("Job supervisor task failed: {}", e))
                    })?;
                    self.record_completion(&outcome, reporter);
                    if outcome.status != JobStatus::Succeeded {
                        failed += 1;
                    }
                    slots[index] = Some(outcome);
                }
                _ = wait_for_cancellation(&mut cancel), if !cancelled => {
                    cancelled = true;
                    info!("Cancellation requested; waiting for {} running job(s).", active.len());
                }
            }
        }

        for (index, job) in pending {
            debug!("Job for molecule '{}' was not launched.", job.molecule_id());
            slots[index] = Some(JobOutcome {
                job,
                launch_order: None,
                status: JobStatus::NotLaunched,
            });
        }

        reporter.report(Progress::TaskFinish);

        let outcomes = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| EngineError::Internal("A job finished without an outcome".into()))?;

        info!(
            "Batch finished: {} of {} job(s) launched, peak concurrency {}.",
            next_launch, total, peak_active
        );
        Ok(BatchOutcome {
            outcomes,
            peak_active,
            cancelled,
        })
    }

    fn launch(&self, job: JobDescriptor, launch_order: usize) -> Result<RunningJob, EngineError> {
        let mut command = self.launcher.command(&job);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| EngineError::Launch {
            program: self.launcher.program().to_path_buf(),
            molecule_id: job.molecule_id().to_string(),
            source: e,
        })?;

        self.progress.launched.fetch_add(1, Ordering::AcqRel);
        debug!(
            "Launched job #{} for molecule '{}'.",
            launch_order,
            job.molecule_id()
        );
        Ok(RunningJob {
            job,
            launch_order,
            child,
        })
    }

    fn record_completion(&self, outcome: &JobOutcome, reporter: &ProgressReporter<'_>) {
        let completed = self.progress.completed.fetch_add(1, Ordering::AcqRel) + 1;
        match outcome.status {
            JobStatus::Succeeded => debug!(
                "Job for molecule '{}' finished ({} done).",
                outcome.job.molecule_id(),
                completed
            ),
            status => warn!(
                "Job for molecule '{}' did not succeed: {:?}",
                outcome.job.molecule_id(),
                status
            ),
        }
        reporter.report(Progress::TaskIncrement);
    }
}

/// Short status shown next to the progress bar, e.g. `"12 running, 3 failed"`.
fn status_text(cancelled: bool, running: usize, failed: usize) -> String {
    let mut text = if cancelled {
        format!("cancelling, {} running", running)
    } else {
        format!("{} running", running)
    };
    if failed > 0 {
        text.push_str(&format!(", {} failed", failed));
    }
    text
}

fn is_cancelled(cancel: &Option<watch::Receiver<bool>>) -> bool {
    cancel.as_ref().is_some_and(|rx| *rx.borrow())
}

async fn wait_for_cancellation(cancel: &mut Option<watch::Receiver<bool>>) {
    if let Some(rx) = cancel {
        let sender_dropped = rx.wait_for(|requested| *requested).await.is_err();
        if !sender_dropped {
            return;
        }
    }
    std::future::pending::<()>().await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::core::models::job::{DockingBox, DockingParams};
    use nalgebra::{Point3, Vector3};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::{TempDir, tempdir};
    use tokio::process::Command;

    /// Runs a shell snippet per job with `$OUT`, `$LOG` and `$ID` exported.
    struct ShellLauncher {
        script: String,
    }

    impl ShellLauncher {
        fn new(script: &str) -> Self {
            Self {
                script: script.to_string(),
            }
        }
    }

    impl JobLauncher for ShellLauncher {
        fn program(&self) -> &Path {
            Path::new("/bin/sh")
        }

        fn command(&self, job: &JobDescriptor) -> Command {
            let mut command = Command::new("/bin/sh");
            command
                .arg("-c")
                .arg(&self.script)
                .env("OUT", job.output_path())
                .env("LOG", job.log_path())
                .env("ID", job.molecule_id());
            command
        }
    }

    struct MissingLauncher;

    impl JobLauncher for MissingLauncher {
        fn program(&self) -> &Path {
            Path::new("/nonexistent/docking-engine")
        }

        fn command(&self, _job: &JobDescriptor) -> Command {
            Command::new(self.program())
        }
    }

    fn jobs(dir: &TempDir, n: usize) -> Vec<JobDescriptor> {
        let params = Arc::new(DockingParams {
            receptor: PathBuf::from("receptor.pdbqt"),
            pocket: DockingBox::new(Point3::origin(), Vector3::new(20.0, 20.0, 20.0)),
            exhaustiveness: 1,
        });
        (0..n)
            .map(|i| {
                let id = format!("M{:03}", i);
                JobDescriptor::new(
                    id.clone(),
                    dir.path().join(format!("{}.pdbqt", id)),
                    dir.path().join(format!("{}.out", id)),
                    dir.path().join(format!("log_{}.txt", id)),
                    params.clone(),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn runs_every_job_exactly_once() {
        let dir = tempdir().unwrap();
        let batch = jobs(&dir, 7);
        let scheduler = Scheduler::new(ShellLauncher::new("echo \"$ID\" >> \"$OUT\""), 3);

        let outcome = scheduler.run(batch, &ProgressReporter::new()).await.unwrap();

        assert_eq!(outcome.outcomes.len(), 7);
        assert_eq!(outcome.launched(), 7);
        assert!(!outcome.cancelled);
        for (i, job_outcome) in outcome.outcomes.iter().enumerate() {
            assert_eq!(job_outcome.job.molecule_id(), format!("M{:03}", i));
            assert_eq!(job_outcome.status, JobStatus::Succeeded);
            let written = fs::read_to_string(job_outcome.job.output_path()).unwrap();
            assert_eq!(written.lines().count(), 1);
        }
        assert_eq!(scheduler.progress().completed(), 7);
        assert_eq!(scheduler.progress().launched(), 7);
    }

    #[tokio::test]
    async fn launch_order_follows_input_order() {
        let dir = tempdir().unwrap();
        let scheduler = Scheduler::new(ShellLauncher::new("true"), 2);

        let outcome = scheduler
            .run(jobs(&dir, 5), &ProgressReporter::new())
            .await
            .unwrap();

        let orders: Vec<_> = outcome.outcomes.iter().map(|o| o.launch_order).collect();
        assert_eq!(orders, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn never_exceeds_concurrency_ceiling() {
        let dir = tempdir().unwrap();
        let running_dir = dir.path().join("running");
        fs::create_dir(&running_dir).unwrap();
        let script = format!(
            "touch \"{dir}/$ID\"; ls \"{dir}\" | wc -l > \"$OUT\"; sleep 0.1; ls \"{dir}\" | wc -l >> \"$OUT\"; rm \"{dir}/$ID\"",
            dir = running_dir.display()
        );
        let ceiling = 3;
        let scheduler = Scheduler::new(ShellLauncher::new(&script), ceiling);

        let outcome = scheduler
            .run(jobs(&dir, 10), &ProgressReporter::new())
            .await
            .unwrap();

        assert!(outcome.peak_active <= ceiling);
        assert_eq!(outcome.peak_active, ceiling);
        for job_outcome in &outcome.outcomes {
            let observed = fs::read_to_string(job_outcome.job.output_path()).unwrap();
            for count in observed.lines() {
                let count: usize = count.trim().parse().unwrap();
                assert!(count >= 1 && count <= ceiling, "observed {} active jobs", count);
            }
        }
    }

    #[tokio::test]
    async fn ceiling_of_one_runs_jobs_serially() {
        let dir = tempdir().unwrap();
        let scheduler = Scheduler::new(ShellLauncher::new("true"), 1);

        let outcome = scheduler
            .run(jobs(&dir, 4), &ProgressReporter::new())
            .await
            .unwrap();

        assert_eq!(outcome.peak_active, 1);
        assert_eq!(outcome.launched(), 4);
    }

    #[tokio::test]
    async fn failing_jobs_do_not_stop_the_batch() {
        let dir = tempdir().unwrap();
        let script = "case \"$ID\" in M001) exit 3 ;; M003) kill -9 $$ ;; *) touch \"$OUT\" ;; esac";
        let scheduler = Scheduler::new(ShellLauncher::new(script), 2);

        let outcome = scheduler
            .run(jobs(&dir, 5), &ProgressReporter::new())
            .await
            .unwrap();

        let statuses: Vec<_> = outcome.outcomes.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                JobStatus::Succeeded,
                JobStatus::Failed { code: Some(3) },
                JobStatus::Succeeded,
                JobStatus::Failed { code: None },
                JobStatus::Succeeded,
            ]
        );
        assert_eq!(scheduler.progress().completed(), 5);
    }

    #[tokio::test]
    async fn missing_executable_aborts_the_batch() {
        let dir = tempdir().unwrap();
        let scheduler = Scheduler::new(MissingLauncher, 2);

        let result = scheduler.run(jobs(&dir, 3), &ProgressReporter::new()).await;

        match result {
            Err(EngineError::Launch { molecule_id, .. }) => assert_eq!(molecule_id, "M000"),
            other => panic!("expected a launch failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_batch_returns_immediately() {
        let scheduler = Scheduler::new(ShellLauncher::new("true"), 4);
        let outcome = scheduler
            .run(Vec::new(), &ProgressReporter::new())
            .await
            .unwrap();
        assert!(outcome.outcomes.is_empty());
        assert_eq!(outcome.peak_active, 0);
    }

    #[tokio::test]
    async fn cancellation_before_start_launches_nothing() {
        let dir = tempdir().unwrap();
        let (sender, receiver) = watch::channel(false);
        sender.send(true).unwrap();
        let scheduler =
            Scheduler::new(ShellLauncher::new("touch \"$OUT\""), 2).with_cancellation(receiver);

        let outcome = scheduler
            .run(jobs(&dir, 3), &ProgressReporter::new())
            .await
            .unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.launched(), 0);
        assert!(
            outcome
                .outcomes
                .iter()
                .all(|o| o.status == JobStatus::NotLaunched)
        );
    }

    #[tokio::test]
    async fn cancellation_mid_batch_lets_running_jobs_finish() {
        let dir = tempdir().unwrap();
        let (sender, receiver) = watch::channel(false);
        let scheduler = Scheduler::new(ShellLauncher::new("sleep 0.2; touch \"$OUT\""), 2)
            .with_cancellation(receiver);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            sender.send(true).unwrap();
            sender
        });
        let outcome = scheduler
            .run(jobs(&dir, 6), &ProgressReporter::new())
            .await
            .unwrap();
        let _sender = canceller.await.unwrap();

        assert!(outcome.cancelled);
        assert_eq!(outcome.launched(), 2);
        for job_outcome in &outcome.outcomes[..2] {
            assert_eq!(job_outcome.status, JobStatus::Succeeded);
            assert!(job_outcome.job.output_path().exists());
        }
        for job_outcome in &outcome.outcomes[2..] {
            assert_eq!(job_outcome.status, JobStatus::NotLaunched);
        }
    }

    #[test]
    fn status_text_names_running_failed_and_cancelling() {
        assert_eq!(status_text(false, 4, 0), "4 running");
        assert_eq!(status_text(false, 2, 3), "2 running, 3 failed");
        assert_eq!(status_text(true, 1, 0), "cancelling, 1 running");
    }

    #[tokio::test]
    async fn status_updates_track_running_and_failed_jobs() {
        let dir = tempdir().unwrap();
        let statuses = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StatusUpdate { text } = event {
                statuses.lock().unwrap().push(text);
            }
        }));
        let script = "case \"$ID\" in M001) exit 1 ;; *) touch \"$OUT\" ;; esac";
        let scheduler = Scheduler::new(ShellLauncher::new(script), 2);

        scheduler.run(jobs(&dir, 4), &reporter).await.unwrap();
        drop(reporter);

        let statuses = statuses.into_inner().unwrap();
        assert_eq!(statuses.first().map(String::as_str), Some("2 running"));
        assert_eq!(statuses.last().map(String::as_str), Some("0 running, 1 failed"));
        assert!(statuses.windows(2).all(|pair| pair[0] != pair[1]));
    }

    #[tokio::test]
    async fn cancellation_is_reported_as_status() {
        let dir = tempdir().unwrap();
        let statuses = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::StatusUpdate { text } = event {
                statuses.lock().unwrap().push(text);
            }
        }));
        let (_sender, receiver) = watch::channel(true);
        let scheduler = Scheduler::new(ShellLauncher::new("true"), 2).with_cancellation(receiver);

        scheduler.run(jobs(&dir, 3), &reporter).await.unwrap();
        drop(reporter);

        assert_eq!(statuses.into_inner().unwrap(), vec!["cancelling, 0 running"]);
    }

    #[tokio::test]
    async fn progress_events_count_every_completion() {
        let dir = tempdir().unwrap();
        let increments = Mutex::new(0u64);
        let total = Mutex::new(0u64);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskStart { total_steps } => *total.lock().unwrap() = total_steps,
            Progress::TaskIncrement => *increments.lock().unwrap() += 1,
            _ => {}
        }));
        let scheduler = Scheduler::new(ShellLauncher::new("true"), 3);

        scheduler.run(jobs(&dir, 6), &reporter).await.unwrap();
        drop(reporter);

        assert_eq!(*total.lock().unwrap(), 6);
        assert_eq!(*increments.lock().unwrap(), 6);
    }
}
