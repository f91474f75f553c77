// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::channel::{EventChannel, EventEmitter};
use crate::errors::JobError;
use crate::observability::messages::job::{JobCancelled, JobCreated, JobStarted, JobsPruned};
use crate::observability::messages::StructuredLog;

/// What a job's background task gets to work with.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_id: String,
    pub emitter: EventEmitter,
    pub cancel: CancellationToken,
}

/// One background build, addressed by id.
#[derive(Debug)]
pub struct Job {
    id: String,
    channel: Arc<EventChannel>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    finished_at: Arc<Mutex<Option<Instant>>>,
}

impl Job {
    fn new(id: String) -> Self {
        Self {
            id,
            channel: Arc::new(EventChannel::new()),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
            finished_at: Arc::new(Mutex::new(None)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn channel(&self) -> Arc<EventChannel> {
        Arc::clone(&self.channel)
    }

    pub fn is_started(&self) -> bool {
        self.task.lock().is_some()
    }

    /// True once the background task has returned or the job was cancelled.
    pub fn is_finished(&self) -> bool {
        self.finished_at.lock().is_some()
    }

    /// Waits for the background task. Returns immediately if it never started.
    pub async fn wait(&self) {
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            // cancelled tasks report a JoinError; either way the task is gone
            let _ = handle.await;
        }
    }

    fn mark_finished(finished_at: &Mutex<Option<Instant>>) {
        finished_at.lock().get_or_insert_with(Instant::now);
    }
}

/// Background jobs, each owning an event channel and a cancellable task.
///
/// A job's channel always ends with exactly one terminal sentinel: the task pushes it
/// when it returns, and `cancel_job` pushes it for a task that will not.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<HashMap<String, Arc<Job>>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new job with an empty channel and returns its id.
    pub fn create_job(&self) -> String {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.jobs
            .lock()
            .insert(job_id.clone(), Arc::new(Job::new(job_id.clone())));
        JobCreated { job_id: &job_id }.log();
        job_id
    }

    /// Spawns the job's background task.
    ///
    /// `work` gets the job's emitter and cancellation token. The sentinel is pushed
    /// once the future returns.
    pub fn start_job<F, Fut>(&self, job_id: &str, work: F) -> Result<(), JobError>
    where
        F: FnOnce(JobContext) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job = self.get_job(job_id)?;
        let mut task = job.task.lock();
        if task.is_some() {
            return Err(JobError::AlreadyStarted(job_id.to_string()));
        }

        let emitter = job.channel.emitter();
        let finished_at = Arc::clone(&job.finished_at);
        let future = work(JobContext {
            job_id: job_id.to_string(),
            emitter: emitter.clone(),
            cancel: job.cancel.clone(),
        });
        let span = JobStarted { job_id }.span("job");
        JobStarted { job_id }.log();

        *task = Some(tokio::spawn(
            async move {
                future.await;
                emitter.close();
                Job::mark_finished(&finished_at);
            }
            .instrument(span),
        ));
        Ok(())
    }

    pub fn get_job(&self, job_id: &str) -> Result<Arc<Job>, JobError> {
        self.jobs
            .lock()
            .get(job_id)
            .cloned()
            .ok_or_else(|| JobError::NotFound(job_id.to_string()))
    }

    /// Cancels a job: fires its token, aborts the task and pushes the sentinel.
    ///
    /// Cancelling a finished job is a no-op that still succeeds.
    pub fn cancel_job(&self, job_id: &str) -> Result<(), JobError> {
        let job = self.get_job(job_id)?;
        let was_running = !job.is_finished();
        if was_running {
            job.cancel.cancel();
            if let Some(task) = job.task.lock().as_ref() {
                task.abort();
            }
            job.channel.close();
            Job::mark_finished(&job.finished_at);
        }
        JobCancelled {
            job_id,
            was_running,
        }
        .log();
        Ok(())
    }

    /// Drops jobs that finished more than `ttl` ago. Returns how many were removed.
    pub fn prune_finished(&self, ttl: Duration) -> usize {
        let mut jobs = self.jobs.lock();
        let before = jobs.len();
        jobs.retain(|_, job| match *job.finished_at.lock() {
            Some(at) => at.elapsed() < ttl,
            None => true,
        });
        let pruned = before - jobs.len();
        JobsPruned {
            pruned,
            remaining: jobs.len(),
        }
        .log();
        pruned
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::BuildEvent;

    #[tokio::test]
    async fn finished_task_pushes_the_sentinel() {
        let queue = JobQueue::new();
        let job_id = queue.create_job();

        queue
            .start_job(&job_id, |ctx| async move {
                ctx.emitter.emit(&BuildEvent::End {}).unwrap();
            })
            .unwrap();
        let job = queue.get_job(&job_id).unwrap();
        let batch = job.channel().drain(Duration::from_secs(1)).await;
        let tail = job.channel().drain(Duration::from_secs(1)).await;

        let events: Vec<_> = batch.events.iter().chain(tail.events.iter()).collect();
        assert_eq!(events.len(), 1);
        assert!(batch.closed || tail.closed);
        job.wait().await;
        assert!(job.is_finished());
    }

    #[tokio::test]
    async fn start_job_twice_is_rejected() {
        let queue = JobQueue::new();
        let job_id = queue.create_job();

        queue.start_job(&job_id, |_| async {}).unwrap();
        let err = queue.start_job(&job_id, |_| async {}).unwrap_err();

        assert_eq!(err, JobError::AlreadyStarted(job_id));
    }

    #[tokio::test]
    async fn unknown_jobs_are_not_found() {
        struct TestCase {
            name: &'static str,
            op: fn(&JobQueue) -> Result<(), JobError>,
        }

        let test_cases = vec![
            TestCase {
                name: "get",
                op: |q| q.get_job("nope").map(|_| ()),
            },
            TestCase {
                name: "cancel",
                op: |q| q.cancel_job("nope"),
            },
            TestCase {
                name: "start",
                op: |q| q.start_job("nope", |_| async {}),
            },
        ];

        let queue = JobQueue::new();
        for test_case in test_cases {
            assert_eq!(
                (test_case.op)(&queue),
                Err(JobError::NotFound("nope".into())),
                "Test case '{}'",
                test_case.name
            );
        }
    }

    #[tokio::test]
    async fn cancel_stops_the_task_and_closes_the_channel_once() {
        let queue = JobQueue::new();
        let job_id = queue.create_job();
        queue
            .start_job(&job_id, |ctx| async move {
                ctx.emitter
                    .emit(&BuildEvent::VerticesSorted {
                        ids: vec!["a".into()],
                        to_run: vec!["a".into()],
                    })
                    .unwrap();
                tokio::time::sleep(Duration::from_secs(30)).await;
                ctx.emitter.emit(&BuildEvent::End {}).unwrap();
            })
            .unwrap();
        let job = queue.get_job(&job_id).unwrap();
        let channel = job.channel();
        let first = channel.recv().await.unwrap();

        queue.cancel_job(&job_id).unwrap();
        queue.cancel_job(&job_id).unwrap();

        assert!(first.payload.unwrap().contains("vertices_sorted"));
        assert!(channel.recv().await.unwrap().is_sentinel());
        assert!(channel.recv().await.is_none());
        assert!(job.is_finished());
    }

    #[tokio::test]
    async fn cancelling_a_completed_job_succeeds_without_a_second_sentinel() {
        let queue = JobQueue::new();
        let job_id = queue.create_job();
        queue
            .start_job(&job_id, |ctx| async move {
                ctx.emitter.emit(&BuildEvent::End {}).unwrap();
            })
            .unwrap();
        let job = queue.get_job(&job_id).unwrap();
        job.wait().await;
        assert!(job.is_finished());

        assert_eq!(queue.cancel_job(&job_id), Ok(()));
        assert_eq!(queue.cancel_job(&job_id), Ok(()));

        let channel = job.channel();
        assert!(channel.recv().await.unwrap().payload.unwrap().contains("\"end\""));
        assert!(channel.recv().await.unwrap().is_sentinel());
        assert!(channel.recv().await.is_none());
    }

    #[tokio::test]
    async fn prune_keeps_running_and_recent_jobs() {
        let queue = JobQueue::new();
        let running = queue.create_job();
        let done = queue.create_job();
        queue
            .start_job(&running, |ctx| async move { ctx.cancel.cancelled().await })
            .unwrap();
        queue.start_job(&done, |_| async {}).unwrap();
        queue.get_job(&done).unwrap().wait().await;

        assert_eq!(queue.prune_finished(Duration::from_secs(60)), 0);
        assert_eq!(queue.prune_finished(Duration::ZERO), 1);
        assert!(queue.get_job(&running).is_ok());
        assert!(queue.get_job(&done).is_err());
        assert_eq!(queue.len(), 1);
    }
}
