use crate::core_modules::geometry::Dimensions;
use crate::core_modules::probe::ImageProbe;
use crate::core_modules::settle::SettleTracker;
use crate::error::ProbeError;
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tracing::debug;

/// One probe request: which card slot it belongs to and what to load.
#[derive(Debug, Clone)]
pub struct ProbeJob {
    pub index: usize,
    pub src: String,
}

/// Terminal state of one probe.
#[derive(Debug)]
pub struct ProbeResult {
    pub index: usize,
    pub src: String,
    pub outcome: Result<Dimensions, ProbeError>,
}

struct ProbeTask {
    job: ProbeJob,
    result_sender: oneshot::Sender<ProbeResult>,
}

/// A fixed set of workers pulling probe jobs off a shared queue. Each probe is
/// bounded by `timeout`; a timeout settles the probe as failed.
pub struct ProbePool {
    task_sender: mpsc::UnboundedSender<ProbeTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl ProbePool {
    /// Spawns `worker_count` workers on the current tokio runtime.
    pub fn new(probe: Arc<dyn ImageProbe>, worker_count: usize, timeout: Duration) -> Self {
        let (task_sender, task_receiver) = mpsc::unbounded_channel::<ProbeTask>();
        let task_receiver = Arc::new(Mutex::new(task_receiver));

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let probe = Arc::clone(&probe);
                let receiver = Arc::clone(&task_receiver);
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(task) = next else { break };
                        let result = Self::run_probe(probe.as_ref(), task.job, timeout).await;
                        // The submitter may have gone away; nothing to report to.
                        let _ = task.result_sender.send(result);
                    }
                })
            })
            .collect();

        Self {
            task_sender,
            workers,
        }
    }

    async fn run_probe(probe: &dyn ImageProbe, job: ProbeJob, timeout: Duration) -> ProbeResult {
        let outcome = match tokio::time::timeout(timeout, probe.natural_dimensions(&job.src)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeError::Timeout {
                src: job.src.clone(),
                after: timeout,
            }),
        };
        debug!(src = %job.src, ok = outcome.is_ok(), "probe settled");
        ProbeResult {
            index: job.index,
            src: job.src,
            outcome,
        }
    }

    /// Queues `jobs`, records each terminal state on `settle`, and hands every
    /// result to `on_settled` in completion order. Returns once all have
    /// settled.
    pub async fn settle_all<F>(&self, jobs: Vec<ProbeJob>, settle: &SettleTracker, mut on_settled: F)
    where
        F: FnMut(ProbeResult),
    {
        let mut pending: FuturesUnordered<_> = jobs
            .into_iter()
            .map(|job| {
                let (result_sender, result_receiver) = oneshot::channel();
                let src = job.src.clone();
                let index = job.index;
                // A closed queue drops the task, which surfaces below as a
                // closed receiver.
                let _ = self.task_sender.send(ProbeTask { job, result_sender });
                async move {
                    result_receiver.await.unwrap_or_else(|_| ProbeResult {
                        index,
                        src: src.clone(),
                        outcome: Err(ProbeError::WorkerStopped { src }),
                    })
                }
            })
            .collect();

        while let Some(result) = pending.next().await {
            if result.outcome.is_ok() {
                settle.record_loaded();
            } else {
                settle.record_failed();
            }
            on_settled(result);
        }
    }
}

impl Drop for ProbePool {
    fn drop(&mut self) {
        for worker in &self.workers {
            worker.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SizedBySrc;

    #[async_trait]
    impl ImageProbe for SizedBySrc {
        async fn natural_dimensions(&self, src: &str) -> Result<Dimensions, ProbeError> {
            match src {
                "hang" => std::future::pending().await,
                "missing" => Err(ProbeError::EmptySource),
                _ => Ok(Dimensions::new(src.len() as f64, 1.0)),
            }
        }
    }

    fn jobs(srcs: &[&str]) -> Vec<ProbeJob> {
        srcs.iter()
            .enumerate()
            .map(|(index, src)| ProbeJob {
                index,
                src: src.to_string(),
            })
            .collect()
    }

    #[tokio::test]
    async fn every_job_settles_once() {
        let pool = ProbePool::new(Arc::new(SizedBySrc), 2, Duration::from_secs(1));
        let settle = SettleTracker::new(3);
        let mut seen = Vec::new();
        pool.settle_all(jobs(&["a", "bb", "missing"]), &settle, |r| seen.push(r.index))
            .await;

        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
        let counts = settle.counts();
        assert_eq!((counts.loaded, counts.failed), (2, 1));
        assert!(counts.is_settled());
    }

    #[tokio::test]
    async fn hanging_probe_times_out() {
        let pool = ProbePool::new(Arc::new(SizedBySrc), 2, Duration::from_millis(50));
        let settle = SettleTracker::new(2);
        let mut timed_out = false;
        pool.settle_all(jobs(&["hang", "ok"]), &settle, |r| {
            if let Err(ProbeError::Timeout { .. }) = r.outcome {
                timed_out = true;
            }
        })
        .await;

        assert!(timed_out);
        assert_eq!(settle.counts().failed, 1);
    }
}
