use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_queue::SegQueue;
use tracing::trace_span;

use crate::park::Parker;
use crate::{Executor, Job};

/// Workers fall back to this poll interval so a lost wakeup (there
/// shouldn't be one, but see [`Parker`]'s docs) can't wedge a worker
/// forever; it also bounds how long shutdown can take to notice.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

struct Shared {
    queue: SegQueue<Job>,
    parker: Parker,
    shutdown: AtomicBool,
}

/// The default executor: a fixed-size pool of worker threads pulling from
/// a shared lock-free queue.
pub struct ThreadPoolExecutor {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPoolExecutor {
    pub fn builder() -> ThreadPoolExecutorBuilder {
        ThreadPoolExecutorBuilder::default()
    }

    pub fn new(num_threads: usize) -> Self {
        Self::builder().num_threads(num_threads).build()
    }

    fn worker_loop(shared: Arc<Shared>) {
        loop {
            if let Some(job) = shared.queue.pop() {
                let _span = trace_span!("task_executor::worker::run_job").entered();
                job();
                continue;
            }

            if shared.shutdown.load(Ordering::Acquire) {
                return;
            }

            shared.parker.park_timeout(IDLE_POLL_INTERVAL);
        }
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, job: Job) {
        self.shared.queue.push(job);
        self.shared.parker.unpark();
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        let _span = trace_span!("task_executor::ThreadPoolExecutor::shutdown").entered();
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.parker.unpark_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// Builder for [`ThreadPoolExecutor`].
///
/// Thread-pool sizing is the one ambient "configuration" surface a
/// no-I/O concurrency core needs; it is expressed in code rather than as
/// an external config file, matching how the rest of this workspace
/// configures worker counts.
#[derive(Debug, Clone)]
pub struct ThreadPoolExecutorBuilder {
    num_threads: usize,
    thread_name: String,
}

impl Default for ThreadPoolExecutorBuilder {
    fn default() -> Self {
        Self {
            num_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            thread_name: "task-executor-worker".to_owned(),
        }
    }
}

impl ThreadPoolExecutorBuilder {
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn build(self) -> ThreadPoolExecutor {
        let shared = Arc::new(Shared {
            queue: SegQueue::new(),
            parker: Parker::new(),
            shutdown: AtomicBool::new(false),
        });

        let workers = (0..self.num_threads)
            .map(|i| {
                let shared = shared.clone();
                std::thread::Builder::new()
                    .name(format!("{}-{i}", self.thread_name))
                    .spawn(move || ThreadPoolExecutor::worker_loop(shared))
                    .expect("failed to spawn executor worker thread")
            })
            .collect();

        ThreadPoolExecutor { shared, workers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn executes_submitted_jobs() {
        let pool = ThreadPoolExecutor::new(2);
        let (tx, rx) = mpsc::channel();
        for i in 0..8 {
            let tx = tx.clone();
            pool.execute(Box::new(move || tx.send(i).unwrap()));
        }
        drop(tx);
        let mut results: Vec<i32> = rx.iter().collect();
        results.sort_unstable();
        assert_eq!(results, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn drop_joins_workers_without_losing_queued_work() {
        let pool = ThreadPoolExecutor::new(1);
        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || tx.send(()).unwrap()));
        drop(pool);
        assert!(rx.recv_timeout(Duration::from_secs(1)).is_ok());
    }
}
