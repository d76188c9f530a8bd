//! Background worker thread fed through flume channels

use std::thread::JoinHandle;
use std::time::Duration;

/// A named thread that runs `handler` on each job in order and queues the
/// results for the owner to collect without blocking.
///
/// Dropping the worker closes the job channel and joins the thread once the
/// current job finishes. Use [`BackgroundWorker::detach`] to skip the wait.
pub struct BackgroundWorker<J, O> {
    name: String,
    jobs: Option<flume::Sender<J>>,
    results: flume::Receiver<O>,
    handle: Option<JoinHandle<()>>,
}

impl<J: Send + 'static, O: Send + 'static> BackgroundWorker<J, O> {
    pub fn spawn<F>(name: &str, mut handler: F) -> std::io::Result<Self>
    where
        F: FnMut(J) -> O + Send + 'static,
    {
        let (job_tx, job_rx) = flume::unbounded::<J>();
        let (out_tx, out_rx) = flume::unbounded::<O>();
        let thread_name = name.to_string();
        let handle = std::thread::Builder::new().name(name.to_string()).spawn(move || {
            log::debug!("Worker {} started", thread_name);
            for job in job_rx.iter() {
                if out_tx.send(handler(job)).is_err() {
                    break;
                }
            }
            log::debug!("Worker {} stopped", thread_name);
        })?;
        Ok(Self {
            name: name.to_string(),
            jobs: Some(job_tx),
            results: out_rx,
            handle: Some(handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job; fails only if the worker thread has died
    pub fn dispatch(&self, job: J) -> Result<(), flume::SendError<J>> {
        match &self.jobs {
            Some(jobs) => jobs.send(job),
            None => Err(flume::SendError(job)),
        }
    }

    /// Next finished result, without blocking
    pub fn try_recv(&self) -> Option<O> {
        self.results.try_recv().ok()
    }

    /// Next finished result, waiting at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<O> {
        self.results.recv_timeout(timeout).ok()
    }

    /// Close the job channel and let the thread wind down on its own.
    /// Unlike dropping, this does not wait for the job currently running.
    pub fn detach(mut self) {
        self.jobs.take();
        if self.handle.take().is_some() {
            log::debug!("Worker {} detached", self.name);
        }
    }

    /// False once the thread has exited, e.g. after a panicking job
    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl<J, O> Drop for BackgroundWorker<J, O> {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("Worker {} panicked", self.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_come_back_in_order() {
        let worker = BackgroundWorker::spawn("square", |n: u32| n * n).unwrap();
        for n in 1..=4 {
            worker.dispatch(n).unwrap();
        }
        let results: Vec<u32> = (0..4)
            .map(|_| worker.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        assert_eq!(results, vec![1, 4, 9, 16]);
        assert!(worker.try_recv().is_none());
    }

    #[test]
    fn test_detach_does_not_wait_for_running_job() {
        let (release_tx, release_rx) = flume::bounded::<()>(0);
        let (started_tx, started_rx) = flume::bounded::<()>(1);
        let worker = BackgroundWorker::spawn("stuck", move |_: ()| {
            started_tx.send(()).ok();
            release_rx.recv().ok();
        })
        .unwrap();
        worker.dispatch(()).unwrap();
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let start = std::time::Instant::now();
        worker.detach();
        assert!(start.elapsed() < Duration::from_secs(1));
        drop(release_tx);
    }

    #[test]
    fn test_dead_worker_rejects_jobs() {
        let worker = BackgroundWorker::<(), ()>::spawn("panics", |_| panic!("boom")).unwrap();
        worker.dispatch(()).unwrap();
        assert!(worker.recv_timeout(Duration::from_millis(200)).is_none());
        // the job receiver is dropped during unwinding
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while worker.is_alive() && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(worker.dispatch(()).is_err());
    }
}
