//! Re-render debouncing.
//!
//! Parameter changes are sent to a background task that waits for a quiet
//! period and then runs only the most recent request.

use std::time::Duration;

use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use topo_core::constants::RENDER_DEBOUNCE_MS;

/// Coalesces bursts of requests into one call of the render callback.
#[derive(Debug)]
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    handle: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Debouncer with the default 120 ms quiet period.
    pub fn spawn<F>(render: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        Self::with_quiet_period(Duration::from_millis(RENDER_DEBOUNCE_MS), render)
    }

    /// Must be called from within a tokio runtime.
    pub fn with_quiet_period<F>(quiet: Duration, render: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_debounce_loop(quiet, rx, render));
        Self { tx, handle }
    }

    /// Schedule a render. Returns false once the loop has stopped.
    pub fn schedule(&self, request: T) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Stop accepting requests, run any pending one, and wait for the loop.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.handle.await;
    }
}

async fn run_debounce_loop<T, F>(quiet: Duration, mut rx: mpsc::UnboundedReceiver<T>, mut render: F)
where
    F: FnMut(T),
{
    while let Some(mut pending) = rx.recv().await {
        let mut coalesced = 0usize;
        loop {
            tokio::select! {
                next = rx.recv() => match next {
                    Some(request) => {
                        pending = request;
                        coalesced += 1;
                    }
                    None => {
                        render(pending);
                        return;
                    }
                },
                _ = tokio::time::sleep(quiet) => {
                    if coalesced > 0 {
                        debug!("Coalesced {coalesced} render request(s)");
                    }
                    render(pending);
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl FnMut(u32) + Send + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |v| sink.lock().unwrap().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_last_request_once() {
        let (seen, render) = recorder();
        let debouncer = Debouncer::spawn(render);

        for v in 1..=3 {
            assert!(debouncer.schedule(v));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*seen.lock().unwrap(), vec![3]);

        debouncer.schedule(4);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*seen.lock().unwrap(), vec![3, 4], "Separate bursts each render");
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending() {
        let (seen, render) = recorder();
        let debouncer = Debouncer::spawn(render);
        debouncer.schedule(9);
        debouncer.shutdown().await;
        assert_eq!(*seen.lock().unwrap(), vec![9]);
    }
}
