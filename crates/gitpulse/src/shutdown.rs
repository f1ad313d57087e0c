//! Cooperative shutdown signalling.
//!
//! A single [`ShutdownHandle`] is created at process startup and its paired
//! [`Shutdown`] receiver is threaded through every worker. Workers `select!`
//! on [`Shutdown::cancelled`] wherever they can suspend (queue operations,
//! page fetches, backoff sleeps) so that all of them unblock within a bounded
//! time once shutdown is requested.

use tokio::sync::watch;

/// Create a linked shutdown handle/receiver pair.
pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

/// The sending half, held by the process bootstrap.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    /// Request shutdown. All linked [`Shutdown`] receivers observe this.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// The receiving half, cloned into every worker.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Whether shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested.
    ///
    /// Also resolves if the handle has been dropped, so workers never wait
    /// on a signal that can no longer arrive.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}
