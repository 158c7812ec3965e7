use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Collapses bursts of calls into one, made with the last value after `wait` of quiet
pub struct Debouncer<T> {
    tx: mpsc::UnboundedSender<T>,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn spawn<F>(wait: Duration, mut f: F) -> Self
    where
        F: FnMut(T) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<T>();

        let task = tokio::spawn(async move {
            while let Some(first) = rx.recv().await {
                let mut pending = first;
                loop {
                    tokio::select! {
                        next = rx.recv() => match next {
                            Some(value) => pending = value,
                            None => {
                                tokio::time::sleep(wait).await;
                                f(pending);
                                return;
                            }
                        },
                        _ = tokio::time::sleep(wait) => {
                            f(pending);
                            break;
                        }
                    }
                }
            }
        });

        Self { tx, task }
    }

    pub fn call(&self, value: T) {
        let _ = self.tx.send(value);
    }

    /// Stop accepting calls and wait for a pending one to fire
    pub async fn finish(self) {
        drop(self.tx);
        let _ = self.task.await;
    }
}
