//! One-shot deferred results for async requests.
//!
//! A `Deferred<T>` owns the receiving end of a request spawned on the tokio
//! runtime. The result can be picked up exactly once, either by polling from
//! an event loop tick or by awaiting it.
//!
//! # Example
//!
//! ```ignore
//! let mut pending = Deferred::spawn(async move { transport.get(url).await })?;
//!
//! // In event loop tick
//! if let Some(result) = pending.poll() {
//!     handle(result?);
//! }
//! ```

use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// A result that will be delivered once by a spawned task
pub struct Deferred<T> {
  receiver: Option<oneshot::Receiver<Result<T>>>,
}

impl<T: Send + 'static> Deferred<T> {
  /// Spawn `future` on the current runtime and return a handle to its result.
  ///
  /// Fails when called outside a tokio runtime.
  pub fn spawn<Fut>(future: Fut) -> Result<Self>
  where
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let runtime =
      Handle::try_current().map_err(|e| eyre!("No async runtime to run the request on: {}", e))?;
    let (tx, rx) = oneshot::channel();

    runtime.spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });

    Ok(Self { receiver: Some(rx) })
  }

  /// A deferred whose result is already available.
  pub fn ready(result: Result<T>) -> Self {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(result);
    Self { receiver: Some(rx) }
  }

  /// Whether the result has not been taken yet.
  pub fn is_pending(&self) -> bool {
    self.receiver.is_some()
  }

  /// Take the result if it has arrived.
  ///
  /// Returns `None` while the task is still running and after the result
  /// has already been taken.
  pub fn poll(&mut self) -> Option<Result<T>> {
    let receiver = self.receiver.as_mut()?;

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(oneshot::error::TryRecvError::Empty) => None,
      Err(oneshot::error::TryRecvError::Closed) => {
        // Sender dropped without sending - the task panicked or was aborted
        self.receiver = None;
        Some(Err(eyre!("Request was cancelled")))
      }
    }
  }

  /// Wait for the result. Returns `None` if it was already taken.
  pub async fn wait(&mut self) -> Option<Result<T>> {
    let receiver = self.receiver.take()?;
    Some(
      receiver
        .await
        .unwrap_or_else(|_| Err(eyre!("Request was cancelled"))),
    )
  }
}

impl<T> std::fmt::Debug for Deferred<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Deferred")
      .field("pending", &self.receiver.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_deferred_success() {
    let mut deferred = Deferred::spawn(async { Ok(vec![1, 2, 3]) }).unwrap();
    assert!(deferred.is_pending());

    // Wait for the result
    tokio::time::sleep(Duration::from_millis(10)).await;

    let result = deferred.poll().unwrap();
    assert_eq!(result.unwrap(), vec![1, 2, 3]);
    assert!(!deferred.is_pending());
  }

  #[tokio::test]
  async fn test_deferred_error() {
    let mut deferred: Deferred<i32> = Deferred::spawn(async { Err(eyre!("Something went wrong")) }).unwrap();

    let result = deferred.wait().await.unwrap();
    assert_eq!(result.unwrap_err().to_string(), "Something went wrong");
  }

  #[tokio::test]
  async fn test_poll_before_completion_is_none() {
    let mut deferred = Deferred::spawn(async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      Ok(42)
    })
    .unwrap();

    assert!(deferred.poll().is_none());
    assert!(deferred.is_pending());
  }

  #[tokio::test]
  async fn test_result_delivered_once() {
    let mut deferred = Deferred::ready(Ok(7));

    assert_eq!(deferred.wait().await.unwrap().unwrap(), 7);
    assert!(deferred.wait().await.is_none());
    assert!(deferred.poll().is_none());
  }

  #[tokio::test]
  async fn test_panicked_task_reports_cancelled() {
    let fail = true;
    let mut deferred: Deferred<i32> = Deferred::spawn(async move {
      if fail {
        panic!("boom");
      }
      Ok(0)
    })
    .unwrap();

    let result = deferred.wait().await.unwrap();
    assert!(result.unwrap_err().to_string().contains("cancelled"));
  }

  #[test]
  fn test_spawn_outside_runtime_is_error() {
    let result = Deferred::spawn(async { Ok(1) });

    let err = result.unwrap_err();
    assert!(err.to_string().contains("No async runtime"));
  }
}
