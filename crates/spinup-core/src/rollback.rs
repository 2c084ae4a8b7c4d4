//! The rollback stack: a LIFO list of compensating actions, one
//! pushed after every successful pipeline step (a no-op for read-only
//! steps, so the stack stays symmetric with the step list for logging).
//!
//! On pipeline failure the stack is drained outside the caller's
//! synchronous path, within a bounded deadline; entries that fail are
//! logged, never propagated — rollback is best-effort, not transactional.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// How long a drain is allowed to run before it's abandoned.
pub const ROLLBACK_DRAIN_DEADLINE: Duration = Duration::from_secs(120);

type RollbackAction =
  Box<dyn FnOnce() -> futures_util::future::BoxFuture<'static, anyhow::Result<()>> + Send>;

pub struct RollbackEntry {
  pub name: String,
  action: RollbackAction,
}

impl RollbackEntry {
  pub fn named<F, Fut>(name: impl Into<String>, action: F) -> Self
  where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = anyhow::Result<()>> + Send + 'static,
  {
    RollbackEntry {
      name: name.into(),
      action: Box::new(move || Box::pin(action())),
    }
  }

  /// A step that is read-only and has nothing to compensate for; still
  /// occupies a slot so every step logs symmetrically on drain.
  pub fn noop(name: impl Into<String>) -> Self {
    RollbackEntry::named(name, || async { Ok(()) })
  }
}

#[derive(Default)]
pub struct RollbackStack {
  entries: Vec<RollbackEntry>,
}

impl RollbackStack {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, entry: RollbackEntry) {
    self.entries.push(entry);
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Drains LIFO within `ROLLBACK_DRAIN_DEADLINE`, or the parent token's
  /// own cancellation, whichever comes first. Never returns an error:
  /// failures are logged inline and the drain continues to the next entry.
  pub async fn drain(mut self, parent: &CancellationToken) {
    let deadline_token = parent.child_token();
    let guard = deadline_token.clone();
    let sleeper = tokio::spawn(async move {
      tokio::time::sleep(ROLLBACK_DRAIN_DEADLINE).await;
      guard.cancel();
    });

    while let Some(entry) = self.entries.pop() {
      if deadline_token.is_cancelled() {
        tracing::error!(
          remaining = self.entries.len() + 1,
          "rollback drain deadline elapsed, abandoning remaining entries"
        );
        break;
      }
      tokio::select! {
        result = (entry.action)() => {
          if let Err(err) = result {
            tracing::error!(step = %entry.name, error = %err, "rollback step failed");
          } else {
            tracing::info!(step = %entry.name, "rollback step completed");
          }
        }
        _ = deadline_token.cancelled() => {
          tracing::error!(step = %entry.name, "rollback step aborted by deadline");
          break;
        }
      }
    }

    sleeper.abort();
  }

  /// Spawns [`drain`](Self::drain) on a detached background task, using a
  /// fresh, un-linked token so cancellation of the caller's own token (e.g.
  /// an HTTP client disconnect) cannot abort cleanup.
  pub fn spawn_drain(self) {
    tokio::spawn(async move {
      self.drain(&CancellationToken::new()).await;
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

  #[tokio::test]
  async fn drains_lifo() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut stack = RollbackStack::new();
    for name in ["first", "second", "third"] {
      let order = order.clone();
      stack.push(RollbackEntry::named(name, move || {
        let order = order.clone();
        async move {
          order.lock().unwrap().push(name.to_string());
          Ok(())
        }
      }));
    }
    stack.drain(&CancellationToken::new()).await;
    assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
  }

  #[tokio::test]
  async fn a_failing_entry_does_not_abort_the_rest() {
    let ran = Arc::new(AtomicUsize::new(0));
    let mut stack = RollbackStack::new();
    stack.push(RollbackEntry::named("ok-1", {
      let ran = ran.clone();
      move || {
        let ran = ran.clone();
        async move {
          ran.fetch_add(1, Ordering::SeqCst);
          Ok(())
        }
      }
    }));
    stack.push(RollbackEntry::named("fails", || async {
      anyhow::bail!("boom")
    }));
    stack.push(RollbackEntry::named("ok-2", {
      let ran = ran.clone();
      move || {
        let ran = ran.clone();
        async move {
          ran.fetch_add(1, Ordering::SeqCst);
          Ok(())
        }
      }
    }));
    stack.drain(&CancellationToken::new()).await;
    assert_eq!(ran.load(Ordering::SeqCst), 2);
  }
}
