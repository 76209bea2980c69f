//! Fire-and-forget execution of leaderboard calls
//!
//! The tick loop never awaits anything. Futures are handed to a
//! [`TaskSpawner`]: the browser's microtask queue on wasm, or a tokio
//! `LocalSet` on native builds.

use std::future::Future;
use std::pin::Pin;

/// A boxed, non-`Send` future
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Something that can run a detached local task to completion
pub trait TaskSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Runs tasks on the current tokio `LocalSet`.
///
/// Must be used from inside `LocalSet::run_until` / `LocalSet::block_on`
/// on a current-thread runtime. Tasks make progress whenever the driver
/// yields back to the runtime.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawner;

#[cfg(not(target_arch = "wasm32"))]
impl TaskSpawner for TokioSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        // Dropping the handle detaches the task
        drop(tokio::task::spawn_local(task));
    }
}

/// Runs tasks on the browser event loop
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmSpawner;

#[cfg(target_arch = "wasm32")]
impl TaskSpawner for WasmSpawner {
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Drive `body` to completion on a current-thread runtime with a `LocalSet`
#[cfg(test)]
pub(crate) fn block_on_local<F: Future>(body: F) -> F::Output {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("test runtime");
    tokio::task::LocalSet::new().block_on(&runtime, body)
}

/// Yield to the runtime until every ready local task has run
#[cfg(test)]
pub(crate) async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::sync::Notify;

    #[test]
    fn test_spawned_tasks_run_when_driver_yields() {
        block_on_local(async {
            let hits = Rc::new(Cell::new(0));
            for _ in 0..3 {
                let hits = Rc::clone(&hits);
                TokioSpawner.spawn(Box::pin(async move { hits.set(hits.get() + 1) }));
            }
            // Spawning never runs anything inline
            assert_eq!(hits.get(), 0);

            settle().await;
            assert_eq!(hits.get(), 3);
        });
    }

    #[test]
    fn test_waiting_task_wakes_on_notify() {
        block_on_local(async {
            let gate = Rc::new(Notify::new());
            let done = Rc::new(Cell::new(false));
            {
                let gate = Rc::clone(&gate);
                let done = Rc::clone(&done);
                TokioSpawner.spawn(Box::pin(async move {
                    gate.notified().await;
                    done.set(true);
                }));
            }

            settle().await;
            assert!(!done.get());

            gate.notify_one();
            settle().await;
            assert!(done.get());
        });
    }

    #[test]
    fn test_tasks_may_spawn_tasks() {
        block_on_local(async {
            let inner_ran = Rc::new(Cell::new(false));
            {
                let inner_ran = Rc::clone(&inner_ran);
                TokioSpawner.spawn(Box::pin(async move {
                    TokioSpawner.spawn(Box::pin(async move { inner_ran.set(true) }));
                }));
            }

            settle().await;
            assert!(inner_ran.get());
        });
    }
}
