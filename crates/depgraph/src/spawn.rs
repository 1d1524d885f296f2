//! Where resolution work runs.
//!
//! Drivers, fan-out waiters and loaders go onto the ambient tokio runtime. Code
//! outside any runtime (plain threads, `#[test]` functions, synchronous
//! callers of [`crate::DepGraph::resolve_blocking`]) falls back to one lazily
//! built process-wide runtime that is never shut down, so nodes started there
//! always finish.

use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

use crate::TaskClass;

/// Returns the ambient tokio runtime, or the process-wide fallback runtime.
pub(crate) fn runtime_handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static FALLBACK_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = FALLBACK_RT.get_or_init(|| {
		tracing::debug!("depgraph.runtime.fallback_start");
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.thread_name("depgraph-fallback")
			.build()
			.expect("failed to build depgraph fallback tokio runtime")
	});
	runtime.handle().clone()
}

/// Drives `fut` to completion from synchronous code.
///
/// Runs on the ambient runtime when called from its blocking pool (a
/// synchronous loader resolving other nodes), else on the fallback runtime.
///
/// # Panics
///
/// Panics when called from within an async task.
pub(crate) fn block_on<F: Future>(fut: F) -> F::Output {
	runtime_handle().block_on(fut)
}

/// Spawns an async task tagged with its execution class.
pub(crate) fn spawn<F>(class: TaskClass, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "depgraph.spawn");
	runtime_handle().spawn(fut)
}

/// Runs a synchronous loader on the blocking pool.
pub(crate) fn spawn_blocking<F, R>(class: TaskClass, f: F) -> JoinHandle<R>
where
	F: FnOnce() -> R + Send + 'static,
	R: Send + 'static,
{
	tracing::trace!(worker_class = class.as_str(), "depgraph.spawn_blocking");
	runtime_handle().spawn_blocking(f)
}
