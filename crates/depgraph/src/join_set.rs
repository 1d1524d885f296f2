use std::future::Future;

use tokio::task::{JoinError, JoinSet};

use crate::TaskClass;

/// Classed wrapper over a Tokio [`JoinSet`] used for dependency fan-out.
///
/// Spawning goes through [`crate::spawn::runtime_handle`] so the set works from
/// both runtime tasks and the fallback runtime.
#[derive(Debug)]
pub(crate) struct FanoutSet<T> {
	class: TaskClass,
	inner: JoinSet<T>,
}

impl<T> FanoutSet<T>
where
	T: Send + 'static,
{
	pub fn new(class: TaskClass) -> Self {
		Self { class, inner: JoinSet::new() }
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn spawn<F>(&mut self, fut: F)
	where
		F: Future<Output = T> + Send + 'static,
	{
		tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "depgraph.fanout.spawn");
		let handle = crate::spawn::runtime_handle();
		self.inner.spawn_on(fut, &handle);
	}

	/// Waits for the next completed task, `None` once the set is drained.
	pub async fn join_next(&mut self) -> Option<Result<T, JoinError>> {
		self.inner.join_next().await
	}

	/// Aborts the remaining waiters. Work they were waiting on keeps running.
	pub fn abort_all(&mut self) {
		if !self.inner.is_empty() {
			tracing::trace!(worker_class = self.class.as_str(), pending = self.inner.len(), "depgraph.fanout.abort");
		}
		self.inner.abort_all();
	}
}
