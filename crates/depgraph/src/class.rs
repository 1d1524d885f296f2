/// Execution classes for work spawned by the resolver, used for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskClass {
	/// The detached task that drives one node from `Resolving` to `Resolved`.
	Resolve,
	/// Waiters joined by a node while its dependencies settle.
	Fanout,
	/// Synchronous loaders, run on the blocking pool.
	Loader,
	/// Asynchronous loaders, run as their own task.
	AsyncLoader,
}

impl TaskClass {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::Resolve => "resolve",
			Self::Fanout => "fanout",
			Self::Loader => "loader",
			Self::AsyncLoader => "async_loader",
		}
	}
}
