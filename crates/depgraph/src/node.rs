//! Node records and their write-once resolution slot.
//!
//! A node moves through `Unresolved -> Resolving -> Resolved` exactly once.
//! The one-shot guard picks the single caller that drives the transition; the
//! resolution slot is a [`OnceCell`], so the published outcome happens-before
//! every read of it.

use std::fmt;
use std::future::Future;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::{Notify, OnceCell};

use crate::error::{LoaderError, ResolveError};

/// Terminal outcome of resolving a node.
pub type Resolution<V> = Result<Arc<V>, ResolveError>;

/// Dependency list for nodes without dependencies.
pub const NO_DEPS: [&str; 0] = [];

pub(crate) type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

pub(crate) type BlockingLoader<V> = Box<dyn FnOnce(Vec<Arc<V>>) -> Result<V, LoaderError> + Send>;
pub(crate) type AsyncLoader<V> = Box<dyn FnOnce(Vec<Arc<V>>) -> BoxFuture<Result<V, LoaderError>> + Send>;

/// Computation producing a node's value from its dependency values, in
/// declared order.
pub(crate) enum Loader<V> {
	Blocking(BlockingLoader<V>),
	Async(AsyncLoader<V>),
}

/// Observable lifecycle of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
	/// Nobody has asked for the node yet.
	Unresolved,
	/// A resolution is in flight.
	Resolving,
	/// The outcome is cached; the node never changes again.
	Resolved,
}

pub(crate) struct Node<V> {
	name: String,
	dependencies: Vec<String>,
	loader: Mutex<Option<Loader<V>>>,
	started: AtomicBool,
	resolution: OnceCell<Resolution<V>>,
	published: Notify,
}

impl<V> Node<V>
where
	V: Send + Sync + 'static,
{
	pub fn new(name: String, dependencies: Vec<String>, loader: Loader<V>) -> Self {
		Self {
			name,
			dependencies,
			loader: Mutex::new(Some(loader)),
			started: AtomicBool::new(false),
			resolution: OnceCell::new(),
			published: Notify::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn dependencies(&self) -> &[String] {
		&self.dependencies
	}

	/// One-shot guard. Returns `true` for exactly one caller over the node's
	/// lifetime.
	pub fn try_begin(&self) -> bool {
		self.started.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
	}

	pub fn take_loader(&self) -> Option<Loader<V>> {
		self.loader.lock().take()
	}

	/// Stores the outcome and wakes every waiter.
	pub fn publish(&self, resolution: Resolution<V>) {
		if self.resolution.set(resolution).is_err() {
			tracing::error!(node = %self.name, "depgraph.resolve.double_publish");
		}
		self.published.notify_waiters();
	}

	pub fn cached(&self) -> Option<&Resolution<V>> {
		self.resolution.get()
	}

	/// Waits until the resolution slot is filled.
	pub async fn wait(&self) -> Resolution<V> {
		loop {
			let mut notified = pin!(self.published.notified());
			notified.as_mut().enable();
			if let Some(resolution) = self.resolution.get() {
				return resolution.clone();
			}
			notified.await;
		}
	}

	pub fn state(&self) -> NodeState {
		if self.resolution.initialized() {
			NodeState::Resolved
		} else if self.started.load(Ordering::Acquire) {
			NodeState::Resolving
		} else {
			NodeState::Unresolved
		}
	}
}

impl<V> fmt::Debug for Node<V>
where
	V: Send + Sync + 'static,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Node")
			.field("name", &self.name)
			.field("dependencies", &self.dependencies)
			.field("state", &self.state())
			.finish_non_exhaustive()
	}
}

/// Shared handle to a registered node.
pub struct NodeHandle<V> {
	node: Arc<Node<V>>,
}

impl<V> Clone for NodeHandle<V> {
	fn clone(&self) -> Self {
		Self { node: Arc::clone(&self.node) }
	}
}

impl<V> fmt::Debug for NodeHandle<V>
where
	V: Send + Sync + 'static,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		fmt::Debug::fmt(&*self.node, f)
	}
}

impl<V> NodeHandle<V>
where
	V: Send + Sync + 'static,
{
	pub(crate) fn new(node: Arc<Node<V>>) -> Self {
		Self { node }
	}

	/// Returns the node's unique name.
	pub fn name(&self) -> &str {
		self.node.name()
	}

	/// Declared dependencies, in the order their values reach the loader.
	pub fn dependencies(&self) -> &[String] {
		self.node.dependencies()
	}

	/// Returns where the node is in its lifecycle.
	pub fn state(&self) -> NodeState {
		self.node.state()
	}

	/// Cached outcome, without triggering or waiting for resolution.
	pub fn resolution(&self) -> Option<Resolution<V>> {
		self.node.cached().cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn node(name: &str) -> Node<u32> {
		Node::new(name.to_string(), Vec::new(), Loader::Blocking(Box::new(|_: Vec<Arc<u32>>| Ok::<_, LoaderError>(1))))
	}

	#[test]
	fn guard_admits_one_winner() {
		let node = node("a");
		assert_eq!(node.state(), NodeState::Unresolved);
		assert!(node.try_begin());
		assert!(!node.try_begin());
		assert_eq!(node.state(), NodeState::Resolving);
	}

	#[test]
	fn loader_can_be_taken_once() {
		let node = node("a");
		assert!(node.take_loader().is_some());
		assert!(node.take_loader().is_none());
	}

	#[test]
	fn first_publish_wins() {
		let node = node("a");
		node.try_begin();
		node.publish(Ok(Arc::new(7)));
		node.publish(Err(ResolveError::NotFound("a".into())));
		assert_eq!(node.state(), NodeState::Resolved);
		assert_eq!(node.cached().and_then(|r| r.as_ref().ok()).map(|v| **v), Some(7));
	}

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn waiters_wake_on_publish() {
		let node = Arc::new(node("a"));
		let waiter = {
			let node = Arc::clone(&node);
			tokio::spawn(async move { node.wait().await })
		};
		tokio::task::yield_now().await;
		node.publish(Ok(Arc::new(3)));
		let resolution = waiter.await.unwrap();
		assert_eq!(*resolution.unwrap(), 3);
	}
}
