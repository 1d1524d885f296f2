use std::future::Future;
use std::sync::Arc;

use crate::config::GraphConfig;
use crate::error::{LoaderError, RegisterError};
use crate::node::{AsyncLoader, BlockingLoader, BoxFuture, Loader, Node, NodeHandle, Resolution};
use crate::registry::Registry;
use crate::resolve::Resolver;

/// A graph of named, lazily computed nodes.
///
/// Cloning is cheap and every clone shares the same nodes. Separate graphs
/// created with [`DepGraph::new`] never see each other's nodes.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "multi_thread")]
/// # async fn main() {
/// use depgraph::{DepGraph, NO_DEPS};
///
/// let graph = DepGraph::<u32>::new();
/// graph.register("two", NO_DEPS, |_| Ok::<_, &str>(2)).unwrap();
/// graph.register("three", NO_DEPS, |_| Ok::<_, &str>(3)).unwrap();
/// graph
/// 	.register("six", ["two", "three"], |deps| Ok::<_, &str>(*deps[0] * *deps[1]))
/// 	.unwrap();
///
/// assert_eq!(*graph.resolve("six").await.unwrap(), 6);
/// # }
/// ```
pub struct DepGraph<V> {
	resolver: Resolver<V>,
}

impl<V> Clone for DepGraph<V> {
	fn clone(&self) -> Self {
		Self {
			resolver: self.resolver.clone(),
		}
	}
}

impl<V> Default for DepGraph<V>
where
	V: Send + Sync + 'static,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<V> DepGraph<V>
where
	V: Send + Sync + 'static,
{
	/// Creates an empty graph with the default configuration.
	pub fn new() -> Self {
		Self::with_config(GraphConfig::default())
	}

	/// Creates an empty graph with the given configuration.
	pub fn with_config(config: GraphConfig) -> Self {
		Self {
			resolver: Resolver::new(Registry::new(), config),
		}
	}

	/// Returns the graph's configuration.
	pub fn config(&self) -> &GraphConfig {
		self.resolver.config()
	}

	/// Registers a node whose loader is a synchronous function.
	///
	/// The loader receives the dependency values in the order `dependencies`
	/// lists them and runs at most once, on the blocking pool, the first time
	/// the node is resolved.
	///
	/// # Errors
	///
	/// Returns [`RegisterError::AlreadyExists`] if `name` is taken. The existing
	/// node is left untouched.
	pub fn register<I, S, F, E>(&self, name: impl Into<String>, dependencies: I, loader: F) -> Result<NodeHandle<V>, RegisterError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
		F: FnOnce(Vec<Arc<V>>) -> Result<V, E> + Send + 'static,
		E: Into<LoaderError>,
	{
		let loader: BlockingLoader<V> = Box::new(move |values: Vec<Arc<V>>| -> Result<V, LoaderError> { loader(values).map_err(Into::into) });
		self.insert(name.into(), dependencies, Loader::Blocking(loader))
	}

	/// Registers a node whose loader is asynchronous.
	///
	/// Same contract as [`DepGraph::register`]; the loader's future runs as its
	/// own task.
	pub fn register_async<I, S, F, Fut, E>(&self, name: impl Into<String>, dependencies: I, loader: F) -> Result<NodeHandle<V>, RegisterError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
		F: FnOnce(Vec<Arc<V>>) -> Fut + Send + 'static,
		Fut: Future<Output = Result<V, E>> + Send + 'static,
		E: Into<LoaderError>,
	{
		let loader: AsyncLoader<V> = Box::new(move |values: Vec<Arc<V>>| -> BoxFuture<Result<V, LoaderError>> {
			Box::pin(async move { loader(values).await.map_err(Into::<LoaderError>::into) })
		});
		self.insert(name.into(), dependencies, Loader::Async(loader))
	}

	fn insert<I, S>(&self, name: String, dependencies: I, loader: Loader<V>) -> Result<NodeHandle<V>, RegisterError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let dependencies: Vec<String> = dependencies.into_iter().map(Into::into).collect();
		let label = &self.config().label;
		match self.resolver.registry().insert(Node::new(name, dependencies, loader)) {
			Ok(node) => {
				tracing::debug!(graph = %label, node = node.name(), dependencies = ?node.dependencies(), "depgraph.register");
				Ok(NodeHandle::new(node))
			}
			Err(err) => {
				tracing::debug!(graph = %label, error = %err, "depgraph.register.rejected");
				Err(err)
			}
		}
	}

	/// Resolves `name`, computing it and its transitive dependencies on first
	/// use. Later calls return the cached outcome.
	///
	/// # Errors
	///
	/// [`ResolveError::NotFound`](crate::ResolveError::NotFound) if `name` is
	/// not registered; otherwise the node's cached failure.
	pub async fn resolve(&self, name: &str) -> Resolution<V> {
		self.resolver.resolve(name).await
	}

	/// Synchronous [`DepGraph::resolve`].
	///
	/// Usable from plain threads and from synchronous loaders, which run on the
	/// blocking pool.
	///
	/// # Panics
	///
	/// Panics when called from within an async task.
	pub fn resolve_blocking(&self, name: &str) -> Resolution<V> {
		crate::spawn::block_on(self.resolve(name))
	}

	/// Returns the node registered under `name`, without resolving it.
	pub fn node(&self, name: &str) -> Option<NodeHandle<V>> {
		self.resolver.registry().lookup(name).map(NodeHandle::new)
	}

	/// Returns `true` if a node is registered under `name`.
	pub fn contains(&self, name: &str) -> bool {
		self.resolver.registry().contains(name)
	}

	/// Returns the number of registered nodes.
	pub fn len(&self) -> usize {
		self.resolver.registry().len()
	}

	/// Returns `true` if no node is registered.
	pub fn is_empty(&self) -> bool {
		self.resolver.registry().is_empty()
	}

	/// Registered node names, sorted.
	pub fn names(&self) -> Vec<String> {
		self.resolver.registry().names()
	}
}
