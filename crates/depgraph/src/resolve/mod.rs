//! Node resolution.
//!
//! The caller that wins a node's one-shot guard spawns a detached task that
//! runs the algorithm below and publishes its outcome; every caller, the winner
//! included, then waits on the node's resolution slot. Dropping a caller's
//! future therefore never cancels or restarts a resolution.
//!
//! 1. Every declared dependency must be registered, otherwise the node fails
//!    with [`ResolveError::MissingDependency`] before anything else runs.
//! 2. All dependencies are started at once and joined according to the graph's
//!    [`JoinPolicy`].
//! 3. The first failed dependency in declared order fails the node with
//!    [`ResolveError::DependencyFailed`].
//! 4. Otherwise the loader runs once with the dependency values in declared
//!    order.
//! 5. The outcome is published and cached forever.
//!
//! Cycles are not detected: every node on a cycle waits on the next one and
//! never resolves.

use std::future::Future;
use std::sync::Arc;

use crate::config::{GraphConfig, JoinPolicy};
use crate::error::ResolveError;
use crate::join_set::FanoutSet;
use crate::node::{BoxFuture, Loader, Node, Resolution};
use crate::panic::join_error_panic_message;
use crate::registry::Registry;
use crate::spawn::{spawn, spawn_blocking};
use crate::TaskClass;


pub(crate) struct Resolver<V> {
	registry: Registry<V>,
	config: Arc<GraphConfig>,
}

impl<V> Clone for Resolver<V> {
	fn clone(&self) -> Self {
		Self {
			registry: self.registry.clone(),
			config: Arc::clone(&self.config),
		}
	}
}

impl<V> Resolver<V>
where
	V: Send + Sync + 'static,
{
	pub fn new(registry: Registry<V>, config: GraphConfig) -> Self {
		Self {
			registry,
			config: Arc::new(config),
		}
	}

	pub fn registry(&self) -> &Registry<V> {
		&self.registry
	}

	pub fn config(&self) -> &GraphConfig {
		&self.config
	}

	pub async fn resolve(&self, name: &str) -> Resolution<V> {
		let Some(node) = self.registry.lookup(name) else {
			tracing::debug!(graph = %self.config.label, node = name, "depgraph.resolve.not_found");
			return Err(ResolveError::NotFound(name.to_string()));
		};
		self.resolve_node(node).await
	}

	/// Starts `node` if nobody has yet, and returns a future for its outcome.
	fn resolve_node(&self, node: Arc<Node<V>>) -> impl Future<Output = Resolution<V>> + Send + use<V> {
		if node.try_begin() {
			// Detached; the outcome is observed through the node.
			spawn(TaskClass::Resolve, self.clone().drive(Arc::clone(&node)));
		}
		async move { node.wait().await }
	}

	fn drive(self, node: Arc<Node<V>>) -> BoxFuture<()> {
		// Built before the future so it also fires if the task is dropped unpolled.
		let guard = PublishGuard {
			node,
			label: self.config.label.clone(),
		};
		Box::pin(async move {
			let resolution = self.compute(&guard.node).await;
			guard.publish(resolution);
		})
	}

	async fn compute(&self, node: &Node<V>) -> Resolution<V> {
		tracing::debug!(
			graph = %self.config.label,
			node = node.name(),
			dependencies = node.dependencies().len(),
			"depgraph.resolve.start"
		);

		let mut dependencies = Vec::with_capacity(node.dependencies().len());
		for name in node.dependencies() {
			let Some(dependency) = self.registry.lookup(name) else {
				tracing::debug!(
					graph = %self.config.label,
					node = node.name(),
					dependency = %name,
					"depgraph.resolve.missing_dependency"
				);
				return Err(ResolveError::MissingDependency {
					node: node.name().to_string(),
					dependency: name.clone(),
				});
			};
			dependencies.push(dependency);
		}

		let values = self.join(node, dependencies).await?;
		self.load(node, values).await
	}

	/// Resolves `dependencies` in parallel and collects their values in
	/// declared order.
	async fn join(&self, node: &Node<V>, dependencies: Vec<Arc<Node<V>>>) -> Result<Vec<Arc<V>>, ResolveError> {
		if dependencies.is_empty() {
			return Ok(Vec::new());
		}

		let mut slots: Vec<Option<Resolution<V>>> = dependencies.iter().map(|_| None).collect();
		let mut fanout = FanoutSet::new(TaskClass::Fanout);
		for (index, dependency) in dependencies.into_iter().enumerate() {
			let settled = self.resolve_node(dependency);
			fanout.spawn(async move { (index, settled.await) });
		}

		while let Some(joined) = fanout.join_next().await {
			match joined {
				Ok((index, resolution)) => slots[index] = Some(resolution),
				Err(err) => {
					fanout.abort_all();
					let reason = join_error_panic_message(err).unwrap_or_else(|| "dependency wait cancelled".to_string());
					return Err(ResolveError::Aborted {
						node: node.name().to_string(),
						reason,
					});
				}
			}
			if self.config.join_policy == JoinPolicy::FailFast && failure_decided(&slots) {
				tracing::trace!(
					graph = %self.config.label,
					node = node.name(),
					policy = self.config.join_policy.as_str(),
					pending = fanout.len(),
					"depgraph.resolve.join_short_circuit"
				);
				fanout.abort_all();
				break;
			}
		}

		self.aggregate(node, slots)
	}

	fn aggregate(&self, node: &Node<V>, slots: Vec<Option<Resolution<V>>>) -> Result<Vec<Arc<V>>, ResolveError> {
		let mut values = Vec::with_capacity(slots.len());
		for (dependency, slot) in node.dependencies().iter().zip(slots) {
			match slot {
				Some(Ok(value)) => values.push(value),
				Some(Err(source)) => {
					tracing::debug!(
						graph = %self.config.label,
						node = node.name(),
						dependency = %dependency,
						"depgraph.resolve.dependency_failed"
					);
					return Err(ResolveError::DependencyFailed {
						node: node.name().to_string(),
						dependency: dependency.clone(),
						source: Arc::new(source),
					});
				}
				None => {
					return Err(ResolveError::Aborted {
						node: node.name().to_string(),
						reason: format!("dependency '{dependency}' never settled"),
					});
				}
			}
		}
		Ok(values)
	}

	async fn load(&self, node: &Node<V>, values: Vec<Arc<V>>) -> Resolution<V> {
		let Some(loader) = node.take_loader() else {
			return Err(ResolveError::Aborted {
				node: node.name().to_string(),
				reason: "loader already consumed".to_string(),
			});
		};

		tracing::debug!(graph = %self.config.label, node = node.name(), "depgraph.loader.run");
		let joined = match loader {
			Loader::Blocking(load) => spawn_blocking(TaskClass::Loader, move || load(values)).await,
			Loader::Async(load) => spawn(TaskClass::AsyncLoader, async move { load(values).await }).await,
		};

		match joined {
			Ok(Ok(value)) => Ok(Arc::new(value)),
			Ok(Err(source)) => Err(ResolveError::LoaderFailed {
				node: node.name().to_string(),
				source: Arc::from(source),
			}),
			Err(err) => match join_error_panic_message(err) {
				Some(message) => Err(ResolveError::LoaderPanicked {
					node: node.name().to_string(),
					message,
				}),
				None => Err(ResolveError::Aborted {
					node: node.name().to_string(),
					reason: "loader task cancelled".to_string(),
				}),
			},
		}
	}
}

/// Owns the driver's node and publishes [`ResolveError::Aborted`] on drop if
/// the driver never got to publish, so waiters are not stranded when the
/// runtime running the driver shuts down.
struct PublishGuard<V>
where
	V: Send + Sync + 'static,
{
	node: Arc<Node<V>>,
	label: String,
}

impl<V> PublishGuard<V>
where
	V: Send + Sync + 'static,
{
	fn publish(&self, resolution: Resolution<V>) {
		tracing::debug!(
			graph = %self.label,
			node = self.node.name(),
			ok = resolution.is_ok(),
			"depgraph.resolve.publish"
		);
		self.node.publish(resolution);
	}
}

impl<V> Drop for PublishGuard<V>
where
	V: Send + Sync + 'static,
{
	fn drop(&mut self) {
		if self.node.cached().is_some() {
			return;
		}
		tracing::warn!(graph = %self.label, node = self.node.name(), "depgraph.resolve.driver_dropped");
		self.node.publish(Err(ResolveError::Aborted {
			node: self.node.name().to_string(),
			reason: "resolution task dropped (runtime shut down)".to_string(),
		}));
	}
}

/// True once the lowest-index dependency that has not succeeded is known to
/// have failed.
fn failure_decided<V>(slots: &[Option<Resolution<V>>]) -> bool {
	matches!(slots.iter().find(|slot| !matches!(slot, Some(Ok(_)))), Some(Some(Err(_))))
}
