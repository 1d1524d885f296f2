use indexmap::IndexMap;

use crate::error::ResolveError;
use crate::graph::DepGraph;
use crate::join_set::FanoutSet;
use crate::node::Resolution;
use crate::TaskClass;

impl<V> DepGraph<V>
where
	V: Send + Sync + 'static,
{
	/// Resolves every name concurrently and returns the outcomes keyed by name,
	/// in input order. Repeated names collapse into one entry.
	pub async fn resolve_map<I, S>(&self, names: I) -> IndexMap<String, Resolution<V>>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut slots: IndexMap<String, Option<Resolution<V>>> = names.into_iter().map(|name| (name.into(), None)).collect();

		let mut fanout = FanoutSet::new(TaskClass::Fanout);
		for (index, name) in slots.keys().enumerate() {
			let graph = self.clone();
			let name = name.clone();
			fanout.spawn(async move { (index, graph.resolve(&name).await) });
		}

		while let Some(joined) = fanout.join_next().await {
			match joined {
				Ok((index, resolution)) => {
					if let Some((_, slot)) = slots.get_index_mut(index) {
						*slot = Some(resolution);
					}
				}
				Err(err) => tracing::warn!(graph = %self.config().label, error = %err, "depgraph.batch.join_failed"),
			}
		}

		slots
			.into_iter()
			.map(|(name, slot)| {
				let resolution = slot.unwrap_or_else(|| {
					Err(ResolveError::Aborted {
						node: name.clone(),
						reason: "batch resolution task did not complete".to_string(),
					})
				});
				(name, resolution)
			})
			.collect()
	}

	/// Synchronous [`DepGraph::resolve_map`].
	///
	/// # Panics
	///
	/// Panics when called from within an async task.
	pub fn resolve_map_blocking<I, S>(&self, names: I) -> IndexMap<String, Resolution<V>>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		crate::spawn::block_on(self.resolve_map(names))
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use crate::{DepGraph, NO_DEPS, ResolveError};

	#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
	async fn keys_follow_input_order_and_collapse_duplicates() {
		let graph = DepGraph::<u32>::new();
		graph.register("a", NO_DEPS, |_| Ok::<_, &str>(1)).unwrap();
		graph.register("b", NO_DEPS, |_| Ok::<_, &str>(2)).unwrap();

		let resolved = graph.resolve_map(["b", "ghost", "a", "b"]).await;
		let keys: Vec<_> = resolved.keys().map(String::as_str).collect();
		assert_eq!(keys, vec!["b", "ghost", "a"]);
		assert_eq!(resolved["a"].as_deref().ok(), Some(&1));
		assert_eq!(resolved["b"].as_deref().ok(), Some(&2));
		assert!(matches!(&resolved["ghost"], Err(ResolveError::NotFound(name)) if name == "ghost"));
	}

	#[test]
	fn loaders_can_batch_resolve_other_nodes() {
		let graph = DepGraph::<String>::new();
		graph.register("quz", NO_DEPS, |_| Ok::<_, &str>("quz".to_string())).unwrap();
		graph.register("baz", NO_DEPS, |_| Ok::<_, &str>("baz".to_string())).unwrap();

		let inner = graph.clone();
		graph
			.register("foo", NO_DEPS, move |_| {
				let resolved = inner.resolve_map_blocking(["baz", "quz"]);
				let parts: Result<Vec<_>, _> = resolved.values().map(|r| r.as_deref().cloned()).collect();
				parts.map(|parts| parts.join("+")).map_err(|err| err.to_string())
			})
			.unwrap();

		let value = graph.resolve_blocking("foo").unwrap();
		assert_eq!(value.as_str(), "baz+quz");
	}
}
