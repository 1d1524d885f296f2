use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::RegisterError;
use crate::node::Node;

/// Name to node mapping shared by every clone of a graph.
///
/// Lookups take the read lock; insertion checks and inserts under a single
/// write lock, so a reader never observes a half-registered node and two
/// racing registrations of one name cannot both succeed.
pub(crate) struct Registry<V> {
	inner: Arc<RwLock<FxHashMap<String, Arc<Node<V>>>>>,
}

impl<V> Clone for Registry<V> {
	fn clone(&self) -> Self {
		Self { inner: Arc::clone(&self.inner) }
	}
}

impl<V> Default for Registry<V> {
	fn default() -> Self {
		Self {
			inner: Arc::new(RwLock::new(FxHashMap::default())),
		}
	}
}

impl<V> Registry<V>
where
	V: Send + Sync + 'static,
{
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts `node` unless its name is taken. The existing entry is never touched.
	pub fn insert(&self, node: Node<V>) -> Result<Arc<Node<V>>, RegisterError> {
		let mut guard = self.inner.write();
		match guard.entry(node.name().to_string()) {
			Entry::Occupied(entry) => Err(RegisterError::AlreadyExists(entry.key().clone())),
			Entry::Vacant(entry) => Ok(Arc::clone(entry.insert(Arc::new(node)))),
		}
	}

	pub fn lookup(&self, name: &str) -> Option<Arc<Node<V>>> {
		self.inner.read().get(name).cloned()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.inner.read().contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.inner.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().is_empty()
	}

	/// Registered names, sorted.
	pub fn names(&self) -> Vec<String> {
		let mut names: Vec<_> = self.inner.read().keys().cloned().collect();
		names.sort();
		names
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Barrier;

	use pretty_assertions::assert_eq;

	use super::*;
	use crate::error::LoaderError;
	use crate::node::Loader;

	fn node(name: &str, value: u32) -> Node<u32> {
		Node::new(name.to_string(), Vec::new(), Loader::Blocking(Box::new(move |_: Vec<Arc<u32>>| Ok::<_, LoaderError>(value))))
	}

	#[test]
	fn duplicate_insert_keeps_existing() {
		let registry = Registry::new();
		let first = registry.insert(node("a", 1)).unwrap();
		assert_eq!(registry.insert(node("a", 2)).unwrap_err(), RegisterError::AlreadyExists("a".into()));
		assert!(Arc::ptr_eq(&first, &registry.lookup("a").unwrap()));
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn lookup_of_unknown_name_does_not_insert() {
		let registry: Registry<u32> = Registry::new();
		assert!(registry.lookup("ghost").is_none());
		assert!(!registry.contains("ghost"));
		assert!(registry.is_empty());
	}

	#[test]
	fn names_are_sorted() {
		let registry = Registry::new();
		for name in ["c", "a", "b"] {
			registry.insert(node(name, 0)).unwrap();
		}
		assert_eq!(registry.names(), vec!["a", "b", "c"]);
	}

	#[test]
	fn racing_inserts_admit_exactly_one() {
		const THREADS: usize = 8;
		let registry = Registry::new();
		let barrier = Arc::new(Barrier::new(THREADS));
		let handles: Vec<_> = (0..THREADS as u32)
			.map(|i| {
				let registry = registry.clone();
				let barrier = Arc::clone(&barrier);
				std::thread::spawn(move || {
					barrier.wait();
					registry.insert(node("shared", i)).is_ok()
				})
			})
			.collect();
		let winners = handles.into_iter().map(|h| h.join().unwrap()).filter(|won| *won).count();
		assert_eq!(winners, 1);
		assert_eq!(registry.len(), 1);
	}
}
