use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Error type produced by loaders.
pub type LoaderError = Box<dyn Error + Send + Sync>;

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegisterError {
	/// A node with this name is already registered.
	#[error("node '{0}' already exists")]
	AlreadyExists(String),
}

/// Resolution failures.
///
/// Failures are cached on the node that produced them, so the type is cheap
/// to clone: inner failures are shared behind [`Arc`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
	/// The requested name is not registered.
	#[error("node '{0}' not in graph")]
	NotFound(String),

	/// A declared dependency was never registered; the loader did not run.
	#[error("node '{node}' depends on '{dependency}', which is not in graph")]
	MissingDependency {
		/// Node declaring the dependency.
		node: String,
		/// The unregistered name.
		dependency: String,
	},

	/// The first failed dependency, in declared order.
	#[error("failed to resolve '{node}': dependency '{dependency}' failed")]
	DependencyFailed {
		/// Node whose dependency failed.
		node: String,
		/// Name of the failed dependency.
		dependency: String,
		/// The dependency's cached failure.
		source: Arc<ResolveError>,
	},

	/// The node's own loader returned an error.
	#[error("loader for '{node}' failed: {source}")]
	LoaderFailed {
		/// Node whose loader failed.
		node: String,
		/// Error returned by the loader.
		source: Arc<dyn Error + Send + Sync>,
	},

	/// The node's own loader panicked.
	#[error("loader for '{node}' panicked: {message}")]
	LoaderPanicked {
		/// Node whose loader panicked.
		node: String,
		/// Panic payload, when it was a string.
		message: String,
	},

	/// The work resolving the node was dropped before it finished, for
	/// instance because its runtime shut down.
	#[error("resolution of '{node}' aborted: {reason}")]
	Aborted {
		/// Node whose resolution was cut short.
		node: String,
		/// What was dropped.
		reason: String,
	},
}

impl ResolveError {
	/// Name of the node this failure is reported for.
	pub fn node(&self) -> &str {
		match self {
			Self::NotFound(node)
			| Self::MissingDependency { node, .. }
			| Self::DependencyFailed { node, .. }
			| Self::LoaderFailed { node, .. }
			| Self::LoaderPanicked { node, .. }
			| Self::Aborted { node, .. } => node,
		}
	}

	/// Node names from the requested node down to the node that failed first.
	pub fn path(&self) -> Vec<&str> {
		let mut path = vec![self.node()];
		let mut current = self;
		while let Self::DependencyFailed { source, .. } = current {
			current = source.as_ref();
			path.push(current.node());
		}
		path
	}

	/// Innermost failure along the `DependencyFailed` chain.
	pub fn root_cause(&self) -> &ResolveError {
		let mut current = self;
		while let Self::DependencyFailed { source, .. } = current {
			current = source.as_ref();
		}
		current
	}

	/// Multi-line rendering of the whole [`Error::source`] chain, outer to inner.
	pub fn report(&self) -> Report<'_> {
		Report(self)
	}
}

/// Display adapter returned by [`ResolveError::report`].
pub struct Report<'a>(&'a ResolveError);

impl fmt::Display for Report<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)?;
		let mut source = self.0.source();
		while let Some(err) = source {
			write!(f, "\n  caused by: {err}")?;
			source = err.source();
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn chain() -> ResolveError {
		let loader: LoaderError = "disk full".into();
		ResolveError::DependencyFailed {
			node: "app".into(),
			dependency: "config".into(),
			source: Arc::new(ResolveError::DependencyFailed {
				node: "config".into(),
				dependency: "fs".into(),
				source: Arc::new(ResolveError::LoaderFailed {
					node: "fs".into(),
					source: Arc::from(loader),
				}),
			}),
		}
	}

	#[test]
	fn path_walks_outer_to_inner() {
		assert_eq!(chain().path(), vec!["app", "config", "fs"]);
	}

	#[test]
	fn root_cause_is_the_loader_failure() {
		let err = chain();
		assert!(matches!(err.root_cause(), ResolveError::LoaderFailed { node, .. } if node == "fs"));
	}

	#[test]
	fn report_lists_every_level() {
		let report = chain().report().to_string();
		let lines: Vec<_> = report.lines().collect();
		assert_eq!(
			lines,
			vec![
				"failed to resolve 'app': dependency 'config' failed",
				"  caused by: failed to resolve 'config': dependency 'fs' failed",
				"  caused by: loader for 'fs' failed: disk full",
				"  caused by: disk full",
			]
		);
	}

	#[test]
	fn terminal_errors_have_single_element_path() {
		let err = ResolveError::NotFound("ghost".into());
		assert_eq!(err.path(), vec!["ghost"]);
		assert_eq!(err.to_string(), "node 'ghost' not in graph");
	}
}
