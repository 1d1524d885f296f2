use serde::Deserialize;

/// How a node waits on its fanned-out dependencies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
	/// Wait for every dependency to settle before aggregating.
	#[default]
	WaitAll,
	/// Stop waiting once the outcome is decided: the lowest-index dependency
	/// that has not succeeded is a failure.
	///
	/// Reports the same failing dependency as [`JoinPolicy::WaitAll`]. The
	/// dependencies left behind keep resolving and cache their result.
	FailFast,
}

impl JoinPolicy {
	pub(crate) const fn as_str(self) -> &'static str {
		match self {
			Self::WaitAll => "wait_all",
			Self::FailFast => "fail_fast",
		}
	}
}

/// Per-graph configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
	/// Label attached to every trace event emitted by the graph.
	pub label: String,
	/// How nodes wait on their dependencies.
	pub join_policy: JoinPolicy,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			label: "depgraph".to_string(),
			join_policy: JoinPolicy::default(),
		}
	}
}

impl GraphConfig {
	/// Replaces the trace label.
	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.label = label.into();
		self
	}

	/// Replaces the dependency join policy.
	pub fn with_join_policy(mut self, join_policy: JoinPolicy) -> Self {
		self.join_policy = join_policy;
		self
	}
}
