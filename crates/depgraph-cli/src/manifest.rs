use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use depgraph::{DepGraph, GraphConfig};
use serde::Deserialize;

const SAMPLE: &str = include_str!("../graphs/sample.toml");

/// Graph description loaded from TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
	#[serde(default)]
	pub graph: GraphConfig,
	/// Node resolved when no `--target` is given.
	pub target: Option<String>,
	#[serde(default, rename = "node")]
	pub nodes: Vec<NodeSpec>,
}

/// One `[[node]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
	pub name: String,
	#[serde(default)]
	pub deps: Vec<String>,
	/// Value produced by the loader; defaults to the node name.
	pub value: Option<String>,
	/// When set, the loader fails with this message.
	pub fail: Option<String>,
	#[serde(default)]
	pub delay_ms: u64,
}

impl Manifest {
	pub fn parse(text: &str) -> anyhow::Result<Self> {
		toml::from_str(text).context("invalid graph manifest")
	}

	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let text = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
		Self::parse(&text).with_context(|| format!("failed to load {}", path.display()))
	}

	/// The graph from the original demo program.
	pub fn sample() -> anyhow::Result<Self> {
		Self::parse(SAMPLE)
	}

	pub fn default_target(&self) -> &str {
		self.target.as_deref().unwrap_or("foo")
	}

	/// Registers every node on a fresh graph.
	pub fn build(&self, config: GraphConfig) -> anyhow::Result<DepGraph<String>> {
		let graph = DepGraph::with_config(config);
		for spec in &self.nodes {
			let loader = spec.clone();
			graph.register(spec.name.clone(), spec.deps.clone(), move |values| loader.load(&values))?;
		}
		Ok(graph)
	}
}

impl NodeSpec {
	fn load(self, values: &[Arc<String>]) -> Result<String, String> {
		if self.delay_ms > 0 {
			std::thread::sleep(Duration::from_millis(self.delay_ms));
		}
		let inputs: Vec<String> = self.deps.iter().zip(values).map(|(dep, value)| format!("{dep}={value}")).collect();
		tracing::info!(node = %self.name, inputs = %inputs.join(", "), "loading");

		match self.fail {
			Some(message) => Err(message),
			None => Ok(self.value.unwrap_or(self.name)),
		}
	}
}
