//! Concurrent, memoized dependency resolution.
//!
//! Callers register named nodes, each listing the nodes it depends on and a
//! loader that computes its value from theirs. Resolving a node resolves its
//! transitive dependencies in parallel, runs every loader at most once no
//! matter how many callers ask concurrently, and caches the outcome, success
//! or failure, forever.
//!
//! A failure anywhere below a node fails the node too, with a
//! [`ResolveError::DependencyFailed`] chain leading down to the original
//! failure.
//!
//! Dependency cycles are not detected; nodes on a cycle never resolve.

#![warn(missing_docs)]

mod batch;
mod class;
mod config;
mod error;
mod graph;
mod join_set;
mod node;
mod panic;
mod registry;
mod resolve;
mod spawn;

use class::TaskClass;
pub use config::{GraphConfig, JoinPolicy};
pub use error::{LoaderError, RegisterError, Report, ResolveError};
pub use graph::DepGraph;
pub use node::{NO_DEPS, NodeHandle, NodeState, Resolution};
