//! Demo driver for the `depgraph` engine.
//!
//! Builds a graph from a TOML manifest (or the built-in sample), resolves the
//! requested targets concurrently and prints each outcome.

mod manifest;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use depgraph::JoinPolicy;
use tracing::info;

use crate::manifest::Manifest;

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "depgraph")]
#[command(about = "Resolve a dependency graph described by a TOML manifest")]
struct Args {
	/// Graph manifest; the built-in sample graph when omitted
	#[arg(short, long, value_name = "PATH")]
	graph: Option<PathBuf>,

	/// Node to resolve, repeatable; defaults to the manifest's `target`
	#[arg(short, long = "target", value_name = "NAME")]
	targets: Vec<String>,

	/// Stop waiting on dependencies once a failure decides the outcome
	#[arg(long)]
	fail_fast: bool,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();

	let subscriber = tracing_subscriber::fmt()
		.with_max_level(if args.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
		.with_writer(std::io::stderr)
		.finish();
	tracing::subscriber::set_global_default(subscriber)?;

	let manifest = match &args.graph {
		Some(path) => Manifest::load(path)?,
		None => Manifest::sample()?,
	};

	let mut config = manifest.graph.clone();
	if args.fail_fast {
		config.join_policy = JoinPolicy::FailFast;
	}
	let graph = manifest.build(config)?;
	info!(nodes = graph.len(), policy = ?graph.config().join_policy, "graph ready");

	let targets = if args.targets.is_empty() {
		vec![manifest.default_target().to_string()]
	} else {
		args.targets
	};

	let mut failed = false;
	for (name, resolution) in graph.resolve_map(targets).await {
		match resolution {
			Ok(value) => println!("{name}: {value}"),
			Err(err) => {
				failed = true;
				eprintln!("{name}: {}", err.report());
			}
		}
	}

	Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
