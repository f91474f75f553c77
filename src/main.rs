// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use serde_json::json;
use std::env;
use std::sync::Arc;
use the_loopwood::backends::local::LocalComponentFactory;
use the_loopwood::config::{load_and_validate_config, RuntimeBuilder};
use the_loopwood::engine::RunRequest;
use the_loopwood::jobs::JobQueue;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: the-loopwood <flow.yaml|flow.toml> [--start ID] [--stop ID] [--poll]";

#[derive(Debug, Default)]
struct CliArgs {
    flow: String,
    start: Option<String>,
    stop: Option<String>,
    poll: bool,
}

impl CliArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut cli = CliArgs::default();
        let mut flow = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--start" => cli.start = Some(args.next().context("--start needs a vertex id")?),
                "--stop" => cli.stop = Some(args.next().context("--stop needs a vertex id")?),
                "--poll" => cli.poll = true,
                "-h" | "--help" => bail!(USAGE),
                other if other.starts_with("--") => bail!("Unknown option '{}'\n{}", other, USAGE),
                other if flow.is_none() => flow = Some(other.to_string()),
                other => bail!("Unexpected argument '{}'\n{}", other, USAGE),
            }
        }
        cli.flow = flow.context(USAGE)?;
        Ok(cli)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the event records only
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse(env::args().skip(1))?;
    let flow = load_and_validate_config(&args.flow)?;
    let (graph, orchestrator, jobs) =
        RuntimeBuilder::from_config(&flow, Arc::new(LocalComponentFactory::registry()))?;
    let request = RunRequest {
        start_vertex_id: args.start.or_else(|| flow.start.clone()),
        stop_vertex_id: args.stop.or_else(|| flow.stop.clone()),
        session_id: None,
    };

    let jobs = Arc::new(jobs);
    let job_id = Arc::new(orchestrator).spawn_run(&jobs, Arc::new(graph), request)?;
    let job = jobs.get_job(&job_id)?;

    {
        let jobs = Arc::clone(&jobs);
        let job_id = job_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                if let Err(e) = jobs.cancel_job(&job_id) {
                    tracing::warn!(error = %e, "Failed to cancel job");
                }
            }
        });
    }

    let channel = job.channel();
    if args.poll {
        loop {
            let batch = channel.drain(flow.engine.jobs.drain_timeout()).await;
            println!("{}", json!({ "events": batch.events, "closed": batch.closed }));
            if batch.closed {
                break;
            }
        }
    } else {
        let mut stdout = tokio::io::stdout();
        channel.write_ndjson(&mut stdout).await?;
    }

    job.wait().await;
    jobs.prune_finished(flow.engine.jobs.finished_job_ttl());
    Ok(())
}
