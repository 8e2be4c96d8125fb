//! flowviz - inspect trace flow graphs from the terminal
//!
//! # Usage
//!
//! ```bash
//! # Recent traces for one service over the last 6 hours
//! flowviz traces --service checkout --range 6h
//!
//! # Laid-out, classified flow graph of one trace
//! flowviz show 4bf92f3577b34da6
//! flowviz show 4bf92f3577b34da6 --json
//!
//! # Ask the backend for an explanation
//! flowviz explain 4bf92f3577b34da6
//!
//! # Service call topology over the last 24 hours
//! flowviz topology --range 24h
//!
//! # Offline: lay out a saved payload
//! flowviz layout flow.json
//! ```

mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use flow_client::{FlowApi, FlowApiConfig, HttpFlowClient, DEFAULT_BOTTLENECK_LIMIT};
use flow_graph::{FlowScene, LayoutEngine};
use flow_types::{RawFlowGraph, TimeRange, TraceFilters};

#[derive(Parser)]
#[command(name = "flowviz")]
#[command(version)]
#[command(about = "Inspect distributed-trace flow graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Tracing backend base URL (including /api)
    #[arg(long, global = true, env = "FLOW_API_BASE_URL")]
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List recent traces with summary stats
    Traces {
        /// Only traces rooted at this service
        #[arg(short, long)]
        service: Option<String>,

        /// Lookback window: 15m, 1h, 6h, 24h
        #[arg(short, long)]
        range: Option<TimeRange>,

        /// Maximum traces to list
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Fetch one trace and print its laid-out flow graph
    Show {
        trace_id: String,

        /// Print render data as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate an explanation for one trace
    Explain { trace_id: String },

    /// List flows with bottlenecks, or the bottlenecks of one trace
    Bottlenecks {
        /// Show the bottlenecks detected in this trace
        #[arg(short, long)]
        trace: Option<String>,

        /// Lookback window: 15m, 1h, 6h, 24h
        #[arg(short, long)]
        range: Option<TimeRange>,

        #[arg(short, long, default_value_t = DEFAULT_BOTTLENECK_LIMIT)]
        limit: u32,
    },

    /// Lay out the service-to-service call topology
    Topology {
        /// Lookback window: 15m, 1h, 6h, 24h
        #[arg(short, long)]
        range: Option<TimeRange>,
    },

    /// Lay out a flow graph payload saved to a file (no backend needed)
    Layout {
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flowviz=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = FlowApiConfig::from_env();
    if let Some(url) = cli.base_url {
        config = config.with_base_url(url);
    }

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &FlowApiConfig) -> Result<()> {
    let client = || -> Result<HttpFlowClient> {
        let client = HttpFlowClient::from_config(config)?;
        tracing::debug!(base_url = client.base_url(), "using tracing backend");
        Ok(client)
    };

    match command {
        Commands::Traces {
            service,
            range,
            limit,
        } => {
            let filters = TraceFilters {
                service_name: service,
                time_range: range.unwrap_or(config.lookback),
            };
            let limit = limit.unwrap_or(config.trace_limit);
            cmd_traces(&client()?, &filters, limit).await
        }
        Commands::Show { trace_id, json } => cmd_show(&client()?, &trace_id, json).await,
        Commands::Explain { trace_id } => cmd_explain(&client()?, &trace_id).await,
        Commands::Bottlenecks {
            trace,
            range,
            limit,
        } => {
            let range = range.unwrap_or(config.lookback);
            cmd_bottlenecks(&client()?, trace.as_deref(), range, limit).await
        }
        Commands::Topology { range } => {
            cmd_topology(&client()?, range.unwrap_or(config.lookback)).await
        }
        Commands::Layout { file, json } => cmd_layout(&file, json),
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn cmd_traces(api: &dyn FlowApi, filters: &TraceFilters, limit: u32) -> Result<()> {
    let query = filters.to_query(limit);
    let (traces, stats) = tokio::try_join!(api.list_traces(&query), api.stats(query.lookback_ms))
        .context("failed to load flow data")?;

    println!("{}", output::stats_line(&stats, filters.time_range));
    if traces.is_empty() {
        println!("{}", "No traces found".dimmed());
    }
    for trace in &traces {
        println!("{}", output::trace_line(trace));
    }
    Ok(())
}

async fn cmd_show(api: &dyn FlowApi, trace_id: &str, json: bool) -> Result<()> {
    let raw = api
        .fetch_flow(trace_id)
        .await
        .with_context(|| format!("failed to load flow {trace_id}"))?;
    print_scene(raw, json)
}

async fn cmd_explain(api: &dyn FlowApi, trace_id: &str) -> Result<()> {
    let result = api
        .explain(trace_id)
        .await
        .with_context(|| format!("failed to get explanation for {trace_id}"))?;

    match &result.explanation {
        Some(explanation) => println!("{}", output::explanation_text(explanation)),
        None => println!("{}", "No explanation available".dimmed()),
    }
    if !result.bottlenecks.is_empty() {
        println!("\n{}", "Bottlenecks".bold());
        for b in &result.bottlenecks {
            println!("{}", output::bottleneck_line(b));
        }
    }
    Ok(())
}

async fn cmd_bottlenecks(
    api: &dyn FlowApi,
    trace_id: Option<&str>,
    range: TimeRange,
    limit: u32,
) -> Result<()> {
    match trace_id {
        Some(id) => {
            let bottlenecks = api.flow_bottlenecks(id).await?;
            if bottlenecks.is_empty() {
                println!("{} no bottlenecks in {}", "OK".green(), id);
            }
            for b in &bottlenecks {
                println!("{}", output::bottleneck_line(b));
            }
        }
        None => {
            let flows = api.bottleneck_flows(limit, range.as_millis()).await?;
            if flows.is_empty() {
                println!("{}", "No flows with bottlenecks".dimmed());
            }
            for flow in &flows {
                println!("{}", output::trace_line(flow));
            }
        }
    }
    Ok(())
}

async fn cmd_topology(api: &dyn FlowApi, range: TimeRange) -> Result<()> {
    let graph = api
        .dependencies(range.as_millis())
        .await
        .context("failed to load service dependencies")?;

    let services = graph.service_names();
    let layout = LayoutEngine::new().layout_ids(&services, &graph.call_pairs());
    tracing::debug!(
        services = services.len(),
        dependencies = graph.dependencies.len(),
        "laid out topology"
    );
    print!("{}", output::topology_text(&graph, &layout, range));
    Ok(())
}

fn cmd_layout(file: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let raw: RawFlowGraph = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a flow graph payload", file.display()))?;
    print_scene(raw, json)
}

fn print_scene(raw: RawFlowGraph, json: bool) -> Result<()> {
    let scene = FlowScene::from_raw(raw)?;
    if json {
        let view = scene.view(None, None);
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", output::scene_text(&scene));
    }
    Ok(())
}
