use super::args::{Cli, Commands};
use super::handlers;
use crate::types::LogLevel;
use agscope_runtime::Workspace;
use agscope_types::Filters;
use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.log_level);

    let workspace = Workspace::open(cli.data_dir.as_deref()).context("Failed to open workspace")?;
    tracing::debug!(data_dir = ?workspace.data_dir(), "workspace opened");

    match cli.command {
        Commands::Index => handlers::index::handle(&workspace, cli.format),

        Commands::List { source, limit } => {
            handlers::list::handle(&workspace, source, limit, cli.format)
        }

        Commands::Search {
            query,
            source,
            since,
            until,
            model,
            kind,
            project,
            limit,
        } => {
            let mut filters = Filters::new().query(query);
            for source in source {
                filters = filters.source(source);
            }
            for kind in kind {
                filters = filters.kind(kind);
            }
            if let Some(since) = since {
                filters = filters.since(since);
            }
            if let Some(until) = until {
                filters = filters.until(until);
            }
            if let Some(model) = model {
                filters = filters.model(model);
            }
            if let Some(project) = project {
                filters = filters.project(project);
            }
            handlers::search::handle(&workspace, filters, limit, cli.format)
        }

        Commands::Show {
            id,
            mode,
            timestamps,
            meta,
        } => handlers::show::handle(&workspace, &id, mode.into(), timestamps, meta),
    }
}

/// `--log-level` wins over `RUST_LOG`; warnings only by default
fn init_logging(level: Option<LogLevel>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level.to_string()),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
