use crate::types::OutputFormat;
use crate::views::{Palette, SearchSummary, SessionListJson, SessionRow};
use agscope_runtime::{SearchUpdate, Workspace};
use agscope_types::{Filters, Session};
use anyhow::Result;
use is_terminal::IsTerminal;
use std::io::Write;
use std::sync::Arc;

/// Run a progressive search. Plain output prints each match as it arrives;
/// JSON output is written once the search stops. Ctrl-C cancels the search
/// and keeps whatever matched so far.
pub fn handle(
    workspace: &Workspace,
    filters: Filters,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    workspace.ensure_sessions()?;

    let handle = workspace.start_search(filters)?;
    let canceller = handle.canceller();
    if let Err(e) = ctrlc::set_handler(move || canceller.cancel()) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    let palette = Palette::detect();
    let show_progress = format == OutputFormat::Plain && std::io::stderr().is_terminal();
    let mut matches: Vec<Arc<Session>> = Vec::new();
    let mut limit_reached = false;
    let mut stdout = std::io::stdout().lock();

    for update in handle.updates().iter() {
        match update {
            SearchUpdate::Matches(batch) => {
                for session in batch {
                    if matches.len() >= limit {
                        break;
                    }
                    if format == OutputFormat::Plain {
                        if show_progress {
                            eprint!("\r\x1b[K");
                        }
                        writeln!(stdout, "{}", SessionRow::new(&session, palette))?;
                    }
                    matches.push(session);
                }
                if matches.len() >= limit && !limit_reached {
                    limit_reached = true;
                    handle.cancel();
                }
            }
            SearchUpdate::Progress(progress) => {
                if show_progress {
                    eprint!(
                        "\r\x1b[Kscanned {} of {} sessions",
                        progress.scanned(),
                        progress.total()
                    );
                }
            }
            SearchUpdate::Finished(_) => break,
        }
    }
    if show_progress {
        eprint!("\r\x1b[K");
    }

    let progress = handle.wait();
    tracing::debug!(
        matches = matches.len(),
        scanned = progress.scanned(),
        total = progress.total(),
        state = ?progress.state,
        "search finished"
    );

    match format {
        OutputFormat::Json => {
            let output = SessionListJson::new(&matches).with_progress(progress);
            writeln!(stdout, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        OutputFormat::Plain => {
            stdout.flush()?;
            if limit_reached {
                eprintln!("Showing the first {} matches (--limit)", limit);
            } else {
                eprintln!(
                    "{}",
                    SearchSummary {
                        shown: matches.len(),
                        progress,
                    }
                );
            }
        }
    }

    Ok(())
}
