use crate::types::OutputFormat;
use crate::views::{Palette, SessionListJson, SessionListView};
use agscope_runtime::Workspace;
use agscope_types::{Filters, Source};
use anyhow::Result;

pub fn handle(
    workspace: &Workspace,
    source: Option<Source>,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    workspace.ensure_sessions()?;

    let mut filters = Filters::new();
    if let Some(source) = source {
        filters = filters.source(source);
    }
    let mut sessions = workspace.index().filtered(&filters);
    sessions.truncate(limit);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&SessionListJson::new(&sessions))?
            );
        }
        OutputFormat::Plain => {
            if sessions.is_empty() {
                println!("No sessions found.");
            } else {
                print!("{}", SessionListView::new(&sessions, Palette::detect()));
            }
        }
    }

    Ok(())
}
