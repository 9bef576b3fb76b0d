use crate::types::OutputFormat;
use crate::views::{IndexView, Palette};
use agscope_runtime::Workspace;
use anyhow::Result;
use serde_json::json;

pub fn handle(workspace: &Workspace, format: OutputFormat) -> Result<()> {
    let report = workspace.report();

    match format {
        OutputFormat::Json => {
            let counts: serde_json::Map<String, serde_json::Value> = workspace
                .index()
                .counts()
                .into_iter()
                .map(|(source, count)| (source.id().to_string(), json!(count)))
                .collect();
            let output = json!({
                "total": report.indexed(),
                "counts": counts,
                "not_indexable": report.not_indexable(),
                "unreadable": report.unreadable(),
                "corrupt_records": report.corrupt_records(),
                "sources": report.sources,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            print!("{}", IndexView::new(&report, Palette::detect()));
        }
    }

    Ok(())
}
