use agscope_engine::{RenderMode, RenderOptions};
use agscope_runtime::Workspace;
use anyhow::{Context, Result};
use std::io::Write;

pub fn handle(
    workspace: &Workspace,
    id_prefix: &str,
    mode: RenderMode,
    timestamps: bool,
    meta: bool,
) -> Result<()> {
    workspace.ensure_sessions()?;

    let session = workspace.find(id_prefix)?;
    let session = if session.is_lightweight() {
        workspace
            .reload(&session.id)
            .with_context(|| format!("Failed to parse {}", session.file_path.display()))?
    } else {
        session
    };

    let options = RenderOptions::new(mode)
        .with_timestamps(timestamps)
        .with_meta(meta);
    let transcript = workspace.transcript(&session, &options);

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(transcript.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
