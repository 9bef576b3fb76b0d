//! TestWorld pattern for declarative integration test setup.
//!
//! Provides:
//! - An isolated data directory with a generated `config.toml`
//! - One log root per source, pointed at by that config
//! - Project directories that exist on disk (so cwd resolution succeeds)
//! - CLI execution against the isolated environment

use agscope_core::{normalize_path, project_hash_from_root};
use anyhow::Result;
use assert_cmd::Command;
use filetime::FileTime;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::providers::TestProvider;

/// Declarative test environment builder.
///
/// # Example
/// ```no_run
/// use agscope_testing::{CodexRollout, TestProvider, TestWorld};
///
/// let world = TestWorld::new().with_project("project-a");
/// let dir = world.session_dir(TestProvider::Codex, "project-a");
/// CodexRollout::new("s1").user("hello").write(&dir).unwrap();
///
/// let result = world.run(&["list"]).unwrap();
/// assert!(result.success());
/// ```
pub struct TestWorld {
    temp_dir: TempDir,
    data_dir: PathBuf,
    large_file_threshold: Option<u64>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Create a new isolated test environment with empty log roots.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".agscope");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        for provider in TestProvider::all() {
            let root = temp_dir.path().join(provider.default_log_dir_name());
            std::fs::create_dir_all(root).expect("Failed to create log root");
        }

        let world = Self {
            temp_dir,
            data_dir,
            large_file_threshold: None,
        };
        world.write_config().expect("Failed to write config");
        world
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    pub fn log_root(&self, provider: TestProvider) -> PathBuf {
        self.temp_dir.path().join(provider.default_log_dir_name())
    }

    /// Absolute path of a project directory (relative names resolve under the temp root)
    pub fn project_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Directory where `provider` keeps sessions for `project`
    pub fn session_dir(&self, provider: TestProvider, project: &str) -> PathBuf {
        provider.session_dir(&self.log_root(provider), &self.project_path(project))
    }

    /// Gemini project hash of a project directory
    pub fn project_hash(&self, name: &str) -> String {
        let project = normalize_path(&self.project_path(name));
        project_hash_from_root(&project.to_string_lossy()).to_string()
    }

    /// Create a project directory on disk
    pub fn with_project(self, project_name: &str) -> Self {
        std::fs::create_dir_all(self.project_path(project_name))
            .expect("Failed to create project dir");
        self
    }

    /// Lower the large-file threshold so tests exercise phase 2 with small files
    pub fn with_large_file_threshold(mut self, bytes: u64) -> Self {
        self.large_file_threshold = Some(bytes);
        self.write_config().expect("Failed to write config");
        self
    }

    fn write_config(&self) -> Result<()> {
        let mut content = String::new();
        for provider in TestProvider::all() {
            content.push_str(&format!(
                "[sources.{}]\nenabled = true\nroot = {:?}\n\n",
                provider.name(),
                self.log_root(*provider).to_string_lossy()
            ));
        }
        if let Some(bytes) = self.large_file_threshold {
            content.push_str(&format!(
                "[search]\nlarge_file_threshold_bytes = {}\n",
                bytes
            ));
        }
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Set a file's modification time (seconds since the epoch)
    pub fn set_mtime(&self, path: &Path, unix_secs: i64) -> Result<()> {
        filetime::set_file_mtime(path, FileTime::from_unix_time(unix_secs, 0))?;
        Ok(())
    }

    /// Configure a CLI command with this environment's data dir.
    pub fn configure_command<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        cmd.arg("--data-dir").arg(self.data_dir());
        cmd.current_dir(self.temp_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Execute the `agscope` binary with `args` in this environment.
    #[allow(deprecated)]
    pub fn run(&self, args: &[&str]) -> Result<CliResult> {
        let mut cmd = Command::cargo_bin("agscope")
            .map_err(|e| anyhow::anyhow!("Failed to find agscope binary: {}", e))?;
        self.configure_command(&mut cmd);
        cmd.args(args);

        let output = cmd.output()?;
        Ok(CliResult {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Result of a CLI command execution.
#[derive(Debug)]
pub struct CliResult {
    pub status: std::process::ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CliResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Parse stdout as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.stdout)?)
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }
}
