use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use super::result_shape::normalize_json;
use crate::domain::dataset::Dataset;
use crate::domain::provider::{AnalysisProvider, ProviderError, ProviderOutput};
use crate::infrastructure::export::export_csv;

/// Analysis delegated to an external program.
///
/// The dataset goes to the program's stdin as CSV; the program answers on
/// stdout with JSON, either `[narrative, flags, report]` or a bare dataset.
#[derive(Debug, Clone)]
pub struct ExternalCommandProvider {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalCommandProvider {
    /// Resolve `command` to an existing file, searching `PATH` for bare names.
    pub fn locate(command: &str, args: &[String]) -> Result<Self, ProviderError> {
        let program = resolve_program(command)
            .ok_or_else(|| ProviderError::Discovery(format!("{} not found", command)))?;

        let name = program
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(command)
            .to_string();

        Ok(Self {
            name,
            program,
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl AnalysisProvider for ExternalCommandProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(&self, dataset: &Dataset) -> Result<ProviderOutput, ProviderError> {
        let input = export_csv(dataset)
            .map_err(|e| ProviderError::Invocation(format!("failed to encode dataset: {}", e)))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ProviderError::Invocation(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProviderError::Invocation("stdin unavailable".to_string()))?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock us
        let writer = thread::spawn(move || stdin.write_all(&input));

        let output = child
            .wait_with_output()
            .map_err(|e| ProviderError::Invocation(format!("failed to wait for {}: {}", self.name, e)))?;

        match writer.join() {
            Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => {
                debug!(provider = %self.name, error = %e, "Failed to write dataset to provider stdin");
            }
            Err(_) => debug!(provider = %self.name, "Provider stdin writer panicked"),
            _ => {}
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Invocation(format!(
                "{} exited with {}: {}",
                self.name,
                output.status,
                stderr.trim()
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            ProviderError::Invocation(format!("{} did not print valid JSON: {}", self.name, e))
        })?;

        Ok(normalize_json(value))
    }
}

fn resolve_program(command: &str) -> Option<PathBuf> {
    let path = Path::new(command);
    if path.is_absolute() || path.components().count() > 1 {
        return path.is_file().then(|| path.to_path_buf());
    }

    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path).find_map(|dir| {
        let candidates = [
            dir.join(command),
            dir.join(format!("{}{}", command, std::env::consts::EXE_SUFFIX)),
        ];
        candidates.into_iter().find(|candidate| candidate.is_file())
    })
}
