use std::fs::Metadata;
use std::path::{Path, PathBuf};

use stackrunner_events::TerminationLog;

use crate::error::StackError;
use crate::model::ChangeSetDescription;

pub const CURRENT_TEMPLATE_FILE: &str = "current-template.yaml";
pub const NEW_TEMPLATE_FILE: &str = "cfn.yaml";
pub const CHANGE_SET_FILE: &str = "change-set.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    PreChangeSetApply,
    DryRun,
}

impl HookKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::PreChangeSetApply => "pre-change-set-apply",
            Self::DryRun => "dry-run",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookRun {
    Ran,
    Skipped,
}

/// Files handed to a hook as its three positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookInputs {
    pub current_template: PathBuf,
    pub new_template: PathBuf,
    pub change_set: PathBuf,
}

/// Operator-supplied executables run between change-set creation and
/// execution.
#[derive(Debug, Clone)]
pub struct ChangeSetHooks {
    hooks_dir: PathBuf,
    work_dir: PathBuf,
}

impl ChangeSetHooks {
    pub fn new(hooks_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            hooks_dir: hooks_dir.into(),
            work_dir: work_dir.into(),
        }
    }

    pub fn hooks_dir(&self) -> &Path {
        &self.hooks_dir
    }

    pub async fn write_inputs(
        &self,
        current_template: &str,
        new_template: &str,
        change_set: &ChangeSetDescription,
    ) -> Result<HookInputs, StackError> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let inputs = HookInputs {
            current_template: self.work_dir.join(CURRENT_TEMPLATE_FILE),
            new_template: self.work_dir.join(NEW_TEMPLATE_FILE),
            change_set: self.work_dir.join(CHANGE_SET_FILE),
        };

        tokio::fs::write(&inputs.current_template, current_template).await?;
        tokio::fs::write(&inputs.new_template, new_template).await?;
        tokio::fs::write(&inputs.change_set, serde_json::to_vec_pretty(change_set)?).await?;

        Ok(inputs)
    }

    pub async fn run(
        &self,
        kind: HookKind,
        inputs: &HookInputs,
        termination_log: Option<&TerminationLog>,
    ) -> Result<HookRun, StackError> {
        let executable = self.hooks_dir.join(kind.file_name());
        let metadata = match tokio::fs::metadata(&executable).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(hook = kind.file_name(), path = %executable.display(), "no hook found");
                return Ok(HookRun::Skipped);
            }
            Err(e) => return Err(e.into()),
        };
        if !is_executable(&metadata) {
            tracing::info!(
                hook = kind.file_name(),
                path = %executable.display(),
                "hook found but not executable, skipping"
            );
            return Ok(HookRun::Skipped);
        }

        tracing::info!(hook = kind.file_name(), "running hook");
        let output = tokio::process::Command::new(&executable)
            .arg(&inputs.current_template)
            .arg(&inputs.new_template)
            .arg(&inputs.change_set)
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::info!(hook = kind.file_name(), "{}", stdout.trim_end());
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            if let Some(log) = termination_log {
                log.write(&stderr).await;
            }
            return Err(StackError::Hook {
                hook: kind.file_name().to_string(),
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(HookRun::Ran)
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(metadata: &Metadata) -> bool {
    metadata.is_file()
}
