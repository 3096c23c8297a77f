use std::path::{Path, PathBuf};

use stackrunner_cloudformation::{BoxFuture, StackError, TemplateSource};

/// Produces the template by running a shell command and capturing its
/// stdout. The result is also written to the template file.
#[derive(Debug, Clone)]
pub struct CommandTemplateSource {
    command: String,
    template_file: PathBuf,
}

impl CommandTemplateSource {
    pub fn new(command: impl Into<String>, template_file: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            template_file: template_file.into(),
        }
    }

    pub fn template_file(&self) -> &Path {
        &self.template_file
    }

    async fn synthesise(&self) -> Result<String, StackError> {
        tracing::info!(command = %self.command, "synthesising template");
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StackError::Template(format!(
                "`{}` exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let template = String::from_utf8(output.stdout)
            .map_err(|e| StackError::Template(format!("template is not valid UTF-8: {e}")))?;
        tokio::fs::write(&self.template_file, &template).await?;
        tracing::info!(path = %self.template_file.display(), bytes = template.len(), "template written");
        Ok(template)
    }
}

impl TemplateSource for CommandTemplateSource {
    fn render(&self) -> BoxFuture<'_, Result<String, StackError>> {
        Box::pin(self.synthesise())
    }
}
