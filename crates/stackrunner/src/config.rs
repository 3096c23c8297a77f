use std::path::PathBuf;

use eyre::{ensure, Result};
use stackrunner_cloudformation::{DeletionProtection, TagSet};
use stackrunner_events::EventMeta;

use crate::cli::GlobalArgs;

/// Settings fixed for the whole run, resolved once from the command line
/// and environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub stack_name: String,
    pub protection: DeletionProtection,
    pub tags: TagSet,
    pub meta: EventMeta,
    pub termination_log: PathBuf,
    pub event_log: Option<PathBuf>,
    pub synth_command: String,
    pub template_file: PathBuf,
    pub outputs_file: PathBuf,
    pub render_hook: Option<PathBuf>,
    pub hooks_dir: Option<PathBuf>,
    pub dry_run: bool,
}

impl RunnerConfig {
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        let stack_name = args.stack_name.trim().to_string();
        ensure!(!stack_name.is_empty(), "stack name must not be empty");

        let protection = DeletionProtection::new(args.delete_protection.clone());
        let tags = TagSet::managed(&args.project, &args.app_name, &args.account, &protection);
        let app_name = if args.app_name.is_empty() {
            stack_name.clone()
        } else {
            args.app_name.clone()
        };

        Ok(Self {
            meta: EventMeta::new(&args.project, app_name),
            stack_name,
            protection,
            tags,
            termination_log: args.termination_log.clone(),
            event_log: args.event_log.clone(),
            synth_command: args.synth_command.clone(),
            template_file: args.template_file.clone(),
            outputs_file: args.outputs_file.clone(),
            render_hook: args.render_hook.clone(),
            hooks_dir: args.hooks_dir.clone(),
            dry_run: args.dry_run,
        })
    }

    /// Directory the hook input files are written to: next to the template.
    pub fn work_dir(&self) -> PathBuf {
        match self.template_file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}
