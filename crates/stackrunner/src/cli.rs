//! Command-line interface definitions for the `stackrunner` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stackrunner_events::OperationKind;
use stackrunner_events::termination::DEFAULT_TERMINATION_LOG;

pub const DEFAULT_SYNTH_COMMAND: &str = "cdk synth --path-metadata false --lookups false";

#[derive(Debug, Parser)]
#[command(
    name = "stackrunner",
    about = "Reconcile a CloudFormation stack with a synthesised template",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Settle, then create/update or delete the stack depending on the event.
    Run {
        /// Which lifecycle operation triggered this run.
        #[arg(long, env = "RUNNER_EVENT")]
        event: OperationKind,
    },
    /// Deploy a pre-rendered template.
    Deploy {
        #[arg(long, value_name = "PATH")]
        template: PathBuf,
        /// Event phrase for progress reports. Defaults to create for a new
        /// stack and update otherwise.
        #[arg(long, env = "RUNNER_EVENT")]
        event: Option<OperationKind>,
    },
    /// Empty the stack's buckets and delete it.
    Delete,
    /// Empty every versioned bucket owned by the stack.
    EmptyBuckets,
    /// Report resource progress until interrupted.
    Watch {
        #[arg(long, env = "RUNNER_EVENT", default_value = "update")]
        event: OperationKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Name of the stack to reconcile.
    #[arg(long, env = "RUNNER_STACK_NAME")]
    pub stack_name: String,

    /// Project the stack belongs to; also the event namespace.
    #[arg(long, env = "RUNNER_PROJECT", default_value = "")]
    pub project: String,

    #[arg(long, env = "RUNNER_APP_NAME", default_value = "")]
    pub app_name: String,

    #[arg(long, env = "RUNNER_ACCOUNT", default_value = "")]
    pub account: String,

    /// Deletion-protection setting. Only "true" keeps a protected stack.
    #[arg(long, env = "RUNNER_DELETE_PROTECTION")]
    pub delete_protection: Option<String>,

    #[arg(long, env = "RUNNER_TERMINATION_LOG", default_value = DEFAULT_TERMINATION_LOG)]
    pub termination_log: PathBuf,

    /// Append progress events to this file as JSON lines instead of logging
    /// them.
    #[arg(long, env = "RUNNER_EVENT_LOG")]
    pub event_log: Option<PathBuf>,

    #[arg(long, env = "RUNNER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Command whose stdout is the template to deploy.
    #[arg(long, env = "RUNNER_SYNTH_COMMAND", default_value = DEFAULT_SYNTH_COMMAND)]
    pub synth_command: String,

    #[arg(long, env = "RUNNER_TEMPLATE_FILE", default_value = "cfn.yaml")]
    pub template_file: PathBuf,

    #[arg(long, env = "RUNNER_OUTPUTS_FILE", default_value = "outputs.json")]
    pub outputs_file: PathBuf,

    /// Executable run after outputs are written.
    #[arg(long, env = "RUNNER_RENDER_HOOK")]
    pub render_hook: Option<PathBuf>,

    /// Directory holding `pre-change-set-apply` and `dry-run` executables.
    #[arg(long, env = "RUNNER_HOOKS_DIR")]
    pub hooks_dir: Option<PathBuf>,

    /// Create change sets and run the dry-run hook without executing them.
    /// Nothing is deleted or emptied.
    #[arg(long, env = "RUNNER_DRY_RUN")]
    pub dry_run: bool,
}
