//! stackrunner
//!
//! Command-line runner that reconciles one CloudFormation stack per
//! invocation: settle, synthesise, deploy or delete, and report progress.

pub mod cli;
pub mod commands;
pub mod config;
pub mod synth;
pub mod telemetry;

pub use crate::cli::{Cli, Command, GlobalArgs, LogFormat};
pub use crate::commands::{dispatch, Context};
pub use crate::config::RunnerConfig;
pub use crate::synth::CommandTemplateSource;
