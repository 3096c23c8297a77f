use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use eyre::{bail, eyre, Result, WrapErr};
use stackrunner_cloudformation::{
    write_outputs, AwsControlPlane, ChangeSetHooks, CleanupOutcome, ControlPlane, DeployOutcome,
    Reconciler, StackWatcher, TemplateSource,
};
use stackrunner_events::{EventSink, JsonLinesSink, OperationKind, TerminationLog, TracingSink};
use stackrunner_storage::{ObjectStore, S3ObjectStore};

use crate::cli::Command;
use crate::config::RunnerConfig;
use crate::synth::CommandTemplateSource;

pub const RUN_DEADLINE: Duration = Duration::from_secs(60 * 60);
pub const CLEANUP_DEADLINE: Duration = Duration::from_secs(30 * 60);

/// Clients and settings shared by every subcommand.
pub struct Context {
    pub config: RunnerConfig,
    pub control_plane: Arc<dyn ControlPlane>,
    pub store: Arc<dyn ObjectStore>,
    pub sink: Arc<dyn EventSink>,
    pub template_source: Arc<dyn TemplateSource>,
    pub reconciler: Reconciler,
}

impl Context {
    pub fn new(
        config: RunnerConfig,
        control_plane: Arc<dyn ControlPlane>,
        store: Arc<dyn ObjectStore>,
        sink: Arc<dyn EventSink>,
        template_source: Arc<dyn TemplateSource>,
    ) -> Self {
        let mut reconciler = Reconciler::new(Arc::clone(&control_plane), config.tags.clone())
            .with_deletion_protection(config.protection.clone())
            .with_template_source(Arc::clone(&template_source))
            .with_termination_log(TerminationLog::new(&config.termination_log))
            .with_dry_run(config.dry_run);
        if let Some(dir) = &config.hooks_dir {
            reconciler = reconciler.with_hooks(ChangeSetHooks::new(dir, config.work_dir()));
        }

        Self {
            config,
            control_plane,
            store,
            sink,
            template_source,
            reconciler,
        }
    }

    /// Build AWS clients from the default credential and region chain.
    pub async fn from_env(config: RunnerConfig) -> Self {
        let sdk_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let sink: Arc<dyn EventSink> = match &config.event_log {
            Some(path) => Arc::new(JsonLinesSink::new(path)),
            None => Arc::new(TracingSink),
        };
        let template_source = Arc::new(CommandTemplateSource::new(
            config.synth_command.clone(),
            config.template_file.clone(),
        ));

        Self::new(
            config,
            Arc::new(AwsControlPlane::from_config(&sdk_config)),
            Arc::new(S3ObjectStore::from_config(&sdk_config)),
            sink,
            template_source,
        )
    }

    fn stack_name(&self) -> &str {
        &self.config.stack_name
    }

    fn watcher(&self, operation: OperationKind) -> StackWatcher {
        StackWatcher::new(
            Arc::clone(&self.control_plane),
            Arc::clone(&self.sink),
            self.stack_name(),
            operation,
            self.config.meta.clone(),
        )
        .with_timings(self.reconciler.timings())
    }
}

pub async fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    match command {
        Command::Run { event } => with_deadline("run", RUN_DEADLINE, run(ctx, event)).await,
        Command::Deploy { template, event } => {
            with_deadline("deploy", RUN_DEADLINE, deploy_file(ctx, &template, event)).await
        }
        Command::Delete => with_deadline("delete", RUN_DEADLINE, delete(ctx)).await,
        Command::EmptyBuckets => {
            with_deadline("empty-buckets", CLEANUP_DEADLINE, empty_buckets(ctx)).await
        }
        Command::Watch { event } => watch(ctx, event).await,
    }
}

async fn with_deadline(
    name: &str,
    deadline: Duration,
    fut: impl Future<Output = Result<()>>,
) -> Result<()> {
    tokio::time::timeout(deadline, fut)
        .await
        .map_err(|_| eyre!("{name} did not finish within {} minutes", deadline.as_secs() / 60))?
}

/// Settle, then reconcile according to the event hint with the watcher
/// reporting alongside.
pub async fn run(ctx: &Context, event: OperationKind) -> Result<()> {
    ctx.reconciler
        .wait_until_settled(ctx.stack_name())
        .await
        .wrap_err("waiting for the stack to settle")?;

    let watcher = ctx.watcher(event).spawn();
    let result = match event {
        OperationKind::Create | OperationKind::Update => {
            match ctx.template_source.render().await {
                Ok(template) => deploy_and_publish(ctx, &template).await,
                Err(e) => Err(eyre::Report::new(e).wrap_err("synthesising template")),
            }
        }
        OperationKind::Delete => teardown(ctx).await,
    };
    watcher.stop().await;
    result
}

async fn deploy_file(ctx: &Context, template: &Path, event: Option<OperationKind>) -> Result<()> {
    let body = tokio::fs::read_to_string(template)
        .await
        .wrap_err_with(|| format!("reading template {}", template.display()))?;

    let event = match event {
        Some(event) => event,
        None => deploy_kind(ctx).await?,
    };
    let watcher = ctx.watcher(event).spawn();
    let result = deploy_and_publish(ctx, &body).await;
    watcher.stop().await;
    result
}

/// Create for a stack that does not exist yet, update otherwise.
async fn deploy_kind(ctx: &Context) -> Result<OperationKind> {
    let snapshot = ctx.reconciler.snapshot(ctx.stack_name()).await?;
    Ok(if snapshot.exists {
        OperationKind::Update
    } else {
        OperationKind::Create
    })
}

async fn deploy_and_publish(ctx: &Context, template: &str) -> Result<()> {
    let outcome = ctx.reconciler.deploy(ctx.stack_name(), template).await?;
    match &outcome {
        DeployOutcome::NoChanges => tracing::info!(stack = %ctx.stack_name(), "stack is up to date"),
        DeployOutcome::DryRun { .. } => {
            tracing::info!(stack = %ctx.stack_name(), "dry run finished");
            return Ok(());
        }
        DeployOutcome::Applied {
            change_set_type,
            change_set,
        } => tracing::info!(
            stack = %ctx.stack_name(),
            change_set_type = %change_set_type,
            changes = change_set.changes.len(),
            "stack deployed"
        ),
    }

    write_outputs(
        ctx.control_plane.as_ref(),
        ctx.stack_name(),
        &ctx.config.outputs_file,
    )
    .await?;

    if let Some(hook) = &ctx.config.render_hook {
        run_render_hook(hook).await?;
    }
    Ok(())
}

async fn run_render_hook(hook: &Path) -> Result<()> {
    tracing::info!(hook = %hook.display(), "running render hook");
    let status = tokio::process::Command::new(hook)
        .status()
        .await
        .wrap_err_with(|| format!("starting render hook {}", hook.display()))?;
    if !status.success() {
        bail!("render hook {} exited with {status}", hook.display());
    }
    Ok(())
}

async fn teardown(ctx: &Context) -> Result<()> {
    empty_buckets(ctx).await?;
    ctx.reconciler.delete(ctx.stack_name()).await?;
    Ok(())
}

async fn delete(ctx: &Context) -> Result<()> {
    let watcher = ctx.watcher(OperationKind::Delete).spawn();
    let result = teardown(ctx).await;
    watcher.stop().await;
    result
}

async fn empty_buckets(ctx: &Context) -> Result<()> {
    let outcome = ctx
        .reconciler
        .empty_stack_buckets(ctx.store.as_ref(), ctx.stack_name())
        .await?;
    match outcome {
        CleanupOutcome::Emptied { buckets } => {
            tracing::info!(stack = %ctx.stack_name(), buckets = buckets.len(), "buckets emptied");
        }
        CleanupOutcome::DryRun { buckets } => {
            tracing::info!(stack = %ctx.stack_name(), buckets = ?buckets, "dry run, buckets left as they are");
        }
        CleanupOutcome::StackMissing | CleanupOutcome::Protected => {}
    }
    Ok(())
}

async fn watch(ctx: &Context, event: OperationKind) -> Result<()> {
    let watcher = ctx.watcher(event).spawn();
    tokio::signal::ctrl_c()
        .await
        .wrap_err("waiting for interrupt")?;
    watcher.stop().await;
    Ok(())
}
