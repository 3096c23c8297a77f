use std::sync::Arc;

use stackrunner_events::TerminationLog;

use crate::control_plane::ControlPlane;
use crate::error::StackError;
use crate::hooks::ChangeSetHooks;
use crate::snapshot::{get_snapshot, StackSnapshot};
use crate::tags::{DeletionProtection, TagSet};
use crate::template::TemplateSource;
use crate::wait::{wait_until_settled, Timings};

/// Drives stacks towards the desired state.
///
/// Holds everything fixed for the run: the control plane, the tags applied
/// to every change set, and the configured deletion-protection setting.
///
/// In dry-run mode change sets are created but never executed, and nothing
/// is deleted or emptied.
pub struct Reconciler {
    pub(crate) control_plane: Arc<dyn ControlPlane>,
    pub(crate) tags: TagSet,
    pub(crate) protection: DeletionProtection,
    pub(crate) timings: Timings,
    pub(crate) template_source: Option<Arc<dyn TemplateSource>>,
    pub(crate) hooks: Option<ChangeSetHooks>,
    pub(crate) termination_log: Option<TerminationLog>,
    pub(crate) dry_run: bool,
}

impl Reconciler {
    pub fn new(control_plane: Arc<dyn ControlPlane>, tags: TagSet) -> Self {
        Self {
            control_plane,
            tags,
            protection: DeletionProtection::unset(),
            timings: Timings::default(),
            template_source: None,
            hooks: None,
            termination_log: None,
            dry_run: false,
        }
    }

    pub fn with_deletion_protection(mut self, protection: DeletionProtection) -> Self {
        self.protection = protection;
        self
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Source of the current template, used to redeploy a protected stack
    /// before deleting it.
    pub fn with_template_source(mut self, source: Arc<dyn TemplateSource>) -> Self {
        self.template_source = Some(source);
        self
    }

    pub fn with_hooks(mut self, hooks: ChangeSetHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn with_termination_log(mut self, log: TerminationLog) -> Self {
        self.termination_log = Some(log);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn control_plane(&self) -> &dyn ControlPlane {
        self.control_plane.as_ref()
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub fn protection(&self) -> &DeletionProtection {
        &self.protection
    }

    pub fn timings(&self) -> &Timings {
        &self.timings
    }

    pub async fn snapshot(&self, stack_name: &str) -> Result<StackSnapshot, StackError> {
        get_snapshot(self.control_plane(), stack_name).await
    }

    pub async fn wait_until_settled(&self, stack_name: &str) -> Result<(), StackError> {
        wait_until_settled(self.control_plane(), stack_name, &self.timings).await
    }
}
