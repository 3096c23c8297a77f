#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jiff::Timestamp;
use stackrunner_cloudformation::{
    BoxFuture, ChangeSetDescription, ChangeSetStatus, ChangeSetType, ControlPlane,
    CreateChangeSetRequest, Reconciler, ResourceChange, StackDescription, StackError, StackEvent,
    StackOutput, StackResource, StackStatus, TagSet, Tag, Timings,
};
use stackrunner_events::{BoxFuture as SinkFuture, EventError, EventSink, ProgressEvent};

pub const STACK: &str = "demo";
pub const TEMPLATE: &str = "Resources:\n  Bucket:\n    Type: AWS::S3::Bucket\n";
pub const NO_CHANGES: &str = "The submitted information didn't contain changes. Submit different information to create a change set.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DescribeStack,
    CreateChangeSet(ChangeSetType),
    DescribeChangeSet,
    ExecuteChangeSet,
    DeleteStack,
    RollbackStack,
    DescribeStackResources,
    DescribeStackEvents,
    GetTemplate,
}

#[derive(Debug, Clone)]
pub struct FakeStack {
    pub status: StackStatus,
    pub deletion_time: Option<Timestamp>,
    pub tags: Vec<Tag>,
    pub template: String,
    pub outputs: Vec<StackOutput>,
    pub resources: Vec<StackResource>,
    pub events: Vec<StackEvent>,
}

impl FakeStack {
    pub fn new(status: StackStatus) -> Self {
        Self {
            status,
            deletion_time: None,
            tags: Vec::new(),
            template: String::new(),
            outputs: Vec::new(),
            resources: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.push(Tag::new(key, value));
        self
    }

    pub fn with_deletion_time(mut self) -> Self {
        self.deletion_time = Some(Timestamp::UNIX_EPOCH);
        self
    }

    pub fn with_resources(mut self, resources: Vec<StackResource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<StackOutput>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_events(mut self, events: Vec<StackEvent>) -> Self {
        self.events = events;
        self
    }
}

/// Scripted answer for one resource listing.
#[derive(Debug, Clone)]
pub enum Listing {
    Resources(Vec<StackResource>),
    Missing,
    Failure,
}

struct PendingChangeSet {
    description: ChangeSetDescription,
    change_set_type: ChangeSetType,
    template: String,
    tags: Vec<Tag>,
}

#[derive(Default)]
struct State {
    stack: Option<FakeStack>,
    change_sets: HashMap<String, PendingChangeSet>,
    calls: Vec<Call>,
    next_id: usize,
    created_requests: Vec<CreateChangeSetRequest>,
    status_script: VecDeque<StackStatus>,
    listing_script: VecDeque<Listing>,
    change_set_failure: Option<String>,
    change_sets_stalled: bool,
    execute_result: Option<StackStatus>,
    rollback_result: Option<StackStatus>,
}

/// In-memory control plane that behaves like the real service for the
/// paths the reconciler drives, and records every call.
#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<State>,
}

impl FakeControlPlane {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_stack(stack: FakeStack) -> Arc<Self> {
        let fake = Self::default();
        fake.state.lock().unwrap().stack = Some(stack);
        Arc::new(fake)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn change_sets_created(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::CreateChangeSet(_)))
            .count()
    }

    /// Index of the first matching call.
    pub fn position(&self, matcher: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(matcher)
    }

    pub fn created_requests(&self) -> Vec<CreateChangeSetRequest> {
        self.state.lock().unwrap().created_requests.clone()
    }

    pub fn stack(&self) -> Option<FakeStack> {
        self.state.lock().unwrap().stack.clone()
    }

    /// Statuses reported by successive describe-stack calls before the
    /// stack's own status takes over again.
    pub fn script_statuses(&self, statuses: Vec<StackStatus>) {
        self.state.lock().unwrap().status_script = statuses.into();
    }

    pub fn script_listings(&self, listings: Vec<Listing>) {
        self.state.lock().unwrap().listing_script = listings.into();
    }

    pub fn fail_change_sets_with(&self, reason: &str) {
        self.state.lock().unwrap().change_set_failure = Some(reason.to_string());
    }

    /// Change sets stay in `CREATE_IN_PROGRESS` forever.
    pub fn stall_change_sets(&self) {
        self.state.lock().unwrap().change_sets_stalled = true;
    }

    /// Append events to the stack's history, as the service does while an
    /// operation runs.
    pub fn push_events(&self, events: Vec<StackEvent>) {
        if let Some(stack) = self.state.lock().unwrap().stack.as_mut() {
            stack.events.extend(events);
        }
    }

    pub fn execution_ends_in(&self, status: StackStatus) {
        self.state.lock().unwrap().execute_result = Some(status);
    }

    pub fn rollback_ends_in(&self, status: StackStatus) {
        self.state.lock().unwrap().rollback_result = Some(status);
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn not_found(stack_name: &str) -> StackError {
        StackError::NotFound {
            stack_name: stack_name.to_string(),
        }
    }
}

impl ControlPlane for FakeControlPlane {
    fn describe_stack<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<StackDescription, StackError>> {
        Box::pin(async move {
            self.record(Call::DescribeStack);
            let mut state = self.state.lock().unwrap();
            let scripted = state.status_script.pop_front();
            let stack = state
                .stack
                .as_ref()
                .ok_or_else(|| Self::not_found(stack_name))?;
            Ok(StackDescription {
                stack_name: stack_name.to_string(),
                stack_id: Some(format!("arn:aws:cloudformation:stack/{stack_name}")),
                status: scripted.unwrap_or_else(|| stack.status.clone()),
                status_reason: None,
                deletion_time: stack.deletion_time,
                outputs: stack.outputs.clone(),
                tags: stack.tags.clone(),
            })
        })
    }

    fn create_change_set<'a>(
        &'a self,
        request: &'a CreateChangeSetRequest,
    ) -> BoxFuture<'a, Result<String, StackError>> {
        Box::pin(async move {
            self.record(Call::CreateChangeSet(request.change_set_type));
            let mut state = self.state.lock().unwrap();
            state.created_requests.push(request.clone());
            state.next_id += 1;
            let id = format!("cs-{}", state.next_id);

            let unchanged = state
                .stack
                .as_ref()
                .is_some_and(|s| s.status != StackStatus::ReviewInProgress && s.template == request.template_body);
            let (status, reason) = match state.change_set_failure.clone() {
                _ if state.change_sets_stalled => (ChangeSetStatus::CreateInProgress, None),
                Some(reason) => (ChangeSetStatus::Failed, Some(reason)),
                None if unchanged => (ChangeSetStatus::Failed, Some(NO_CHANGES.to_string())),
                None => (ChangeSetStatus::CreateComplete, None),
            };
            let changes = if status == ChangeSetStatus::CreateComplete {
                vec![ResourceChange {
                    action: match request.change_set_type {
                        ChangeSetType::Create => "Add".to_string(),
                        ChangeSetType::Update => "Modify".to_string(),
                    },
                    logical_resource_id: "Bucket".to_string(),
                    resource_type: Some("AWS::S3::Bucket".to_string()),
                    replacement: None,
                }]
            } else {
                Vec::new()
            };

            if request.change_set_type == ChangeSetType::Create && state.stack.is_none() {
                state.stack = Some(FakeStack::new(StackStatus::ReviewInProgress));
            }

            state.change_sets.insert(
                id.clone(),
                PendingChangeSet {
                    description: ChangeSetDescription {
                        change_set_id: id.clone(),
                        change_set_name: Some(request.change_set_name.clone()),
                        stack_name: request.stack_name.clone(),
                        status,
                        status_reason: reason,
                        changes,
                    },
                    change_set_type: request.change_set_type,
                    template: request.template_body.clone(),
                    tags: request.tags.clone(),
                },
            );
            Ok(id)
        })
    }

    fn describe_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_id: &'a str,
    ) -> BoxFuture<'a, Result<ChangeSetDescription, StackError>> {
        Box::pin(async move {
            self.record(Call::DescribeChangeSet);
            let state = self.state.lock().unwrap();
            state
                .change_sets
                .get(change_set_id)
                .map(|cs| cs.description.clone())
                .ok_or_else(|| Self::not_found(stack_name))
        })
    }

    fn execute_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_id: &'a str,
    ) -> BoxFuture<'a, Result<(), StackError>> {
        Box::pin(async move {
            self.record(Call::ExecuteChangeSet);
            let mut state = self.state.lock().unwrap();
            let (change_set_type, template, tags) = {
                let pending = state
                    .change_sets
                    .get(change_set_id)
                    .ok_or_else(|| Self::not_found(stack_name))?;
                (pending.change_set_type, pending.template.clone(), pending.tags.clone())
            };
            let final_status = state.execute_result.clone().unwrap_or(match change_set_type {
                ChangeSetType::Create => StackStatus::CreateComplete,
                ChangeSetType::Update => StackStatus::UpdateComplete,
            });
            let stack = state
                .stack
                .get_or_insert_with(|| FakeStack::new(StackStatus::ReviewInProgress));
            stack.status = final_status;
            stack.template = template;
            stack.tags = tags;
            Ok(())
        })
    }

    fn delete_stack<'a>(&'a self, _stack_name: &'a str) -> BoxFuture<'a, Result<(), StackError>> {
        Box::pin(async move {
            self.record(Call::DeleteStack);
            self.state.lock().unwrap().stack = None;
            Ok(())
        })
    }

    fn rollback_stack<'a>(&'a self, stack_name: &'a str) -> BoxFuture<'a, Result<(), StackError>> {
        Box::pin(async move {
            self.record(Call::RollbackStack);
            let mut state = self.state.lock().unwrap();
            let result = state
                .rollback_result
                .clone()
                .unwrap_or(StackStatus::RollbackComplete);
            let stack = state
                .stack
                .as_mut()
                .ok_or_else(|| Self::not_found(stack_name))?;
            stack.status = result;
            Ok(())
        })
    }

    fn describe_stack_resources<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StackResource>, StackError>> {
        Box::pin(async move {
            self.record(Call::DescribeStackResources);
            let mut state = self.state.lock().unwrap();
            match state.listing_script.pop_front() {
                Some(Listing::Resources(resources)) => Ok(resources),
                Some(Listing::Missing) => Err(Self::not_found(stack_name)),
                Some(Listing::Failure) => Err(StackError::Aws {
                    stack_name: stack_name.to_string(),
                    operation: "DescribeStackResources".to_string(),
                    message: "Rate exceeded".to_string(),
                }),
                None => state
                    .stack
                    .as_ref()
                    .map(|s| s.resources.clone())
                    .ok_or_else(|| Self::not_found(stack_name)),
            }
        })
    }

    fn describe_stack_events<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StackEvent>, StackError>> {
        Box::pin(async move {
            self.record(Call::DescribeStackEvents);
            let state = self.state.lock().unwrap();
            let stack = state
                .stack
                .as_ref()
                .ok_or_else(|| Self::not_found(stack_name))?;
            // newest first, like the service
            let mut events = stack.events.clone();
            events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Ok(events)
        })
    }

    fn get_template<'a>(&'a self, _stack_name: &'a str) -> BoxFuture<'a, Result<String, StackError>> {
        Box::pin(async move {
            self.record(Call::GetTemplate);
            let state = self.state.lock().unwrap();
            Ok(state
                .stack
                .as_ref()
                .map(|s| s.template.clone())
                .unwrap_or_default())
        })
    }
}

/// Sink that keeps every event, optionally failing each call.
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<ProgressEvent>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn create_event<'a>(&'a self, event: &'a ProgressEvent) -> SinkFuture<'a, Result<(), EventError>> {
        Box::pin(async move {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                return Err(EventError::Io(std::io::Error::other("sink unavailable")));
            }
            Ok(())
        })
    }
}

pub fn fast_timings() -> Timings {
    let tick = Duration::from_millis(1);
    Timings {
        change_set_timeout: Duration::from_secs(2),
        change_set_poll_interval: tick,
        stack_operation_timeout: Duration::from_secs(2),
        stack_poll_interval: tick,
        settle_poll_interval: tick,
        watcher_poll_interval: tick,
        watcher_retry_interval: tick,
        event_poll_interval: tick,
    }
}

/// Timings whose bounded waits give up after a few polls.
pub fn short_timeouts() -> Timings {
    Timings {
        change_set_timeout: Duration::from_millis(30),
        stack_operation_timeout: Duration::from_millis(30),
        ..fast_timings()
    }
}

pub fn reconciler(control_plane: &Arc<FakeControlPlane>) -> Reconciler {
    Reconciler::new(control_plane.clone(), TagSet::new().with("team", "platform"))
        .with_timings(fast_timings())
}
