use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::ProvideErrorMetadata;
use aws_sdk_cloudformation::primitives::DateTime;
use aws_sdk_cloudformation::types as cfn;
use jiff::Timestamp;
use stackrunner_storage::format_err_chain;

use crate::control_plane::{BoxFuture, ControlPlane};
use crate::error::StackError;
use crate::model::{
    Capability, ChangeSetDescription, ChangeSetStatus, ChangeSetType, CreateChangeSetRequest,
    ResourceChange, ResourceStatus, StackDescription, StackEvent, StackOutput, StackResource,
    StackStatus, Tag,
};

/// [`ControlPlane`] backed by the AWS CloudFormation SDK.
#[derive(Debug, Clone)]
pub struct AwsControlPlane {
    client: Client,
}

impl AwsControlPlane {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

/// CloudFormation reports a missing stack as a `ValidationError` whose
/// message ends in "does not exist".
pub fn is_missing_stack_message(message: &str) -> bool {
    message.contains("does not exist")
}

fn service_error<E>(stack_name: &str, operation: &str, err: E) -> StackError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    if err.code() == Some("ValidationError") && err.message().is_some_and(is_missing_stack_message)
    {
        return StackError::NotFound {
            stack_name: stack_name.to_string(),
        };
    }
    StackError::aws(stack_name, operation, format_err_chain(&err))
}

fn timestamp(dt: &DateTime) -> Option<Timestamp> {
    Timestamp::new(dt.secs(), dt.subsec_nanos() as i32).ok()
}

fn stack_description(stack: &cfn::Stack) -> StackDescription {
    StackDescription {
        stack_name: stack.stack_name().unwrap_or_default().to_string(),
        stack_id: stack.stack_id().map(String::from),
        status: stack
            .stack_status()
            .map(|s| StackStatus::from(s.as_str()))
            .unwrap_or_else(|| StackStatus::Other(String::new())),
        status_reason: stack.stack_status_reason().map(String::from),
        deletion_time: stack.deletion_time().and_then(timestamp),
        outputs: stack
            .outputs()
            .iter()
            .map(|o| StackOutput {
                output_key: o.output_key().map(String::from),
                output_value: o.output_value().map(String::from),
                description: o.description().map(String::from),
                export_name: o.export_name().map(String::from),
            })
            .collect(),
        tags: stack
            .tags()
            .iter()
            .filter_map(|t| Some(Tag::new(t.key()?, t.value().unwrap_or_default())))
            .collect(),
    }
}

fn stack_resource(summary: &cfn::StackResourceSummary) -> StackResource {
    StackResource {
        logical_resource_id: summary.logical_resource_id().unwrap_or_default().to_string(),
        physical_resource_id: summary.physical_resource_id().map(String::from),
        resource_type: summary.resource_type().unwrap_or_default().to_string(),
        status: summary
            .resource_status()
            .map(|s| ResourceStatus::from(s.as_str()))
            .unwrap_or_else(|| ResourceStatus::Other(String::new())),
    }
}

fn resource_change(change: &cfn::ResourceChange) -> ResourceChange {
    ResourceChange {
        action: change
            .action()
            .map(|a| a.as_str().to_string())
            .unwrap_or_default(),
        logical_resource_id: change.logical_resource_id().unwrap_or_default().to_string(),
        resource_type: change.resource_type().map(String::from),
        replacement: change.replacement().map(|r| r.as_str().to_string()),
    }
}

fn sdk_capability(capability: Capability) -> cfn::Capability {
    match capability {
        Capability::Iam => cfn::Capability::CapabilityIam,
        Capability::NamedIam => cfn::Capability::CapabilityNamedIam,
    }
}

fn sdk_change_set_type(change_set_type: ChangeSetType) -> cfn::ChangeSetType {
    match change_set_type {
        ChangeSetType::Create => cfn::ChangeSetType::Create,
        ChangeSetType::Update => cfn::ChangeSetType::Update,
    }
}

impl ControlPlane for AwsControlPlane {
    fn describe_stack<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<StackDescription, StackError>> {
        Box::pin(async move {
            let resp = self
                .client
                .describe_stacks()
                .stack_name(stack_name)
                .send()
                .await
                .map_err(|e| service_error(stack_name, "DescribeStacks", e.into_service_error()))?;

            resp.stacks()
                .first()
                .map(stack_description)
                .ok_or_else(|| StackError::NotFound {
                    stack_name: stack_name.to_string(),
                })
        })
    }

    fn create_change_set<'a>(
        &'a self,
        request: &'a CreateChangeSetRequest,
    ) -> BoxFuture<'a, Result<String, StackError>> {
        Box::pin(async move {
            let stack_name = request.stack_name.as_str();
            let tags = request
                .tags
                .iter()
                .map(|t| cfn::Tag::builder().key(&t.key).value(&t.value).build())
                .collect::<Vec<_>>();

            let resp = self
                .client
                .create_change_set()
                .stack_name(stack_name)
                .change_set_name(&request.change_set_name)
                .change_set_type(sdk_change_set_type(request.change_set_type))
                .template_body(&request.template_body)
                .set_capabilities(Some(
                    request.capabilities.iter().copied().map(sdk_capability).collect(),
                ))
                .set_tags(Some(tags))
                .send()
                .await
                .map_err(|e| service_error(stack_name, "CreateChangeSet", e.into_service_error()))?;

            resp.id().map(String::from).ok_or_else(|| {
                StackError::aws(stack_name, "CreateChangeSet", "response carried no change set id")
            })
        })
    }

    fn describe_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_id: &'a str,
    ) -> BoxFuture<'a, Result<ChangeSetDescription, StackError>> {
        Box::pin(async move {
            let mut description: Option<ChangeSetDescription> = None;
            let mut next_token: Option<String> = None;

            loop {
                let resp = self
                    .client
                    .describe_change_set()
                    .stack_name(stack_name)
                    .change_set_name(change_set_id)
                    .set_next_token(next_token.take())
                    .send()
                    .await
                    .map_err(|e| {
                        service_error(stack_name, "DescribeChangeSet", e.into_service_error())
                    })?;

                let changes = resp
                    .changes()
                    .iter()
                    .filter_map(|c| c.resource_change())
                    .map(resource_change);

                match description.as_mut() {
                    Some(d) => d.changes.extend(changes),
                    None => {
                        description = Some(ChangeSetDescription {
                            change_set_id: resp.change_set_id().unwrap_or(change_set_id).to_string(),
                            change_set_name: resp.change_set_name().map(String::from),
                            stack_name: stack_name.to_string(),
                            status: resp
                                .status()
                                .map(|s| ChangeSetStatus::from(s.as_str()))
                                .unwrap_or_else(|| ChangeSetStatus::Other(String::new())),
                            status_reason: resp.status_reason().map(String::from),
                            changes: changes.collect(),
                        });
                    }
                }

                match resp.next_token() {
                    Some(token) => next_token = Some(token.to_string()),
                    None => break,
                }
            }

            description.ok_or_else(|| {
                StackError::aws(stack_name, "DescribeChangeSet", "empty response")
            })
        })
    }

    fn execute_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_id: &'a str,
    ) -> BoxFuture<'a, Result<(), StackError>> {
        Box::pin(async move {
            self.client
                .execute_change_set()
                .stack_name(stack_name)
                .change_set_name(change_set_id)
                .send()
                .await
                .map_err(|e| service_error(stack_name, "ExecuteChangeSet", e.into_service_error()))?;
            Ok(())
        })
    }

    fn delete_stack<'a>(&'a self, stack_name: &'a str) -> BoxFuture<'a, Result<(), StackError>> {
        Box::pin(async move {
            self.client
                .delete_stack()
                .stack_name(stack_name)
                .send()
                .await
                .map_err(|e| service_error(stack_name, "DeleteStack", e.into_service_error()))?;
            Ok(())
        })
    }

    fn rollback_stack<'a>(&'a self, stack_name: &'a str) -> BoxFuture<'a, Result<(), StackError>> {
        Box::pin(async move {
            self.client
                .rollback_stack()
                .stack_name(stack_name)
                .send()
                .await
                .map_err(|e| service_error(stack_name, "RollbackStack", e.into_service_error()))?;
            Ok(())
        })
    }

    fn describe_stack_resources<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StackResource>, StackError>> {
        Box::pin(async move {
            let mut resources = Vec::new();
            let mut next_token: Option<String> = None;

            loop {
                let resp = self
                    .client
                    .list_stack_resources()
                    .stack_name(stack_name)
                    .set_next_token(next_token.take())
                    .send()
                    .await
                    .map_err(|e| {
                        service_error(stack_name, "ListStackResources", e.into_service_error())
                    })?;

                resources.extend(resp.stack_resource_summaries().iter().map(stack_resource));

                match resp.next_token() {
                    Some(token) => next_token = Some(token.to_string()),
                    None => break,
                }
            }

            Ok(resources)
        })
    }

    fn describe_stack_events<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StackEvent>, StackError>> {
        Box::pin(async move {
            let resp = self
                .client
                .describe_stack_events()
                .stack_name(stack_name)
                .send()
                .await
                .map_err(|e| {
                    service_error(stack_name, "DescribeStackEvents", e.into_service_error())
                })?;

            Ok(resp
                .stack_events()
                .iter()
                .filter_map(|e| {
                    Some(StackEvent {
                        event_id: e.event_id()?.to_string(),
                        timestamp: e.timestamp().and_then(timestamp)?,
                        logical_resource_id: e.logical_resource_id().map(String::from),
                        resource_type: e.resource_type().map(String::from),
                        resource_status: e
                            .resource_status()
                            .map(|s| ResourceStatus::from(s.as_str())),
                        reason: e.resource_status_reason().map(String::from),
                    })
                })
                .collect())
        })
    }

    fn get_template<'a>(&'a self, stack_name: &'a str) -> BoxFuture<'a, Result<String, StackError>> {
        Box::pin(async move {
            let result = self
                .client
                .get_template()
                .stack_name(stack_name)
                .send()
                .await
                .map_err(|e| service_error(stack_name, "GetTemplate", e.into_service_error()));

            match result {
                Ok(resp) => Ok(resp.template_body().unwrap_or_default().to_string()),
                Err(StackError::NotFound { .. }) => Ok(String::new()),
                Err(e) => Err(e),
            }
        })
    }
}
