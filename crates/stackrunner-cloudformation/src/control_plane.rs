use std::future::Future;
use std::pin::Pin;

use crate::error::StackError;
use crate::model::{
    ChangeSetDescription, CreateChangeSetRequest, StackDescription, StackEvent, StackResource,
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The remote stack service, reduced to the calls the reconciler makes.
///
/// Implementations map a missing stack to [`StackError::NotFound`] on every
/// call that names a stack; callers rely on that to tell "gone" apart from
/// other failures.
pub trait ControlPlane: Send + Sync {
    fn describe_stack<'a>(&'a self, stack_name: &'a str)
    -> BoxFuture<'a, Result<StackDescription, StackError>>;

    /// Returns the new change set's identifier.
    fn create_change_set<'a>(
        &'a self,
        request: &'a CreateChangeSetRequest,
    ) -> BoxFuture<'a, Result<String, StackError>>;

    fn describe_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_id: &'a str,
    ) -> BoxFuture<'a, Result<ChangeSetDescription, StackError>>;

    fn execute_change_set<'a>(
        &'a self,
        stack_name: &'a str,
        change_set_id: &'a str,
    ) -> BoxFuture<'a, Result<(), StackError>>;

    fn delete_stack<'a>(&'a self, stack_name: &'a str) -> BoxFuture<'a, Result<(), StackError>>;

    fn rollback_stack<'a>(&'a self, stack_name: &'a str) -> BoxFuture<'a, Result<(), StackError>>;

    fn describe_stack_resources<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StackResource>, StackError>>;

    /// Most recent events first, as the service returns them.
    fn describe_stack_events<'a>(
        &'a self,
        stack_name: &'a str,
    ) -> BoxFuture<'a, Result<Vec<StackEvent>, StackError>>;

    /// The deployed template body, or an empty string when the stack does
    /// not exist.
    fn get_template<'a>(&'a self, stack_name: &'a str) -> BoxFuture<'a, Result<String, StackError>>;
}
