use crate::control_plane::BoxFuture;
use crate::error::StackError;

/// Produces the template to deploy.
///
/// Deletion of a protected stack redeploys the current template first, so
/// the reconciler needs a way to obtain one on demand.
pub trait TemplateSource: Send + Sync {
    fn render(&self) -> BoxFuture<'_, Result<String, StackError>>;
}

/// A template already held in memory.
#[derive(Debug, Clone)]
pub struct StaticTemplate(String);

impl StaticTemplate {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }
}

impl TemplateSource for StaticTemplate {
    fn render(&self) -> BoxFuture<'_, Result<String, StackError>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}
