use std::path::Path;

use crate::control_plane::ControlPlane;
use crate::error::StackError;
use crate::model::StackOutput;
use crate::snapshot::get_snapshot;

/// Write the stack's outputs to `path` as pretty-printed JSON.
pub async fn write_outputs(
    control_plane: &dyn ControlPlane,
    stack_name: &str,
    path: &Path,
) -> Result<Vec<StackOutput>, StackError> {
    let snapshot = get_snapshot(control_plane, stack_name).await?;
    if !snapshot.exists {
        return Err(StackError::NotFound {
            stack_name: stack_name.to_string(),
        });
    }

    let json = serde_json::to_vec_pretty(&snapshot.outputs)?;
    tokio::fs::write(path, json).await?;
    tracing::info!(
        stack = %stack_name,
        path = %path.display(),
        outputs = snapshot.outputs.len(),
        "stack outputs written"
    );

    Ok(snapshot.outputs)
}
