//! Waiting on control-plane tasks (`GET /v1/tasks/{id}`).

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use super::resolve::PendingOperation;
use super::waiter::{OperationState, OperationStatus, PollingWaiter};
use crate::api::models::{Task, TaskError, TaskStatus};
use crate::api::ControlPlane;
use crate::error::{FleetError, Result};

pub fn task_state(status: &TaskStatus) -> OperationState {
    match status {
        TaskStatus::Pending | TaskStatus::InProgress => OperationState::Running,
        TaskStatus::Successful                       => OperationState::Succeeded,
        TaskStatus::Failed | TaskStatus::Cancelled
        | TaskStatus::Other(_)                       => OperationState::Failed,
    }
}

fn snapshot(task: Task) -> OperationStatus<Task> {
    OperationStatus {
        pending_operation_id: task.id.clone(),
        state:                task_state(&task.status),
        result:               Some(task),
    }
}

/// `CODE: message`, or whichever half the control plane supplied.
fn describe(error: &TaskError) -> Option<String> {
    match (&error.error_code, &error.message) {
        (Some(code), Some(msg)) => Some(format!("{code}: {msg}")),
        (None, Some(msg))       => Some(msg.clone()),
        (Some(code), None)      => Some(code.clone()),
        (None, None)            => None,
    }
}

/// Interpret a terminal task. With `stop_on_failure` a failed task is an
/// error; otherwise it is only logged.
pub fn settle(task: &Task, stop_on_failure: bool) -> Result<()> {
    if task_state(&task.status) == OperationState::Succeeded {
        info!("task {} completed successfully", task.id);
        return Ok(());
    }
    let messages: Vec<String> = task.errors.iter().filter_map(describe).collect();
    if stop_on_failure {
        return Err(FleetError::TaskFailed {
            task_id:  task.id.clone(),
            status:   task.status.to_string(),
            messages,
        });
    }
    warn!("task {} finished with status {}: {}", task.id, task.status, messages.join("; "));
    Ok(())
}

/// Poll `op` until its task reaches a terminal status, then [`settle`] it.
pub async fn await_task<C: ControlPlane + ?Sized>(
    control_plane:   &C,
    waiter:          &PollingWaiter,
    op:              &PendingOperation,
    cancel:          &CancellationToken,
    stop_on_failure: bool,
) -> Result<()> {
    let status = waiter
        .wait(op, cancel, |id| async move {
            control_plane.get_task(&id).await.map(snapshot)
        })
        .await?;
    let task = status.result.ok_or_else(|| {
        FleetError::InvalidResponse(format!("task {} finished without a payload", op.id()))
    })?;
    settle(&task, stop_on_failure)
}
