//! Normalizes the control plane's dual sync/async submit responses.
//!
//! A submit call may answer `200 OK` with a result that is already usable, or
//! `202 Accepted` with a handle to poll. [`resolve`] turns either shape into a
//! [`Submission`] exactly once, at the boundary.

use std::fmt;

use crate::api::models::{Task, ValidationResult};
use crate::api::Envelope;
use crate::error::{FleetError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Validation,
    Generation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Validation => f.write_str("validation"),
            OperationKind::Generation => f.write_str("generation"),
        }
    }
}

/// A submitted operation that still has to be waited on.
///
/// The id is never empty; the fields are private so a pending operation
/// cannot change after it has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOperation {
    id:   String,
    kind: OperationKind,
}

impl PendingOperation {
    pub fn new(id: impl Into<String>, kind: OperationKind) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(FleetError::InvalidResponse(format!(
                "{kind} response carries an empty operation id"
            )));
        }
        Ok(PendingOperation { id, kind })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl fmt::Display for PendingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.id)
    }
}

/// Exactly one of: a result that needs no polling, or an operation to poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission<T> {
    Immediate(T),
    Pending(PendingOperation),
}

/// Payloads that can name the operation they belong to.
pub trait OperationHandle {
    fn operation_id(&self) -> Option<&str>;
}

impl OperationHandle for ValidationResult {
    fn operation_id(&self) -> Option<&str> {
        self.validation_id.as_deref()
    }
}

impl OperationHandle for Task {
    fn operation_id(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

/// Resolve a submit envelope.
///
/// The accepted branch wins when present and must carry a non-empty id.
/// A lone sync branch is returned as-is. An envelope with neither branch is
/// a contract violation and is never retried.
pub fn resolve<T: OperationHandle>(envelope: Envelope<T>, kind: OperationKind) -> Result<Submission<T>> {
    if let Some(accepted) = envelope.accepted {
        let id = accepted.operation_id().unwrap_or_default();
        return PendingOperation::new(id, kind).map(Submission::Pending);
    }
    match envelope.sync {
        Some(result) => Ok(Submission::Immediate(result)),
        None => Err(FleetError::InvalidResponse(format!(
            "{kind} response carries neither a result nor an accepted task"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{TaskStatus, ValidationStatus};

    fn validation(id: Option<&str>, status: ValidationStatus) -> ValidationResult {
        ValidationResult {
            validation_id:        id.map(String::from),
            overall_status:       status,
            per_resource_results: vec![],
        }
    }

    #[test]
    fn accepted_branch_becomes_pending() {
        let env = Envelope::accepted(validation(Some("V1"), ValidationStatus::InProgress));
        let sub = resolve(env, OperationKind::Validation).unwrap();
        match sub {
            Submission::Pending(op) => {
                assert_eq!(op.id(), "V1");
                assert_eq!(op.kind(), OperationKind::Validation);
            }
            other => panic!("expected pending, got {other:?}"),
        }
    }

    #[test]
    fn accepted_branch_wins_over_sync() {
        let env = Envelope {
            sync:     Some(validation(Some("S"), ValidationStatus::Succeeded)),
            accepted: Some(validation(Some("A"), ValidationStatus::InProgress)),
        };
        let sub = resolve(env, OperationKind::Validation).unwrap();
        assert!(matches!(sub, Submission::Pending(ref op) if op.id() == "A"));
    }

    #[test]
    fn sync_branch_is_immediate() {
        let env = Envelope::sync(validation(None, ValidationStatus::Succeeded));
        let sub = resolve(env, OperationKind::Validation).unwrap();
        assert!(matches!(sub, Submission::Immediate(_)));
    }

    #[test]
    fn empty_envelope_is_invalid() {
        let env: Envelope<Task> = Envelope { sync: None, accepted: None };
        let err = resolve(env, OperationKind::Generation).unwrap_err();
        assert!(matches!(err, FleetError::InvalidResponse(_)));
    }

    #[test]
    fn accepted_without_id_is_invalid() {
        let env = Envelope::accepted(Task {
            id:     String::new(),
            name:   None,
            status: TaskStatus::Pending,
            errors: vec![],
        });
        let err = resolve(env, OperationKind::Generation).unwrap_err();
        assert!(matches!(err, FleetError::InvalidResponse(_)));

        let env = Envelope::accepted(validation(None, ValidationStatus::InProgress));
        assert!(resolve(env, OperationKind::Validation).is_err());
    }
}
