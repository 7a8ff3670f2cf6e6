//! Certificate operations offered to the CLI: validate, generate, read.
//!
//! Flow for the long-running paths:
//!   1. Submit the request
//!   2. Resolve the sync/async response shape into a `Submission`
//!   3. Poll with the `PollingWaiter` unless the result is already final
//!   4. Validation only: aggregate per-resource failures into a report

use std::future::Future;

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use super::fingerprint;
use super::outcome::{self, has_failed, has_finished};
use super::query::CertificateQueryEngine;
use super::resolve::{resolve, OperationKind, PendingOperation, Submission};
use super::tasks;
use super::waiter::{OperationState, OperationStatus, PollingWaiter};
use crate::api::models::{
    Certificate, CertificatesGenerationSpec, Resource, ResourceCertificateSpec, ValidationResult,
};
use crate::api::ControlPlane;
use crate::error::{FleetError, Result};

fn validation_snapshot(result: ValidationResult) -> OperationStatus<ValidationResult> {
    let state = if !has_finished(&result) {
        OperationState::Running
    } else if has_failed(&result) {
        OperationState::Failed
    } else {
        OperationState::Succeeded
    };
    OperationStatus {
        pending_operation_id: result.validation_id.clone().unwrap_or_default(),
        state,
        result: Some(result),
    }
}

/// Send a submit call unless `cancel` has fired, abandoning it if `cancel`
/// fires while the call is in flight.
async fn submit<T, Fut>(kind: OperationKind, cancel: &CancellationToken, call: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(FleetError::Cancelled(format!("{kind} not submitted")));
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FleetError::Cancelled(format!("gave up submitting {kind}"))),
        r = call => r,
    }
}

pub struct CertificateOperations<'a, C: ControlPlane + ?Sized> {
    control_plane: &'a C,
    waiter:        PollingWaiter,
}

impl<'a, C: ControlPlane + ?Sized> CertificateOperations<'a, C> {
    pub fn new(control_plane: &'a C, waiter: PollingWaiter) -> Self {
        CertificateOperations { control_plane, waiter }
    }

    /// Validate certificates for resources of a domain.
    ///
    /// A failed validation is returned as [`FleetError::ValidationFailed`]
    /// with one report entry per failing resource.
    pub async fn validate_resource_certificates(
        &self,
        domain_id: &str,
        specs:     &[ResourceCertificateSpec],
        cancel:    &CancellationToken,
    ) -> Result<()> {
        info!("validating {} resource certificate(s) in domain {domain_id}", specs.len());
        let envelope = submit(
            OperationKind::Validation,
            cancel,
            self.control_plane.submit_validation(domain_id, specs),
        )
        .await?;

        let result = match resolve(envelope, OperationKind::Validation)? {
            Submission::Immediate(r) if has_finished(&r) || has_failed(&r) => r,
            Submission::Immediate(r) => {
                let id = r.validation_id.clone().unwrap_or_default();
                let op = PendingOperation::new(id, OperationKind::Validation)?;
                self.poll_validation(&op, cancel).await?
            }
            Submission::Pending(op) => self.poll_validation(&op, cancel).await?,
        };

        outcome::aggregate(&result).map_err(FleetError::ValidationFailed)?;
        info!("certificate validation in domain {domain_id} succeeded");
        Ok(())
    }

    async fn poll_validation(
        &self,
        op:     &PendingOperation,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        let cp = self.control_plane;
        let status = self
            .waiter
            .wait(op, cancel, |id| async move {
                cp.get_validation_status(&id).await.map(validation_snapshot)
            })
            .await?;
        status.result.ok_or_else(|| {
            FleetError::InvalidResponse(format!("{op} finished without a result"))
        })
    }

    /// Ask the control plane to generate a certificate for one resource and
    /// wait for the generation task to complete.
    pub async fn generate_certificate_for_resource(
        &self,
        domain_id:     &str,
        resource_type: &str,
        resource_fqdn: &str,
        ca_type:       &str,
        cancel:        &CancellationToken,
    ) -> Result<()> {
        let spec = CertificatesGenerationSpec {
            ca_type:   ca_type.to_string(),
            resources: vec![Resource {
                fqdn:          resource_fqdn.to_string(),
                resource_type: resource_type.to_string(),
            }],
        };
        info!("generating {ca_type} certificate for {resource_type} {resource_fqdn} in domain {domain_id}");
        let envelope = submit(
            OperationKind::Generation,
            cancel,
            self.control_plane.submit_generation(domain_id, &spec),
        )
        .await?;

        let op = match resolve(envelope, OperationKind::Generation)? {
            Submission::Immediate(task) if task.status.is_terminal() => {
                return tasks::settle(&task, true);
            }
            Submission::Immediate(task) => PendingOperation::new(task.id, OperationKind::Generation)?,
            Submission::Pending(op) => op,
        };
        tasks::await_task(self.control_plane, &self.waiter, &op, cancel, true).await
    }

    pub async fn read_certificates(&self, domain_id: &str) -> Result<Vec<Certificate>> {
        CertificateQueryEngine::new(self.control_plane)
            .list_by_domain(domain_id)
            .await
    }

    pub async fn find_certificate_for_resource(
        &self,
        domain_id:     &str,
        resource_fqdn: &str,
    ) -> Result<Option<Certificate>> {
        let found = CertificateQueryEngine::new(self.control_plane)
            .find_by_resource(domain_id, resource_fqdn)
            .await?;
        if found.is_none() {
            debug!("no certificate issued to {resource_fqdn} in domain {domain_id}");
        }
        Ok(found)
    }
}

/// Hex fingerprint of `ordered_fields`; see [`fingerprint::fingerprint`].
pub fn compute_fingerprint(ordered_fields: &[String]) -> Result<String> {
    fingerprint::fingerprint(ordered_fields)
}
