//! Control-plane RPC boundary.
//!
//! The certificate core only ever talks to the fleet manager through the
//! [`ControlPlane`] trait; [`client::HttpControlPlane`] is the REST
//! implementation used by the binary.

pub mod client;
pub mod models;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::error::Result;
use models::{
    Certificate, CertificatesGenerationSpec, Domain, Page, ResourceCertificateSpec, Task,
    ValidationResult,
};

/// A submit response that may carry a synchronous result, an accepted
/// (asynchronous) result, both, or neither.
///
/// The HTTP layer maps `200 OK` to `sync` and `202 Accepted` to `accepted`.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub sync:     Option<T>,
    pub accepted: Option<T>,
}

impl<T> Envelope<T> {
    pub fn sync(payload: T) -> Self {
        Envelope { sync: Some(payload), accepted: None }
    }

    pub fn accepted(payload: T) -> Self {
        Envelope { sync: None, accepted: Some(payload) }
    }
}

/// Operations consumed from the fleet manager.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    async fn submit_validation(
        &self,
        domain_id: &str,
        specs:     &[ResourceCertificateSpec],
    ) -> Result<Envelope<ValidationResult>>;

    async fn get_validation_status(&self, validation_id: &str) -> Result<ValidationResult>;

    async fn submit_generation(
        &self,
        domain_id: &str,
        spec:      &CertificatesGenerationSpec,
    ) -> Result<Envelope<Task>>;

    async fn get_task(&self, task_id: &str) -> Result<Task>;

    async fn list_certificates(&self, domain_id: &str) -> Result<Page<Certificate>>;

    async fn list_domains(&self) -> Result<Page<Domain>>;
}
