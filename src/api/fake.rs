//! Scripted in-memory control plane for exercising the certificate core.
//!
//! Each operation pops the next scripted response; running out of script is
//! reported as an `InvalidResponse` so a test never hangs on an extra call.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::models::{
    Certificate, CertificatesGenerationSpec, Domain, Page, ResourceCertificateSpec, Task,
    ValidationResult,
};
use super::{ControlPlane, Envelope};
use crate::error::{FleetError, Result};

#[derive(Default)]
pub struct FakeControlPlane {
    pub submit_validation: Mutex<VecDeque<Result<Envelope<ValidationResult>>>>,
    pub validation_status: Mutex<VecDeque<Result<ValidationResult>>>,
    pub submit_generation: Mutex<VecDeque<Result<Envelope<Task>>>>,
    pub tasks:             Mutex<VecDeque<Result<Task>>>,
    pub certificates:      Mutex<VecDeque<Result<Page<Certificate>>>>,
    pub domains:           Mutex<VecDeque<Result<Page<Domain>>>>,
    /// Added latency for submit calls.
    pub submit_delay:      Mutex<Duration>,
    /// Every call made, as `"<operation> <argument>"`.
    pub calls:             Mutex<Vec<String>>,
}

fn next<T>(queue: &Mutex<VecDeque<Result<T>>>, op: &str) -> Result<T> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(FleetError::InvalidResponse(format!("unscripted call: {op}"))))
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    async fn submit_latency(&self) {
        let delay = *self.submit_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.split(' ').next() == Some(op))
            .count()
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn submit_validation(
        &self,
        domain_id: &str,
        _specs:    &[ResourceCertificateSpec],
    ) -> Result<Envelope<ValidationResult>> {
        self.record(format!("submit_validation {domain_id}"));
        self.submit_latency().await;
        next(&self.submit_validation, "submit_validation")
    }

    async fn get_validation_status(&self, validation_id: &str) -> Result<ValidationResult> {
        self.record(format!("get_validation_status {validation_id}"));
        next(&self.validation_status, "get_validation_status")
    }

    async fn submit_generation(
        &self,
        domain_id: &str,
        _spec:     &CertificatesGenerationSpec,
    ) -> Result<Envelope<Task>> {
        self.record(format!("submit_generation {domain_id}"));
        self.submit_latency().await;
        next(&self.submit_generation, "submit_generation")
    }

    async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.record(format!("get_task {task_id}"));
        next(&self.tasks, "get_task")
    }

    async fn list_certificates(&self, domain_id: &str) -> Result<Page<Certificate>> {
        self.record(format!("list_certificates {domain_id}"));
        next(&self.certificates, "list_certificates")
    }

    async fn list_domains(&self) -> Result<Page<Domain>> {
        self.record("list_domains".to_string());
        next(&self.domains, "list_domains")
    }
}
