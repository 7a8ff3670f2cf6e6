//! Control-plane payloads, as they appear on the wire (camelCase JSON).
//!
//! Every field the control plane owns is optional: an absent value must stay
//! distinguishable from an empty string or zero.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Validation ────────────────────────────────────────────────────────────────

/// Status taxonomy shared by a validation and its per-resource entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    InProgress,
    Succeeded,
    Failed,
    FailedWithWarnings,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValidationStatus::InProgress         => "IN_PROGRESS",
            ValidationStatus::Succeeded          => "SUCCEEDED",
            ValidationStatus::Failed             => "FAILED",
            ValidationStatus::FailedWithWarnings => "FAILED_WITH_WARNINGS",
            ValidationStatus::Unknown            => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Outcome of validating one resource's certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceValidation {
    pub resource_fqdn: String,
    #[serde(default)]
    pub resource_type: String,
    #[serde(rename = "validationStatus")]
    pub status: ValidationStatus,
    #[serde(default)]
    pub messages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(default)]
    pub validation_id: Option<String>,
    #[serde(rename = "resultStatus")]
    pub overall_status: ValidationStatus,
    #[serde(rename = "validations", default)]
    pub per_resource_results: Vec<ResourceValidation>,
}

/// One resource's desired certificate; passed through to the control plane
/// unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCertificateSpec {
    pub resource_fqdn: String,
    pub resource_type: String,
    pub ca_type: String,
    #[serde(rename = "certificate")]
    pub certificate_or_csr_material: String,
}

// ── Generation / tasks ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub fqdn: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificatesGenerationSpec {
    pub ca_type: String,
    pub resources: Vec<Resource>,
}

/// Task states, parsed case-insensitively since the control plane is not
/// consistent about casing (`Successful`, `SUCCESSFUL`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    InProgress,
    Successful,
    Failed,
    Cancelled,
    Other(String),
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::InProgress)
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PENDING"     => TaskStatus::Pending,
            "IN_PROGRESS" => TaskStatus::InProgress,
            "SUCCESSFUL"  => TaskStatus::Successful,
            "FAILED"      => TaskStatus::Failed,
            "CANCELLED"   => TaskStatus::Cancelled,
            _             => TaskStatus::Other(s.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for TaskStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(TaskStatus::from(s.as_str()))
    }
}

impl Serialize for TaskStatus {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending    => f.write_str("PENDING"),
            TaskStatus::InProgress => f.write_str("IN_PROGRESS"),
            TaskStatus::Successful => f.write_str("SUCCESSFUL"),
            TaskStatus::Failed     => f.write_str("FAILED"),
            TaskStatus::Cancelled  => f.write_str("CANCELLED"),
            TaskStatus::Other(s)   => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskError {
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub status: TaskStatus,
    #[serde(default)]
    pub errors: Vec<TaskError>,
}

// ── Certificates ──────────────────────────────────────────────────────────────

/// A certificate as reported by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub domain:                    Option<String>,
    pub issued_to:                 Option<String>,
    pub issued_by:                 Option<String>,
    pub subject:                   Option<String>,
    #[serde(rename = "subjectAlternativeName")]
    pub subject_alternative_names: Option<Vec<String>>,
    pub serial_number:             Option<String>,
    pub thumbprint:                Option<String>,
    pub thumbprint_algorithm:      Option<String>,
    pub public_key:                Option<String>,
    pub public_key_algorithm:      Option<String>,
    pub signature_algorithm:       Option<String>,
    pub key_size:                  Option<String>,
    pub pem_encoded:               Option<String>,
    pub not_before:                Option<String>,
    pub not_after:                 Option<String>,
    pub number_of_days_to_expire:  Option<i64>,
    pub expiration_status:         Option<String>,
    pub certificate_error:         Option<String>,
    pub is_installed:              Option<bool>,
    pub version:                   Option<String>,
}

// ── Domains ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub id:   String,
    #[serde(default)]
    pub name: String,
}

/// Paged list wrapper used by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub elements: Vec<T>,
}
