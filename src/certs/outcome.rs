//! Terminal-state classification and failure reporting for validations.

use std::fmt;

use crate::api::models::{ValidationResult, ValidationStatus};

/// Statuses after which there is nothing left to poll for.
pub fn is_terminal(status: &ValidationStatus) -> bool {
    !matches!(status, ValidationStatus::InProgress)
}

/// Statuses the control plane treats as a blocking failure. Warnings block,
/// and so does anything this client cannot classify.
pub fn is_failing(status: &ValidationStatus) -> bool {
    matches!(
        status,
        ValidationStatus::Failed | ValidationStatus::FailedWithWarnings | ValidationStatus::Unknown
    )
}

/// A validation is finished once neither it nor any of its resources is
/// still in progress.
pub fn has_finished(result: &ValidationResult) -> bool {
    is_terminal(&result.overall_status)
        && result.per_resource_results.iter().all(|r| is_terminal(&r.status))
}

/// A validation has failed if its overall status or any resource's status is
/// failing.
pub fn has_failed(result: &ValidationResult) -> bool {
    is_failing(&result.overall_status)
        || result.per_resource_results.iter().any(|r| is_failing(&r.status))
}

/// One failing resource, with the messages the control plane gave for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceFailure {
    pub resource_fqdn: String,
    pub resource_type: String,
    pub status:        ValidationStatus,
    pub messages:      Vec<String>,
}

impl fmt::Display for ResourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource_fqdn)?;
        if !self.resource_type.is_empty() {
            write!(f, " ({})", self.resource_type)?;
        }
        write!(f, ": {}", self.status)?;
        if !self.messages.is_empty() {
            write!(f, ": {}", self.messages.join("; "))?;
        }
        Ok(())
    }
}

/// Structured report of a failed validation: one entry per failing resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub validation_id:  Option<String>,
    pub overall_status: ValidationStatus,
    pub failures:       Vec<ResourceFailure>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.validation_id {
            Some(id) => write!(f, "certificate validation {id} finished with status {}", self.overall_status)?,
            None => write!(f, "certificate validation finished with status {}", self.overall_status)?,
        }
        match self.failures.len() {
            0 => Ok(()),
            n => {
                write!(f, "; {n} resource(s) failed")?;
                for failure in &self.failures {
                    write!(f, "\n  - {failure}")?;
                }
                Ok(())
            }
        }
    }
}

/// Succeed silently, or report every failing resource individually.
///
/// Per-resource successes are not carried into the report.
pub fn aggregate(result: &ValidationResult) -> Result<(), ValidationReport> {
    if !has_failed(result) {
        return Ok(());
    }
    let failures = result
        .per_resource_results
        .iter()
        .filter(|r| is_failing(&r.status))
        .map(|r| ResourceFailure {
            resource_fqdn: r.resource_fqdn.clone(),
            resource_type: r.resource_type.clone(),
            status:        r.status.clone(),
            messages:      r.messages.clone(),
        })
        .collect();
    Err(ValidationReport {
        validation_id:  result.validation_id.clone(),
        overall_status: result.overall_status.clone(),
        failures,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::ResourceValidation;

    fn resource(fqdn: &str, status: ValidationStatus, messages: &[&str]) -> ResourceValidation {
        ResourceValidation {
            resource_fqdn: fqdn.into(),
            resource_type: "VCENTER".into(),
            status,
            messages:      messages.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn result(overall: ValidationStatus, resources: Vec<ResourceValidation>) -> ValidationResult {
        ValidationResult {
            validation_id:        Some("V1".into()),
            overall_status:       overall,
            per_resource_results: resources,
        }
    }

    #[test]
    fn only_the_failing_resource_is_reported() {
        let r = result(ValidationStatus::Failed, vec![
            resource("host-1", ValidationStatus::Succeeded, &["ok"]),
            resource("host-2", ValidationStatus::Failed, &["expired", "untrusted issuer"]),
            resource("host-3", ValidationStatus::Succeeded, &[]),
        ]);
        let report = aggregate(&r).unwrap_err();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].resource_fqdn, "host-2");
        assert_eq!(report.failures[0].messages, vec!["expired", "untrusted issuer"]);
        assert_eq!(report.validation_id.as_deref(), Some("V1"));
    }

    #[test]
    fn every_failing_resource_gets_its_own_entry() {
        let r = result(ValidationStatus::FailedWithWarnings, vec![
            resource("host-1", ValidationStatus::Failed, &["a"]),
            resource("host-2", ValidationStatus::FailedWithWarnings, &["b"]),
        ]);
        let report = aggregate(&r).unwrap_err();
        let hosts: Vec<_> = report.failures.iter().map(|f| f.resource_fqdn.as_str()).collect();
        assert_eq!(hosts, vec!["host-1", "host-2"]);

        let text = report.to_string();
        assert!(text.contains("2 resource(s) failed"), "{text}");
        assert!(text.contains("host-1 (VCENTER): FAILED: a"), "{text}");
        assert!(text.contains("host-2 (VCENTER): FAILED_WITH_WARNINGS: b"), "{text}");
    }

    #[test]
    fn success_is_silent() {
        let r = result(ValidationStatus::Succeeded, vec![
            resource("host-1", ValidationStatus::Succeeded, &["fine"]),
        ]);
        assert!(aggregate(&r).is_ok());
    }

    #[test]
    fn failed_resource_under_succeeded_overall_still_fails() {
        let r = result(ValidationStatus::Succeeded, vec![
            resource("host-1", ValidationStatus::Failed, &["bad chain"]),
        ]);
        assert!(has_failed(&r));
        assert_eq!(aggregate(&r).unwrap_err().failures.len(), 1);
    }

    #[test]
    fn overall_failure_without_resource_detail_is_reported() {
        let r = result(ValidationStatus::Failed, vec![]);
        let report = aggregate(&r).unwrap_err();
        assert!(report.failures.is_empty());
        assert_eq!(report.to_string(), "certificate validation V1 finished with status FAILED");
    }

    #[test]
    fn finished_requires_every_resource_done() {
        assert!(!has_finished(&result(ValidationStatus::InProgress, vec![])));
        assert!(has_finished(&result(ValidationStatus::Failed, vec![])));
        assert!(!has_finished(&result(ValidationStatus::Succeeded, vec![
            resource("host-1", ValidationStatus::InProgress, &[]),
        ])));
    }

    #[test]
    fn taxonomy_has_more_than_two_states() {
        assert!(is_terminal(&ValidationStatus::FailedWithWarnings));
        assert!(is_failing(&ValidationStatus::FailedWithWarnings));
        assert!(is_failing(&ValidationStatus::Unknown));
        assert!(!is_failing(&ValidationStatus::InProgress));
        assert!(!is_failing(&ValidationStatus::Succeeded));
    }
}
