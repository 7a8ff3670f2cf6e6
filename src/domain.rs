//! Domain selection: by id directly, or by name through the domain list.

use log::info;

use crate::api::ControlPlane;
use crate::error::{FleetError, Result};

/// Return the id to operate on. An explicit id wins; otherwise the first
/// listed domain whose name equals `name` is used.
pub async fn resolve_domain_id<C: ControlPlane + ?Sized>(
    control_plane: &C,
    id:            Option<&str>,
    name:          Option<&str>,
) -> Result<String> {
    if let Some(id) = id.filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }
    let name = match name.filter(|s| !s.is_empty()) {
        Some(n) => n,
        None => return Err(FleetError::Config("either a domain id or a domain name must be provided".into())),
    };

    let page = control_plane.list_domains().await?;
    let domain = page
        .elements
        .into_iter()
        .find(|d| d.name == name)
        .ok_or_else(|| FleetError::NotFound(format!("domain name '{name}'")))?;
    info!("domain '{name}' resolved to {}", domain.id);
    Ok(domain.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeControlPlane;
    use crate::api::models::{Domain, Page};

    fn domains() -> Page<Domain> {
        Page {
            elements: vec![
                Domain { id: "d-mgmt".into(), name: "sfo-m01".into() },
                Domain { id: "d-w01".into(),  name: "sfo-w01".into() },
            ],
        }
    }

    #[tokio::test]
    async fn explicit_id_skips_lookup() {
        let cp = FakeControlPlane::new();
        let id = resolve_domain_id(&cp, Some("d-x"), Some("sfo-w01")).await.unwrap();
        assert_eq!(id, "d-x");
        assert!(cp.calls().is_empty());
    }

    #[tokio::test]
    async fn name_is_looked_up() {
        let cp = FakeControlPlane::new();
        cp.domains.lock().unwrap().push_back(Ok(domains()));
        let id = resolve_domain_id(&cp, None, Some("sfo-w01")).await.unwrap();
        assert_eq!(id, "d-w01");
    }

    #[tokio::test]
    async fn unknown_name_is_not_found() {
        let cp = FakeControlPlane::new();
        cp.domains.lock().unwrap().push_back(Ok(domains()));
        let err = resolve_domain_id(&cp, None, Some("lax-w09")).await.unwrap_err();
        assert!(matches!(err, FleetError::NotFound(_)));
    }

    #[tokio::test]
    async fn neither_given_is_config_error() {
        let cp = FakeControlPlane::new();
        let err = resolve_domain_id(&cp, Some(""), None).await.unwrap_err();
        assert!(matches!(err, FleetError::Config(_)));
    }
}
