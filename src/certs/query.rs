//! Read-only certificate lookups. One round trip per call, no polling.

use log::debug;

use crate::api::models::Certificate;
use crate::api::ControlPlane;
use crate::error::Result;

pub struct CertificateQueryEngine<'a, C: ControlPlane + ?Sized> {
    control_plane: &'a C,
}

impl<'a, C: ControlPlane + ?Sized> CertificateQueryEngine<'a, C> {
    pub fn new(control_plane: &'a C) -> Self {
        CertificateQueryEngine { control_plane }
    }

    /// All certificates known for `domain_id`. An empty domain is not an error.
    pub async fn list_by_domain(&self, domain_id: &str) -> Result<Vec<Certificate>> {
        debug!("listing certificates for domain {domain_id}");
        let page = self.control_plane.list_certificates(domain_id).await?;

        if page.elements.is_empty() {
            debug!("no certificates found for domain {domain_id}");
        }
        for (i, cert) in page.elements.iter().enumerate() {
            match serde_json::to_string_pretty(cert) {
                Ok(json) => debug!("certificate {}: {json}", i + 1),
                Err(e)   => debug!("certificate {}: not serializable: {e}", i + 1),
            }
        }
        Ok(page.elements)
    }

    /// The certificate issued to `resource_fqdn`, if any.
    ///
    /// `Ok(None)` means the listing succeeded and nothing matched; a failed
    /// listing is returned as an error.
    pub async fn find_by_resource(
        &self,
        domain_id:     &str,
        resource_fqdn: &str,
    ) -> Result<Option<Certificate>> {
        let certs = self.list_by_domain(domain_id).await?;
        Ok(certs
            .into_iter()
            .find(|c| c.issued_to.as_deref() == Some(resource_fqdn)))
    }
}
