//! Network map builder

use netmap_core::{CertificateAndKeyPair, NetworkMap, SecureHash};
use tracing::info;

use super::params::NetworkParametersStore;
use super::publication::Publication;
use super::ServiceError;

/// Signs snapshots of the registry against the current parameters
#[derive(Debug, Clone)]
pub struct NetworkMapBuilder {
    signer: CertificateAndKeyPair,
}

impl NetworkMapBuilder {
    pub fn new(signer: CertificateAndKeyPair) -> Self {
        Self { signer }
    }

    pub fn signer(&self) -> &CertificateAndKeyPair {
        &self.signer
    }

    /// Sign a map of `node_info_hashes` referring to the current parameters
    pub fn build(
        &self,
        node_info_hashes: impl IntoIterator<Item = SecureHash>,
        params: &NetworkParametersStore,
    ) -> Result<Publication, ServiceError> {
        let network_map = NetworkMap::new(node_info_hashes, params.hash());
        let signed = self.signer.sign_with_cert(&network_map)?;

        let publication = Publication {
            network_map_bytes: signed.to_bytes()?,
            network_map_hash: signed.raw_hash(),
            network_map,
            parameters: params.parameters().clone(),
            parameters_bytes: params.current().to_bytes()?,
            parameters_hash: params.hash(),
        };

        info!(
            nodes = publication.network_map.node_info_hashes.len(),
            epoch = publication.parameters.epoch,
            map_hash = %publication.network_map_hash,
            "Built network map"
        );
        Ok(publication)
    }
}
