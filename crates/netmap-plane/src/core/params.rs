//! Network parameters store
//!
//! Owned by the authority actor. A bump derives and signs the successor
//! without touching the current document; the actor swaps it in once the map
//! referring to it has been built. Running bumps on the actor is what keeps
//! two of them from racing.

use chrono::Utc;
use netmap_core::{CertificateAndKeyPair, NetworkParameters, NotaryInfo, SecureHash, SignedNetworkParameters};
use tracing::info;

use super::ServiceError;

#[derive(Debug)]
pub struct NetworkParametersStore {
    current: SignedNetworkParameters,
    parameters: NetworkParameters,
}

impl NetworkParametersStore {
    /// Sign the first parameters document
    pub fn initialize(
        minimum_platform_version: i32,
        notaries: Vec<NotaryInfo>,
        signer: &CertificateAndKeyPair,
    ) -> Result<Self, ServiceError> {
        let parameters = NetworkParameters::initial(minimum_platform_version, notaries, Utc::now())?;
        let store = Self::signed(parameters, signer)?;
        info!(
            epoch = store.parameters.epoch,
            minimum_platform_version,
            hash = %store.hash(),
            "Initialized network parameters"
        );
        Ok(store)
    }

    pub fn current(&self) -> &SignedNetworkParameters {
        &self.current
    }

    pub fn parameters(&self) -> &NetworkParameters {
        &self.parameters
    }

    pub fn hash(&self) -> SecureHash {
        self.current.raw_hash()
    }

    /// Signed successor at epoch + 1
    pub fn next_epoch(
        &self,
        notaries: Vec<NotaryInfo>,
        signer: &CertificateAndKeyPair,
    ) -> Result<Self, ServiceError> {
        let next = self.parameters.bump_epoch(notaries, Utc::now())?;
        Self::signed(next, signer)
    }

    /// Signed successor at epoch + 1 and platform version + 1
    pub fn next_minimum_platform_version(
        &self,
        notaries: Vec<NotaryInfo>,
        signer: &CertificateAndKeyPair,
    ) -> Result<Self, ServiceError> {
        let next = self
            .parameters
            .bump_minimum_platform_version(notaries, Utc::now())?;
        Self::signed(next, signer)
    }

    fn signed(parameters: NetworkParameters, signer: &CertificateAndKeyPair) -> Result<Self, ServiceError> {
        let current = signer.sign_with_cert(&parameters)?;
        Ok(Self { current, parameters })
    }
}
