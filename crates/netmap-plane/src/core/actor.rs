//! The authority actor
//!
//! A single task owns every mutation. Callers hold an [`AuthorityHandle`],
//! send a [`Command`] over a bounded queue and await the reply on a oneshot
//! channel. Commands are applied strictly in the order they were queued, so
//! the map published after command N reflects commands 1..=N and nothing
//! later.

use std::sync::Arc;

use netmap_core::{NotaryInfo, SecureHash};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::map_builder::NetworkMapBuilder;
use super::params::NetworkParametersStore;
use super::publication::PublicationCache;
use super::ServiceError;
use crate::ca::CertificateAuthority;
use crate::csr::CsrIntake;
use crate::notary::NotarySource;
use crate::storage::{NodeInfoStore, StoredNodeInfo};

/// Maximum number of queued commands before senders wait
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

type Reply<T> = oneshot::Sender<Result<T, ServiceError>>;

/// Work items for the actor
#[derive(Debug)]
pub enum Command {
    /// Store a raw certificate request, reply with its id
    SubmitCsr { raw: Vec<u8>, reply: Reply<String> },

    /// Sign the request stored under `id`, reply with the chain archive
    SignCsr { id: String, reply: Reply<Option<Vec<u8>>> },

    /// Save a verified node info and republish
    PublishNodeInfo { record: StoredNodeInfo, reply: Reply<SecureHash> },

    /// Clear the registry, reply with the removed count, then republish
    ResetNodes { reply: Reply<usize> },

    /// Epoch + 1 and republish, reply with the new epoch
    BumpEpoch { reply: Reply<i32> },

    /// Epoch + 1, platform version + 1 and republish, reply with the new version
    BumpMinimumPlatformVersion { reply: Reply<i32> },
}

/// Everything the actor owns
pub struct AuthorityActor {
    receiver: mpsc::Receiver<Command>,
    authority: Arc<CertificateAuthority>,
    intake: Arc<CsrIntake>,
    store: Arc<dyn NodeInfoStore>,
    notaries: Arc<dyn NotarySource>,
    params: NetworkParametersStore,
    builder: NetworkMapBuilder,
    cache: Arc<PublicationCache>,
}

impl AuthorityActor {
    /// Sign the initial parameters and map, then start the actor task
    ///
    /// The publication cache is populated before this returns.
    pub async fn start(
        authority: Arc<CertificateAuthority>,
        intake: Arc<CsrIntake>,
        store: Arc<dyn NodeInfoStore>,
        notaries: Arc<dyn NotarySource>,
        cache: Arc<PublicationCache>,
        minimum_platform_version: i32,
    ) -> Result<(AuthorityHandle, JoinHandle<()>), ServiceError> {
        let signer = authority.network_map().clone();
        let params = NetworkParametersStore::initialize(
            minimum_platform_version,
            resolve_notaries(&notaries).await?,
            &signer,
        )?;
        let builder = NetworkMapBuilder::new(signer);

        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let mut actor = Self {
            receiver,
            authority,
            intake,
            store,
            notaries,
            params,
            builder,
            cache,
        };
        actor.rebuild().await?;

        let task = tokio::spawn(actor.run());
        Ok((AuthorityHandle { sender }, task))
    }

    async fn run(mut self) {
        info!("Authority actor started");
        while let Some(command) = self.receiver.recv().await {
            self.handle(command).await;
        }
        info!("Authority actor stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::SubmitCsr { raw, reply } => {
                let result = self.intake.submit(&raw).map_err(ServiceError::from);
                respond(reply, result);
            }
            Command::SignCsr { id, reply } => {
                let result = self.sign_csr(&id);
                respond(reply, result);
            }
            Command::PublishNodeInfo { record, reply } => {
                let result = self.publish_node_info(record).await;
                respond(reply, result);
            }
            Command::ResetNodes { reply } => {
                let result = self.store.clear().await.map_err(ServiceError::from);
                let cleared = result.is_ok();
                respond(reply, result);
                if cleared {
                    if let Err(e) = self.rebuild().await {
                        error!(error = %e, "Rebuild after registry reset failed");
                    }
                }
            }
            Command::BumpEpoch { reply } => {
                let result = self.bump_epoch().await;
                respond(reply, result);
            }
            Command::BumpMinimumPlatformVersion { reply } => {
                let result = self.bump_minimum_platform_version().await;
                respond(reply, result);
            }
        }
    }

    fn sign_csr(&self, id: &str) -> Result<Option<Vec<u8>>, ServiceError> {
        match self.intake.retrieve(id, &self.authority)? {
            Some(issued) => Ok(Some(issued.to_archive()?)),
            None => Ok(None),
        }
    }

    async fn publish_node_info(&mut self, record: StoredNodeInfo) -> Result<SecureHash, ServiceError> {
        let hash = record.hash;
        self.store.save(record).await?;
        self.rebuild().await?;
        Ok(hash)
    }

    async fn bump_epoch(&mut self) -> Result<i32, ServiceError> {
        let notaries = resolve_notaries(&self.notaries).await?;
        let next = self.params.next_epoch(notaries, self.builder.signer())?;
        self.commit_parameters(next).await?;
        info!(
            epoch = self.params.parameters().epoch,
            hash = %self.params.hash(),
            "Bumped network parameters epoch"
        );
        Ok(self.params.parameters().epoch)
    }

    async fn bump_minimum_platform_version(&mut self) -> Result<i32, ServiceError> {
        let notaries = resolve_notaries(&self.notaries).await?;
        let next = self
            .params
            .next_minimum_platform_version(notaries, self.builder.signer())?;
        self.commit_parameters(next).await?;
        info!(
            epoch = self.params.parameters().epoch,
            minimum_platform_version = self.params.parameters().minimum_platform_version,
            hash = %self.params.hash(),
            "Bumped minimum platform version"
        );
        Ok(self.params.parameters().minimum_platform_version)
    }

    /// Build the map for `next`, then swap both in together
    async fn commit_parameters(&mut self, next: NetworkParametersStore) -> Result<(), ServiceError> {
        let hashes = self.store.all_hashes().await?;
        let publication = self.builder.build(hashes, &next)?;
        self.params = next;
        self.cache.publish(publication);
        Ok(())
    }

    async fn rebuild(&mut self) -> Result<(), ServiceError> {
        let hashes = self.store.all_hashes().await?;
        let publication = self.builder.build(hashes, &self.params)?;
        self.cache.publish(publication);
        Ok(())
    }
}

/// Resolve the notary list on the blocking pool
async fn resolve_notaries(source: &Arc<dyn NotarySource>) -> Result<Vec<NotaryInfo>, ServiceError> {
    let source = Arc::clone(source);
    tokio::task::spawn_blocking(move || source.resolve())
        .await
        .map_err(|e| ServiceError::Internal(format!("notary resolution task failed: {}", e)))?
        .map_err(ServiceError::from)
}

fn respond<T>(reply: Reply<T>, result: Result<T, ServiceError>) {
    if let Err(e) = &result {
        warn!(error = %e, "Command failed");
    }
    if reply.send(result).is_err() {
        debug!("Caller went away before the reply");
    }
}

/// Cloneable sender side of the actor
#[derive(Debug, Clone)]
pub struct AuthorityHandle {
    sender: mpsc::Sender<Command>,
}

impl AuthorityHandle {
    pub async fn submit_csr(&self, raw: Vec<u8>) -> Result<String, ServiceError> {
        self.call(|reply| Command::SubmitCsr { raw, reply }).await
    }

    pub async fn sign_csr(&self, id: String) -> Result<Option<Vec<u8>>, ServiceError> {
        self.call(|reply| Command::SignCsr { id, reply }).await
    }

    /// Decode and verify a signed node info, then save it through the actor
    ///
    /// Verification happens on the caller's task; only the save and the
    /// rebuild are serialized.
    pub async fn publish_node_info(&self, bytes: Vec<u8>) -> Result<SecureHash, ServiceError> {
        let record = StoredNodeInfo::from_bytes(bytes)
            .map_err(|e| ServiceError::MalformedRequest(e.to_string()))?;
        record
            .signed
            .verified_node_info()
            .map_err(|e| ServiceError::MalformedRequest(e.to_string()))?;

        self.call(|reply| Command::PublishNodeInfo { record, reply }).await
    }

    pub async fn reset_nodes(&self) -> Result<usize, ServiceError> {
        self.call(|reply| Command::ResetNodes { reply }).await
    }

    pub async fn bump_epoch(&self) -> Result<i32, ServiceError> {
        self.call(|reply| Command::BumpEpoch { reply }).await
    }

    pub async fn bump_minimum_platform_version(&self) -> Result<i32, ServiceError> {
        self.call(|reply| Command::BumpMinimumPlatformVersion { reply })
            .await
    }

    async fn call<T>(&self, command: impl FnOnce(Reply<T>) -> Command) -> Result<T, ServiceError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .await
            .map_err(|_| ServiceError::Internal("authority actor is not running".into()))?;
        response
            .await
            .map_err(|_| ServiceError::Internal("authority actor dropped the request".into()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ca::dev_trust_anchor;
    use crate::notary::StaticNotarySource;
    use crate::storage::{MemoryStore, StorageError};
    use crate::testing::{csr_der, node_info_signed_by, signed_node_info, TestIdentity};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Memory store whose hash listing can be switched to fail
    #[derive(Debug, Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl NodeInfoStore for FlakyStore {
        async fn save(&self, record: StoredNodeInfo) -> Result<(), StorageError> {
            self.inner.save(record).await
        }

        async fn find_by_hash(&self, hash: &SecureHash) -> Result<Option<StoredNodeInfo>, StorageError> {
            self.inner.find_by_hash(hash).await
        }

        async fn all_hashes(&self) -> Result<BTreeSet<SecureHash>, StorageError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StorageError::Poisoned("listing disabled".into()));
            }
            self.inner.all_hashes().await
        }

        async fn all(&self) -> Result<Vec<StoredNodeInfo>, StorageError> {
            self.inner.all().await
        }

        async fn clear(&self) -> Result<usize, StorageError> {
            self.inner.clear().await
        }
    }

    struct Harness {
        handle: AuthorityHandle,
        cache: Arc<PublicationCache>,
        store: Arc<MemoryStore>,
    }

    async fn harness() -> Harness {
        let authority = Arc::new(
            CertificateAuthority::bootstrap(dev_trust_anchor().unwrap(), "CN=Doorman", "CN=Map")
                .unwrap(),
        );
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(PublicationCache::new());
        let (handle, _task) = AuthorityActor::start(
            authority,
            Arc::new(CsrIntake::new()),
            store.clone(),
            Arc::new(StaticNotarySource::default()),
            cache.clone(),
            1,
        )
        .await
        .unwrap();
        Harness { handle, cache, store }
    }

    fn node(org: &str) -> Vec<u8> {
        signed_node_info(&TestIdentity::new(&format!("O={}, L=London, C=GB", org)), 1)
    }

    #[tokio::test]
    async fn test_initial_map_published_before_start_returns() {
        let h = harness().await;
        let publication = h.cache.latest().unwrap();
        assert!(publication.network_map.node_info_hashes.is_empty());
        assert_eq!(publication.parameters.epoch, 10);
        assert_eq!(
            publication.network_map.network_parameter_hash,
            publication.parameters_hash
        );
    }

    #[tokio::test]
    async fn test_publish_then_map_contains_hash() {
        let h = harness().await;
        let hash = h.handle.publish_node_info(node("Alice")).await.unwrap();

        let publication = h.cache.latest().unwrap();
        assert!(publication.network_map.contains(&hash));
        assert_eq!(
            publication.network_map.network_parameter_hash,
            publication.parameters_hash
        );
    }

    #[tokio::test]
    async fn test_publish_rejects_garbage_and_foreign_signer() {
        let h = harness().await;
        assert!(matches!(
            h.handle.publish_node_info(b"junk".to_vec()).await,
            Err(ServiceError::MalformedRequest(_))
        ));

        let alice = TestIdentity::new("O=Alice, L=London, C=GB");
        let mallory = TestIdentity::new("O=Mallory, L=London, C=GB");
        assert!(matches!(
            h.handle
                .publish_node_info(node_info_signed_by(&alice, &mallory))
                .await,
            Err(ServiceError::MalformedRequest(_))
        ));
        assert!(h.store.all_hashes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_counts_then_rebuilds() {
        let h = harness().await;
        for org in ["A", "B", "C"] {
            h.handle.publish_node_info(node(org)).await.unwrap();
        }
        assert_eq!(h.handle.reset_nodes().await.unwrap(), 3);

        // The rebuild runs before the next queued command
        h.handle.bump_epoch().await.unwrap();
        let publication = h.cache.latest().unwrap();
        assert!(publication.network_map.node_info_hashes.is_empty());
    }

    #[tokio::test]
    async fn test_bumps_are_applied_in_order() {
        let h = harness().await;
        assert_eq!(h.handle.bump_epoch().await.unwrap(), 11);
        assert_eq!(h.handle.bump_minimum_platform_version().await.unwrap(), 2);
        assert_eq!(h.handle.bump_epoch().await.unwrap(), 13);

        let publication = h.cache.latest().unwrap();
        assert_eq!(publication.parameters.epoch, 13);
        assert_eq!(publication.parameters.minimum_platform_version, 2);
    }

    #[tokio::test]
    async fn test_concurrent_bumps_do_not_lose_updates() {
        let h = harness().await;
        let mut tasks = Vec::new();
        for i in 0..20 {
            let handle = h.handle.clone();
            tasks.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    handle.bump_epoch().await.map(|_| ())
                } else {
                    handle.bump_minimum_platform_version().await.map(|_| ())
                }
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let publication = h.cache.latest().unwrap();
        assert_eq!(publication.parameters.epoch, 30);
        assert_eq!(publication.parameters.minimum_platform_version, 11);
    }

    #[tokio::test]
    async fn test_failed_rebuild_leaves_parameters_unchanged() {
        let authority = Arc::new(
            CertificateAuthority::bootstrap(dev_trust_anchor().unwrap(), "CN=Doorman", "CN=Map")
                .unwrap(),
        );
        let store = Arc::new(FlakyStore::default());
        let cache = Arc::new(PublicationCache::new());
        let (handle, _task) = AuthorityActor::start(
            authority,
            Arc::new(CsrIntake::new()),
            store.clone(),
            Arc::new(StaticNotarySource::default()),
            cache.clone(),
            1,
        )
        .await
        .unwrap();
        let published = cache.latest().unwrap().parameters_hash;

        store.failing.store(true, Ordering::SeqCst);
        assert!(handle.bump_epoch().await.is_err());
        assert!(handle.bump_minimum_platform_version().await.is_err());
        assert_eq!(cache.latest().unwrap().parameters_hash, published);

        store.failing.store(false, Ordering::SeqCst);
        assert_eq!(handle.bump_epoch().await.unwrap(), 11);
        let publication = cache.latest().unwrap();
        assert_eq!(publication.parameters.epoch, 11);
        assert_eq!(publication.parameters.minimum_platform_version, 1);
    }

    #[tokio::test]
    async fn test_csr_roundtrip_through_actor() {
        let h = harness().await;
        let id = h.handle.submit_csr(csr_der("CN=Alice")).await.unwrap();

        let archive = h.handle.sign_csr(id).await.unwrap();
        assert!(archive.is_some_and(|a| !a.is_empty()));
        assert!(h.handle.sign_csr("nope".into()).await.unwrap().is_none());
    }
}
