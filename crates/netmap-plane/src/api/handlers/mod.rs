//! API request handlers

pub mod certificates;
pub mod network_map;

pub use certificates::{get_certificate, submit_csr, truststore, TRUSTSTORE_FILENAME};
pub use network_map::{
    bump_epoch, bump_minimum_platform_version, get_network_map, get_network_parameters,
    get_node_info, map_stats, publish, reset_persisted_nodes, MapStats,
};

/// Liveness check
///
/// GET /ping
pub async fn ping() -> &'static str {
    "OK"
}
