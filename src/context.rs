/// Application context and dependency injection
use crate::{
    config::GatewayConfig,
    error::{GatewayError, GatewayResult},
    resolution::QueryResolver,
    store::{
        index::IndexOptions,
        ipfs::IpfsClientConfig,
        node::ChluNodeConfig,
        ChluNode, IpfsClient, ReviewStore, SqlIndex,
    },
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Application context holding the shared collaborator handle
///
/// One per process. Cloning is cheap and every clone shares the same
/// collaborator.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<GatewayConfig>,
    pub store: Arc<dyn ReviewStore>,
    pub resolver: QueryResolver,
}

impl AppContext {
    /// Create a context backed by a [`ChluNode`] built from configuration
    pub async fn new(config: GatewayConfig) -> GatewayResult<Self> {
        // Validate configuration
        config.validate()?;

        if config.blockchain.btc_token.is_none() {
            warn!("BTC Blockchain access through BlockCypher is strongly suggested (set CHLU_BTC_TOKEN)");
        }

        Self::ensure_directories(&config).await?;

        let ipfs = IpfsClient::new(IpfsClientConfig {
            api_url: config.ipfs.api_url.clone(),
            timeout: Duration::from_secs(config.ipfs.timeout_secs),
            ..Default::default()
        })?;

        let index = SqlIndex::connect(
            &config.index.database_url(),
            IndexOptions {
                enable_writes: config.index.enable_writes,
                ..Default::default()
            },
        )
        .await?;
        info!(
            "Connected to {} review index",
            if config.index.postgres { "PostgreSQL" } else { "SQLite" }
        );

        let node = ChluNode::new(
            ipfs,
            index,
            ChluNodeConfig {
                node_did: config.network.node_did.clone(),
                wait_policy: config.identity.wait_policy(),
            },
        );

        Ok(Self::with_store(config, Arc::new(node)))
    }

    /// Create a context around any collaborator
    pub fn with_store(config: GatewayConfig, store: Arc<dyn ReviewStore>) -> Self {
        let wait_timeout = config.identity.wait_policy().timeout;
        let resolver = QueryResolver::new(Arc::clone(&store), wait_timeout);

        Self {
            config: Arc::new(config),
            store,
            resolver,
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &GatewayConfig) -> GatewayResult<()> {
        let mut dirs = vec![config.network.directory.clone()];
        if !config.index.postgres {
            if let Some(parent) = config.index.sqlite_path.parent() {
                dirs.push(parent.to_path_buf());
            }
        }

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    GatewayError::Configuration(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Bring the collaborator up; must finish before the listener is bound
    pub async fn start(&self) -> GatewayResult<()> {
        info!("Starting Chlu node on network {}", self.config.network.name);
        self.store.start().await
    }

    pub async fn stop(&self) -> GatewayResult<()> {
        info!("Stopping Chlu node");
        self.store.stop().await
    }
}
