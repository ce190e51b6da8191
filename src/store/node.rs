/// Chlu node - the shipped storage collaborator
///
/// Reads review records from the index cache or IPFS, follows the update
/// chain for latest-version reads, and serves DID documents and relations
/// from the index.
use crate::{
    error::{GatewayError, GatewayResult},
    store::{
        poll_until_present, IdentityDocument, IpfsClient, ReadOptions, ReviewRecord, ReviewStore,
        ReviewSummary, SqlIndex, WaitPolicy,
    },
    validation::{self, ReviewValidator},
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Longest update chain followed before giving up
pub const MAX_VERSION_HOPS: usize = 64;

/// Node-level settings
#[derive(Debug, Clone, Default)]
pub struct ChluNodeConfig {
    /// DID of this node's own key; records it authored are `editable`
    pub node_did: Option<String>,
    pub wait_policy: WaitPolicy,
}

/// Storage collaborator over IPFS plus the relational index
#[derive(Clone)]
pub struct ChluNode {
    ipfs: IpfsClient,
    index: SqlIndex,
    validator: ReviewValidator,
    config: ChluNodeConfig,
}

impl ChluNode {
    pub fn new(ipfs: IpfsClient, index: SqlIndex, config: ChluNodeConfig) -> Self {
        Self {
            ipfs,
            index,
            validator: ReviewValidator::new(),
            config,
        }
    }

    /// Follow the update chain from `multihash` to its current head
    pub async fn resolve_latest(&self, multihash: &str) -> GatewayResult<String> {
        let mut current = multihash.to_string();
        let mut visited = HashSet::new();
        visited.insert(current.clone());

        for _ in 0..MAX_VERSION_HOPS {
            match self.index.next_version_of(&current).await? {
                Some(next) => {
                    if !visited.insert(next.clone()) {
                        return Err(GatewayError::VersionChain(format!(
                            "Update chain of {} loops at {}",
                            multihash, next
                        )));
                    }
                    current = next;
                }
                None => return Ok(current),
            }
        }

        Err(GatewayError::VersionChain(format!(
            "Update chain of {} is longer than {} versions",
            multihash, MAX_VERSION_HOPS
        )))
    }

    /// Exact version stored under `multihash`, cached in the index on miss
    async fn fetch_record(&self, multihash: &str) -> GatewayResult<Option<ReviewRecord>> {
        if let Some(record) = self.index.get_review_record(multihash).await? {
            debug!("Review record {} served from index", multihash);
            return Ok(Some(record));
        }

        let Some(value) = self.ipfs.get_json(multihash).await? else {
            return Ok(None);
        };

        let mut record = ReviewRecord::from_value(value).ok_or_else(|| {
            GatewayError::Storage(format!("Content {} is not a review record", multihash))
        })?;
        record.remove("editable");

        if let Err(e) = self.index.put_review_record(multihash, &record).await {
            warn!("Failed to index review record {}: {}", multihash, e);
        }

        Ok(Some(record))
    }

    fn is_editable(&self, record: &ReviewRecord) -> bool {
        match (&self.config.node_did, record.author_did()) {
            (Some(node_did), Some(author)) => node_did == author,
            _ => false,
        }
    }

    async fn with_latest_versions(&self, summaries: Vec<ReviewSummary>) -> GatewayResult<Vec<ReviewSummary>> {
        let mut out = Vec::with_capacity(summaries.len());
        for mut summary in summaries {
            // A broken chain only costs its own entry the latest version
            match self.resolve_latest(&summary.multihash).await {
                Ok(latest) if latest != summary.multihash => summary.latest_version = Some(latest),
                Ok(_) => {}
                Err(GatewayError::VersionChain(reason)) => {
                    warn!("Skipping latest version of {}: {}", summary.multihash, reason)
                }
                Err(e) => return Err(e),
            }
            out.push(summary);
        }
        Ok(out)
    }
}

#[async_trait]
impl ReviewStore for ChluNode {
    async fn start(&self) -> GatewayResult<()> {
        self.index.ping().await?;
        self.index.ensure_schema().await?;
        self.ipfs.ping().await?;
        info!(
            "Chlu node ready (index writes: {})",
            if self.index.writes_enabled() { "on" } else { "off" }
        );
        Ok(())
    }

    async fn stop(&self) -> GatewayResult<()> {
        self.index.close().await;
        info!("Chlu node stopped");
        Ok(())
    }

    async fn read_review_record(
        &self,
        multihash: &str,
        options: &ReadOptions,
    ) -> GatewayResult<Option<ReviewRecord>> {
        let target = if options.get_latest_version {
            self.resolve_latest(multihash).await?
        } else {
            multihash.to_string()
        };

        let Some(mut record) = self.fetch_record(&target).await? else {
            return Ok(None);
        };

        if let Some(validate) = options.validate {
            let issues = self.validator.validate(&record);
            if !issues.is_empty() {
                let summary = validation::summarize(&issues);
                if validate.throw_errors {
                    return Err(GatewayError::Validation(summary));
                }
                warn!("Review record {} has validation issues: {}", target, summary);
                ReviewValidator::annotate(&mut record, &issues);
            }
        }

        let editable = self.is_editable(&record);
        record.insert("editable", Value::Bool(editable));

        Ok(Some(record))
    }

    /// DID documents come from the shared index only; waiting gives the
    /// collector time to write them
    async fn get_did(
        &self,
        did: &str,
        wait_until_present: bool,
    ) -> GatewayResult<Option<IdentityDocument>> {
        if !wait_until_present {
            return self.index.get_did_document(did).await;
        }

        let index = &self.index;
        poll_until_present(self.config.wait_policy, move || index.get_did_document(did)).await
    }

    async fn get_reviews_written_by_did(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>> {
        let summaries = self.index.reviews_written_by(did).await?;
        self.with_latest_versions(summaries).await
    }

    async fn get_reviews_about_did(&self, did: &str) -> GatewayResult<Vec<ReviewSummary>> {
        let summaries = self.index.reviews_about(did).await?;
        self.with_latest_versions(summaries).await
    }
}
