/// Review record resolution
use super::{yes_no, QueryResolver, Resolution};
use crate::{
    identifier, metrics,
    store::{ReadOptions, ReviewRecord, ValidateOptions},
};
use std::time::Instant;
use tracing::{debug, error, info};

impl QueryResolver {
    /// Resolve a review record by multihash
    ///
    /// Validation always runs in reporting mode: a malformed record that could
    /// be retrieved is still `Found`.
    pub async fn resolve_record(&self, multihash: &str, get_latest_version: bool) -> Resolution<ReviewRecord> {
        let started = Instant::now();
        let latest = yes_no(get_latest_version);
        debug!("Requested Review Record {}, getLatestVersion: {}", multihash, latest);

        if !identifier::is_content_identifier(multihash) {
            info!("Review Record {} rejected: invalid multihash", multihash);
            let resolution = Resolution::InvalidInput(format!("Multihash {} is invalid", multihash));
            metrics::record_resolution("review_record", resolution.outcome(), started.elapsed());
            return resolution;
        }

        let options = ReadOptions {
            get_latest_version,
            validate: Some(ValidateOptions { throw_errors: false }),
        };

        let result = self.store.read_review_record(multihash, &options).await;
        match &result {
            Ok(Some(_)) => debug!("Review Record {}, getLatestVersion: {} => OK", multihash, latest),
            Ok(None) => info!("Review Record {}, getLatestVersion: {} => NOT FOUND", multihash, latest),
            Err(e) => error!("Review Record {}, getLatestVersion: {} => ERROR {:?}", multihash, latest, e),
        }

        let resolution = Resolution::from_lookup(result);
        metrics::record_resolution("review_record", resolution.outcome(), started.elapsed());
        resolution
    }
}
