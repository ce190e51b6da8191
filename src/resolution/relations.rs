/// Reviews related to a DID, in both directions
use super::{QueryResolver, Resolution};
use crate::{error::GatewayResult, identifier, metrics, store::ReviewSummary};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info};

/// Which side of a review the DID is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    WrittenBy,
    About,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Direction::WrittenBy => "reviews_written_by",
            Direction::About => "reviews_about",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Direction::WrittenBy => "Reviews written by DID",
            Direction::About => "Reviews about DID",
        }
    }
}

impl QueryResolver {
    /// Reviews authored by `did`; an empty list is still `Found`
    pub async fn resolve_authored_by(&self, did: &str) -> Resolution<Vec<ReviewSummary>> {
        self.resolve_relation(did, Direction::WrittenBy, self.store.get_reviews_written_by_did(did))
            .await
    }

    /// Reviews whose subject is `did`; an empty list is still `Found`
    pub async fn resolve_about(&self, did: &str) -> Resolution<Vec<ReviewSummary>> {
        self.resolve_relation(did, Direction::About, self.store.get_reviews_about_did(did))
            .await
    }

    async fn resolve_relation<F>(&self, did: &str, direction: Direction, lookup: F) -> Resolution<Vec<ReviewSummary>>
    where
        F: Future<Output = GatewayResult<Vec<ReviewSummary>>>,
    {
        let started = Instant::now();
        let what = direction.describe();
        debug!("Requested {} {}", what, did);

        // The lookup future is lazy: dropping it here never touches the store
        if !identifier::is_did_identifier(did) {
            info!("{} {} rejected: invalid DID", what, did);
            let resolution = Resolution::InvalidInput(format!("DID ID {} is invalid", did));
            metrics::record_resolution(direction.label(), resolution.outcome(), started.elapsed());
            return resolution;
        }

        let result = lookup.await;
        match &result {
            Ok(list) => debug!("{} {} => OK ({} entries)", what, did, list.len()),
            Err(e) => error!("{} {} => ERROR {:?}", what, did, e),
        }

        let resolution = Resolution::from_result(result);
        metrics::record_resolution(direction.label(), resolution.outcome(), started.elapsed());
        resolution
    }
}
