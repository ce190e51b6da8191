/// DID document resolution
use super::{yes_no, QueryResolver, Resolution};
use crate::{identifier, metrics, store::IdentityDocument};
use std::time::Instant;
use tracing::{debug, error, info, warn};

impl QueryResolver {
    /// Resolve a DID document
    ///
    /// With `wait_until_present` the collaborator may hold the call until the
    /// document propagates; the resolver caps that wait and reports `NotFound`
    /// when the cap is hit.
    pub async fn resolve_identity(&self, did: &str, wait_until_present: bool) -> Resolution<IdentityDocument> {
        let started = Instant::now();
        let wait = yes_no(wait_until_present);
        debug!("Requested DID {}, waitUntilPresent: {}", did, wait);

        if !identifier::is_did_identifier(did) {
            info!("DID {} rejected: invalid DID", did);
            let resolution = Resolution::InvalidInput(format!("DID ID {} is invalid", did));
            metrics::record_resolution("did", resolution.outcome(), started.elapsed());
            return resolution;
        }

        let lookup = self.store.get_did(did, wait_until_present);
        let result = if wait_until_present {
            match tokio::time::timeout(self.wait_guard, lookup).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("DID {} still absent after {:?}", did, self.wait_guard);
                    Ok(None)
                }
            }
        } else {
            lookup.await
        };

        match &result {
            Ok(Some(_)) => debug!("DID {}, waitUntilPresent: {} => OK", did, wait),
            Ok(None) => info!("DID {}, waitUntilPresent: {} => NOT FOUND", did, wait),
            Err(e) => error!("DID {}, waitUntilPresent: {} => ERROR {:?}", did, wait, e),
        }

        let resolution = Resolution::from_lookup(result);
        metrics::record_resolution("did", resolution.outcome(), started.elapsed());
        resolution
    }
}
