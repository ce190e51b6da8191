/// Query resolution
///
/// Every lookup the gateway serves ends in a [`Resolution`]. Handlers never
/// see collaborator errors or `Option`s directly, so each of the four outcomes
/// has to be handled when a response is built.

mod identity;
mod record;
mod relations;

use crate::{error::GatewayResult, store::ReviewStore};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single lookup
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Found(T),
    /// Valid terminal state, not an error
    NotFound,
    /// The request itself is malformed; never retried
    InvalidInput(String),
    /// The collaborator failed; carries the client-safe message
    UpstreamError(String),
}

impl<T> Resolution<T> {
    /// Collapse a collaborator lookup where `None` means absent
    pub fn from_lookup(result: GatewayResult<Option<T>>) -> Self {
        match result {
            Ok(Some(value)) => Resolution::Found(value),
            Ok(None) => Resolution::NotFound,
            Err(e) => Resolution::UpstreamError(e.client_message()),
        }
    }

    /// Collapse a collaborator lookup that always has a value
    pub fn from_result(result: GatewayResult<T>) -> Self {
        match result {
            Ok(value) => Resolution::Found(value),
            Err(e) => Resolution::UpstreamError(e.client_message()),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolution<U> {
        match self {
            Resolution::Found(value) => Resolution::Found(f(value)),
            Resolution::NotFound => Resolution::NotFound,
            Resolution::InvalidInput(reason) => Resolution::InvalidInput(reason),
            Resolution::UpstreamError(message) => Resolution::UpstreamError(message),
        }
    }

    /// Short label for logs and metrics
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Found(_) => "found",
            Resolution::NotFound => "not_found",
            Resolution::InvalidInput(_) => "invalid_input",
            Resolution::UpstreamError(_) => "upstream_error",
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Extra time given to a waiting collaborator before the resolver gives up
pub const WAIT_GUARD_GRACE: Duration = Duration::from_secs(5);

/// Maps validated requests onto the storage collaborator
#[derive(Clone)]
pub struct QueryResolver {
    store: Arc<dyn ReviewStore>,
    /// Ceiling for `wait_until_present` identity lookups
    wait_guard: Duration,
}

impl QueryResolver {
    pub fn new(store: Arc<dyn ReviewStore>, wait_timeout: Duration) -> Self {
        Self {
            store,
            wait_guard: wait_timeout + WAIT_GUARD_GRACE,
        }
    }

    pub fn store(&self) -> &Arc<dyn ReviewStore> {
        &self.store
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}
