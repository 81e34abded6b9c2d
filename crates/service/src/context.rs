//! Per-call facts the host used to supply implicitly.
//!
//! Every ticket operation receives a [`CallContext`] so the service stays a
//! function of (store state, input, context) and can be driven in tests with a
//! fixed identity and clock.

use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Opaque identity of whoever invoked the operation.
    pub caller: String,
    /// Time at which the operation is considered to happen.
    pub now: DateTime<Utc>,
}

impl CallContext {
    pub fn new(caller: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { caller: caller.into(), now }
    }

    /// Context stamped with the wall clock.
    pub fn at_now(caller: impl Into<String>) -> Self {
        Self::new(caller, Utc::now())
    }

    pub fn is(&self, identity: &str) -> bool {
        self.caller == identity
    }
}
