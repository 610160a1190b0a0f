// Vendor result vocabulary for the billing client.
//
// `BillingResult` is the vendor's universal verdict shape: an integer
// response code plus a human-readable debug message. The codes are the
// vendor SDK's wire ABI, so they are kept as `i32` constants rather than a
// closed Rust enum — callbacks may carry codes introduced by newer SDK
// drops, and scripts compare against the raw integers.
//
// `ConnectionState` is the client's connection lifecycle as the adapter
// tracks it, with a stable integer encoding for the host.
//
// See also: `adapter.rs` for the state transitions that consume these,
// `convert.rs` for the dictionary shapes handed to scripts.

use serde::{Deserialize, Serialize};

/// Response codes carried in [`BillingResult::response_code`].
pub mod response_code {
    pub const SERVICE_TIMEOUT: i32 = -3;
    pub const FEATURE_NOT_SUPPORTED: i32 = -2;
    pub const SERVICE_DISCONNECTED: i32 = -1;
    pub const OK: i32 = 0;
    pub const USER_CANCELED: i32 = 1;
    pub const SERVICE_UNAVAILABLE: i32 = 2;
    pub const BILLING_UNAVAILABLE: i32 = 3;
    pub const ITEM_UNAVAILABLE: i32 = 4;
    pub const DEVELOPER_ERROR: i32 = 5;
    pub const ERROR: i32 = 6;
    pub const ITEM_ALREADY_OWNED: i32 = 7;
    pub const ITEM_NOT_OWNED: i32 = 8;
    pub const NETWORK_ERROR: i32 = 12;
}

/// States carried in `Purchase::purchase_state`.
pub mod purchase_state {
    pub const UNSPECIFIED: i32 = 0;
    pub const PURCHASED: i32 = 1;
    pub const PENDING: i32 = 2;
}

/// Recurrence of a subscription pricing phase.
pub mod recurrence_mode {
    pub const INFINITE_RECURRING: i32 = 1;
    pub const FINITE_RECURRING: i32 = 2;
    pub const NON_RECURRING: i32 = 3;
}

/// Proration behavior when replacing one subscription with another.
pub mod replacement_mode {
    pub const UNKNOWN_REPLACEMENT_MODE: i32 = 0;
    pub const WITH_TIME_PRORATION: i32 = 1;
    pub const CHARGE_PRORATED_PRICE: i32 = 2;
    pub const WITHOUT_PRORATION: i32 = 3;
    pub const CHARGE_FULL_PRICE: i32 = 5;
    pub const DEFERRED: i32 = 6;
}

/// The vendor's verdict for a billing operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BillingResult {
    pub response_code: i32,
    pub debug_message: String,
}

impl BillingResult {
    pub fn new(response_code: i32, debug_message: impl Into<String>) -> Self {
        Self {
            response_code,
            debug_message: debug_message.into(),
        }
    }

    /// An `OK` verdict with an empty debug message.
    pub fn ok() -> Self {
        Self::new(response_code::OK, "")
    }

    pub fn is_ok(&self) -> bool {
        self.response_code == response_code::OK
    }
}

/// Connection lifecycle of the billing client.
///
/// Mutated only by connection commands and setup/disconnect callbacks; read
/// by every operation that requires a ready connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    /// Stable integer encoding handed to scripts (0/1/2).
    pub fn as_code(self) -> i32 {
        match self {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
        }
    }
}
