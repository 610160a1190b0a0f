// Vendor-client boundary: the billing SDK as the adapter sees it.
//
// The real vendor client is platform code that performs network I/O on its
// own threads and reports completions via callbacks. That contract is
// expressed here as:
// - `BillingClient`: the operations the adapter invokes. Only
//   `launch_billing_flow` has a synchronous verdict; everything else
//   completes later.
// - `ClientEvent`: completions, pushed into an `mpsc` channel by whichever
//   thread the client implementation calls back on. The adapter owns the
//   `Receiver` and drains it on the host's main thread, so adapter state is
//   never touched from a callback thread.
//
// Implementations in this crate: `UnavailableClient` below (for platforms
// with no billing service) and `mock::MockBillingClient` (for tests). The
// client binding to the real platform SDK lives out of tree and only needs
// this trait plus a `Sender<ClientEvent>`.
//
// See also: `adapter.rs` for the consumer of both sides of this boundary.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};

use crate::response::{BillingResult, response_code};
use crate::types::{ProductDetails, Purchase, UnfetchedProduct};

/// One (product id, product type) pair in a details query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductQuery {
    pub product_id: String,
    pub product_type: String,
}

/// Construction-time options for a billing client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientParams {
    /// Whether the client accepts purchases that complete after a delay.
    /// The vendor requires this for production apps.
    pub enable_pending_purchases: bool,
    /// Whether pending purchases of prepaid subscription plans are accepted.
    pub enable_prepaid_plans: bool,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            enable_pending_purchases: true,
            enable_prepaid_plans: false,
        }
    }
}

/// Replacement of an existing subscription, attached to a purchase flow.
#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionUpdateParams {
    /// Token of the purchase being replaced.
    pub old_purchase_token: String,
    /// See `response::replacement_mode`.
    pub replacement_mode: i32,
}

/// Everything the vendor needs to launch a purchase flow.
#[derive(Clone, Debug, PartialEq)]
pub struct BillingFlowParams {
    /// Snapshot of the cached details for the product being bought.
    pub product_details: ProductDetails,
    /// Selected subscription offer. `None` for one-time products.
    pub offer_token: Option<String>,
    pub obfuscated_account_id: Option<String>,
    pub obfuscated_profile_id: Option<String>,
    pub subscription_update: Option<SubscriptionUpdateParams>,
}

/// Asynchronous completions pushed by a client implementation.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// Connection attempt finished, successfully or not.
    SetupFinished { result: BillingResult },
    /// The service dropped an established connection.
    ServiceDisconnected,
    /// A product details query finished.
    ProductDetailsResponse {
        result: BillingResult,
        product_details: Vec<ProductDetails>,
        unfetched_products: Vec<UnfetchedProduct>,
        /// The ids that were asked for, echoed back for error reporting.
        queried_ids: Vec<String>,
    },
    /// A purchase list query finished.
    PurchasesResponse {
        result: BillingResult,
        purchases: Vec<Purchase>,
    },
    /// Unsolicited push: purchases changed, typically because a flow
    /// completed. A `None` list with an OK result does occur.
    PurchasesUpdated {
        result: BillingResult,
        purchases: Option<Vec<Purchase>>,
    },
    /// An acknowledgment finished.
    AcknowledgeResponse {
        result: BillingResult,
        purchase_token: String,
    },
    /// A consumption finished.
    ConsumeResponse {
        result: BillingResult,
        purchase_token: String,
    },
}

/// The vendor billing client as the adapter drives it.
pub trait BillingClient {
    fn start_connection(&mut self);
    fn end_connection(&mut self);
    fn query_product_details(&mut self, queries: Vec<ProductQuery>);
    fn query_purchases(&mut self, product_type: String);
    /// Launch the purchase UI. The returned verdict only covers the launch;
    /// the outcome arrives later as `ClientEvent::PurchasesUpdated`.
    fn launch_billing_flow(&mut self, params: BillingFlowParams) -> BillingResult;
    fn acknowledge_purchase(&mut self, purchase_token: String);
    fn consume_purchase(&mut self, purchase_token: String);
}

/// Fallback client for platforms without a billing service.
///
/// Answers every operation with `BILLING_UNAVAILABLE` so scripts see
/// well-formed failures instead of hangs. This is what desktop and editor
/// builds run against.
pub struct UnavailableClient {
    events: Sender<ClientEvent>,
}

impl UnavailableClient {
    pub fn new(events: Sender<ClientEvent>) -> Self {
        Self { events }
    }

    fn verdict() -> BillingResult {
        BillingResult::new(
            response_code::BILLING_UNAVAILABLE,
            "Billing is not available on this platform.",
        )
    }
}

impl BillingClient for UnavailableClient {
    fn start_connection(&mut self) {
        let _ = self.events.send(ClientEvent::SetupFinished {
            result: Self::verdict(),
        });
    }

    fn end_connection(&mut self) {}

    fn query_product_details(&mut self, queries: Vec<ProductQuery>) {
        let queried_ids = queries.into_iter().map(|q| q.product_id).collect();
        let _ = self.events.send(ClientEvent::ProductDetailsResponse {
            result: Self::verdict(),
            product_details: Vec::new(),
            unfetched_products: Vec::new(),
            queried_ids,
        });
    }

    fn query_purchases(&mut self, _product_type: String) {
        let _ = self.events.send(ClientEvent::PurchasesResponse {
            result: Self::verdict(),
            purchases: Vec::new(),
        });
    }

    fn launch_billing_flow(&mut self, _params: BillingFlowParams) -> BillingResult {
        Self::verdict()
    }

    fn acknowledge_purchase(&mut self, purchase_token: String) {
        let _ = self.events.send(ClientEvent::AcknowledgeResponse {
            result: Self::verdict(),
            purchase_token,
        });
    }

    fn consume_purchase(&mut self, purchase_token: String) {
        let _ = self.events.send(ClientEvent::ConsumeResponse {
            result: Self::verdict(),
            purchase_token,
        });
    }
}
