// Host notification surface.
//
// `BillingEvent` is what the adapter hands to the engine layer after
// translating a `ClientEvent`: one variant per script-visible signal, with
// payloads already reduced to what the signal carries. The engine shell
// (see the gdext crate) maps each variant to a signal emission and nothing
// else.

use crate::response::BillingResult;
use crate::types::{ProductDetails, Purchase, UnfetchedProduct};

/// One script-visible notification.
#[derive(Clone, Debug, PartialEq)]
pub enum BillingEvent {
    /// Connection established.
    Connected,
    /// Connection lost (service side).
    Disconnected,
    /// The application returned to the foreground after a connection was
    /// requested at least once.
    BillingResume,
    /// Connection attempt failed.
    ConnectError { result: BillingResult },
    /// Purchases changed, typically because a purchase flow completed.
    PurchasesUpdated { purchases: Vec<Purchase> },
    /// A purchase flow or purchase push failed.
    PurchaseError { result: BillingResult },
    /// A purchase list query finished, successfully or not.
    QueryPurchasesResponse {
        result: BillingResult,
        purchases: Vec<Purchase>,
    },
    /// A product details query succeeded. Details are already cached.
    ProductDetailsQueryCompleted {
        product_details: Vec<ProductDetails>,
        unfetched_products: Vec<UnfetchedProduct>,
    },
    /// A product details query failed.
    ProductDetailsQueryError {
        result: BillingResult,
        queried_ids: Vec<String>,
    },
    PurchaseAcknowledged {
        purchase_token: String,
    },
    PurchaseAcknowledgementError {
        result: BillingResult,
        purchase_token: String,
    },
    PurchaseConsumed {
        purchase_token: String,
    },
    PurchaseConsumptionError {
        result: BillingResult,
        purchase_token: String,
    },
}
