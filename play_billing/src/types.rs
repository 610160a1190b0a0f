// Vendor record shapes returned by product and purchase queries.
//
// These structs mirror the vendor SDK's result objects field by field. The
// adapter never interprets them beyond the purchase precondition check — it
// caches product details and forwards everything else to the host.
//
// All types derive `Serialize`/`Deserialize` with snake_case field names
// matching the dictionary keys scripts see, so a converted value
// deserializes back into the same record (see `convert.rs`). Optional
// vendor fields are `Option` and are skipped when absent; list fields are
// always present, empty when the vendor returned nothing.

use serde::{Deserialize, Serialize};

/// Product type strings accepted by query and purchase operations.
pub mod product_type {
    /// One-time (consumable or entitlement) product.
    pub const INAPP: &str = "inapp";
    /// Subscription product with base plans and offers.
    pub const SUBS: &str = "subs";
}

/// A completed or pending transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    /// Order identifier. Absent for pending purchases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    /// Opaque token identifying this transaction; the handle for
    /// acknowledgment and consumption.
    pub purchase_token: String,
    pub package_name: String,
    /// See `response::purchase_state`.
    pub purchase_state: i32,
    /// Purchase time in milliseconds since the epoch.
    pub purchase_time: i64,
    /// The raw vendor response this record was parsed from.
    pub original_json: String,
    pub is_acknowledged: bool,
    pub is_auto_renewing: bool,
    pub quantity: i32,
    /// Vendor signature over `original_json`. Verification is the caller's
    /// business, not the bridge's.
    pub signature: String,
    /// Product identifiers covered by this transaction, in vendor order.
    pub product_ids: Vec<String>,
}

/// Price and terms of a one-time product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneTimePurchaseOfferDetails {
    /// Price in micro-units of the currency (1_000_000 micros = 1 unit).
    pub price_amount_micros: i64,
    pub price_currency_code: String,
    pub formatted_price: String,
}

/// Installment commitment attached to some subscription offers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstallmentPlanDetails {
    #[serde(rename = "installment_plan_commitment_payments_count")]
    pub commitment_payments_count: i32,
    #[serde(rename = "subsequent_installment_plan_commitment_payments_count")]
    pub subsequent_commitment_payments_count: i32,
}

/// One phase of a subscription offer's pricing schedule.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PricingPhase {
    pub price_amount_micros: i64,
    pub price_currency_code: String,
    pub formatted_price: String,
    /// ISO 8601 duration, e.g. "P1M".
    pub billing_period: String,
    /// See `response::recurrence_mode`.
    pub recurrence_mode: i32,
    pub billing_cycle_count: i32,
}

/// One purchasable price/terms variant of a subscription product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionOfferDetails {
    pub base_plan_id: String,
    /// Absent for the base plan's backwards-compatible offer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<String>,
    /// Token selecting this offer in a purchase flow.
    pub offer_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_plan_details: Option<InstallmentPlanDetails>,
    pub pricing_phases: Vec<PricingPhase>,
    #[serde(default)]
    pub offer_tags: Vec<String>,
}

/// Metadata for one queried product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub product_id: String,
    pub title: String,
    pub name: String,
    pub description: String,
    /// See `product_type`.
    pub product_type: String,
    /// Present only for one-time products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_time_purchase_offer_details: Option<OneTimePurchaseOfferDetails>,
    /// Offers for subscription products. Always present, empty for one-time
    /// products.
    #[serde(default)]
    pub subscription_offer_details: Vec<SubscriptionOfferDetails>,
}

/// A product the vendor could not resolve in a details query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnfetchedProduct {
    pub product_id: String,
    pub product_type: String,
    /// Vendor status code explaining why the product was not returned.
    pub status_code: i32,
}
