// play_billing — engine-agnostic core of the Google Play Billing bridge.
//
// This crate contains everything about the billing bridge that does not
// touch the engine: the vendor data model, the vendor-client boundary, the
// adapter state machine, and the conversion of results into the ordered
// key-value shapes scripts consume. The Godot layer
// (`play_billing_gdext`) is a thin shell over this crate and contains no
// billing logic.
//
// Module overview:
// - `response.rs`: `BillingResult`, vendor response codes, connection and
//                  purchase state vocabularies.
// - `types.rs`:    Vendor record shapes — purchases, product details,
//                  offers, pricing phases, unfetched products.
// - `client.rs`:   The `BillingClient` trait and `ClientEvent` completions,
//                  plus the `UnavailableClient` fallback.
// - `adapter.rs`:  `BillingAdapter` — command surface, precondition gates,
//                  details cache, completion translation.
// - `event.rs`:    `BillingEvent`, the script-visible notification surface.
// - `convert.rs`:  Vendor records and command verdicts as ordered JSON
//                  maps.
// - `mock.rs`:     Scriptable in-memory client for tests.
//
// Design decisions:
// - **Completions are messages, not callbacks.** Client implementations
//   push `ClientEvent`s into an `mpsc` channel; the adapter drains it in
//   `poll()` on the host's main thread. Adapter state is only ever touched
//   under `&mut self`, so the purchase precondition check cannot race a
//   query completing in flight.
// - **Failures are data.** Commands return `CommandResult`, vendor errors
//   arrive as events, and nothing is retried or reinterpreted.
// - **JSON as the interchange shape.** serde_json with `preserve_order`,
//   so dictionary key order is fixed by construction order.

pub mod adapter;
pub mod client;
pub mod convert;
pub mod event;
pub mod mock;
pub mod response;
pub mod types;

pub use adapter::{BillingAdapter, CommandResult};
pub use client::{
    BillingClient, BillingFlowParams, ClientEvent, ClientParams, ProductQuery,
    SubscriptionUpdateParams, UnavailableClient,
};
pub use event::BillingEvent;
pub use response::{BillingResult, ConnectionState};
pub use types::{ProductDetails, Purchase, UnfetchedProduct};
