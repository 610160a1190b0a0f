// Scriptable in-memory billing client for tests.
//
// `MockBillingClient` plays the vendor side of the `BillingClient`
// boundary: it serves a configurable product catalog and purchase store,
// answers with configurable verdicts, and records every launched flow so
// tests can assert on the exact parameters the adapter built.
//
// Behavior mirrors the real client where it matters to the adapter:
// - Operations before a successful connection answer with
//   `SERVICE_DISCONNECTED`.
// - A details query splits requested ids into found products and unfetched
//   products (id and type must both match the catalog entry).
// - A successful purchase flow synthesizes a purchase and pushes
//   `PurchasesUpdated`, like the platform does after the purchase UI
//   closes (disable with `set_complete_purchases(false)` to test flows
//   that stay pending).
// - Acknowledgment marks the stored purchase; consumption removes it.
//
// This is test support, so `expect` on the event channel is fine here: a
// send can only fail if the receiving adapter was dropped, which is a
// broken test setup worth failing loudly.

use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::client::{BillingClient, BillingFlowParams, ClientEvent, ClientParams, ProductQuery};
use crate::response::{BillingResult, purchase_state, response_code};
use crate::types::{ProductDetails, Purchase, UnfetchedProduct, product_type};

/// In-memory stand-in for the vendor billing client.
pub struct MockBillingClient {
    events: Sender<ClientEvent>,
    params: ClientParams,
    catalog: Vec<ProductDetails>,
    /// Stored purchases by product type.
    purchases: HashMap<String, Vec<Purchase>>,
    connection_result: BillingResult,
    flow_result: BillingResult,
    acknowledge_result: BillingResult,
    consume_result: BillingResult,
    complete_purchases: bool,
    connected: bool,
    next_order: u32,
    launched: Arc<Mutex<Vec<BillingFlowParams>>>,
}

impl MockBillingClient {
    pub fn new(params: ClientParams, events: Sender<ClientEvent>) -> Self {
        Self {
            events,
            params,
            catalog: Vec::new(),
            purchases: HashMap::new(),
            connection_result: BillingResult::ok(),
            flow_result: BillingResult::ok(),
            acknowledge_result: BillingResult::ok(),
            consume_result: BillingResult::ok(),
            complete_purchases: true,
            connected: false,
            next_order: 0,
            launched: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make a product queryable.
    pub fn add_product(&mut self, details: ProductDetails) {
        self.catalog.push(details);
    }

    /// Pre-seed an owned purchase, as if bought in an earlier session.
    pub fn add_purchase(&mut self, type_str: &str, purchase: Purchase) {
        self.purchases
            .entry(type_str.to_string())
            .or_default()
            .push(purchase);
    }

    pub fn set_connection_result(&mut self, result: BillingResult) {
        self.connection_result = result;
    }

    pub fn set_flow_result(&mut self, result: BillingResult) {
        self.flow_result = result;
    }

    pub fn set_acknowledge_result(&mut self, result: BillingResult) {
        self.acknowledge_result = result;
    }

    pub fn set_consume_result(&mut self, result: BillingResult) {
        self.consume_result = result;
    }

    /// Whether a successful flow immediately completes with a
    /// `PurchasesUpdated` push. On by default.
    pub fn set_complete_purchases(&mut self, complete: bool) {
        self.complete_purchases = complete;
    }

    /// Shared handle to the launched-flow log, for assertions after the
    /// client has been boxed into an adapter.
    pub fn launched(&self) -> Arc<Mutex<Vec<BillingFlowParams>>> {
        Arc::clone(&self.launched)
    }

    fn send(&self, event: ClientEvent) {
        self.events.send(event).expect("event receiver dropped");
    }

    fn disconnected() -> BillingResult {
        BillingResult::new(
            response_code::SERVICE_DISCONNECTED,
            "Service connection is disconnected.",
        )
    }

    fn synthesize_purchase(&mut self, params: &BillingFlowParams) -> Purchase {
        self.next_order += 1;
        let product_id = params.product_details.product_id.clone();
        Purchase {
            order_id: Some(format!("GPA.{:04}-MOCK", self.next_order)),
            purchase_token: format!("mock-token-{product_id}-{}", self.next_order),
            package_name: "com.example.mock".into(),
            purchase_state: purchase_state::PURCHASED,
            purchase_time: 1_756_080_000_000 + i64::from(self.next_order),
            original_json: "{}".into(),
            is_acknowledged: false,
            is_auto_renewing: params.product_details.product_type == product_type::SUBS,
            quantity: 1,
            signature: "mock-signature".into(),
            product_ids: vec![product_id],
        }
    }
}

impl BillingClient for MockBillingClient {
    fn start_connection(&mut self) {
        if self.connection_result.is_ok() {
            self.connected = true;
        }
        self.send(ClientEvent::SetupFinished {
            result: self.connection_result.clone(),
        });
    }

    fn end_connection(&mut self) {
        // The real client reports no callback for a local close.
        self.connected = false;
    }

    fn query_product_details(&mut self, queries: Vec<ProductQuery>) {
        let queried_ids: Vec<String> = queries.iter().map(|q| q.product_id.clone()).collect();
        if !self.connected {
            self.send(ClientEvent::ProductDetailsResponse {
                result: Self::disconnected(),
                product_details: Vec::new(),
                unfetched_products: Vec::new(),
                queried_ids,
            });
            return;
        }
        let mut product_details = Vec::new();
        let mut unfetched_products = Vec::new();
        for query in queries {
            let found = self.catalog.iter().find(|details| {
                details.product_id == query.product_id
                    && details.product_type == query.product_type
            });
            match found {
                Some(details) => product_details.push(details.clone()),
                None => unfetched_products.push(UnfetchedProduct {
                    product_id: query.product_id,
                    product_type: query.product_type,
                    status_code: response_code::ITEM_UNAVAILABLE,
                }),
            }
        }
        self.send(ClientEvent::ProductDetailsResponse {
            result: BillingResult::ok(),
            product_details,
            unfetched_products,
            queried_ids,
        });
    }

    fn query_purchases(&mut self, type_str: String) {
        if !self.connected {
            self.send(ClientEvent::PurchasesResponse {
                result: Self::disconnected(),
                purchases: Vec::new(),
            });
            return;
        }
        let purchases = self.purchases.get(&type_str).cloned().unwrap_or_default();
        self.send(ClientEvent::PurchasesResponse {
            result: BillingResult::ok(),
            purchases,
        });
    }

    fn launch_billing_flow(&mut self, params: BillingFlowParams) -> BillingResult {
        if !self.connected {
            return Self::disconnected();
        }
        if !self.params.enable_pending_purchases {
            return BillingResult::new(
                response_code::DEVELOPER_ERROR,
                "Pending purchases must be enabled.",
            );
        }
        self.launched
            .lock()
            .expect("launched log poisoned")
            .push(params.clone());
        if !self.flow_result.is_ok() {
            return self.flow_result.clone();
        }
        if self.complete_purchases {
            let purchase = self.synthesize_purchase(&params);
            self.purchases
                .entry(params.product_details.product_type.clone())
                .or_default()
                .push(purchase.clone());
            self.send(ClientEvent::PurchasesUpdated {
                result: BillingResult::ok(),
                purchases: Some(vec![purchase]),
            });
        }
        self.flow_result.clone()
    }

    fn acknowledge_purchase(&mut self, purchase_token: String) {
        if !self.connected {
            self.send(ClientEvent::AcknowledgeResponse {
                result: Self::disconnected(),
                purchase_token,
            });
            return;
        }
        if self.acknowledge_result.is_ok() {
            for stored in self.purchases.values_mut().flatten() {
                if stored.purchase_token == purchase_token {
                    stored.is_acknowledged = true;
                }
            }
        }
        self.send(ClientEvent::AcknowledgeResponse {
            result: self.acknowledge_result.clone(),
            purchase_token,
        });
    }

    fn consume_purchase(&mut self, purchase_token: String) {
        if !self.connected {
            self.send(ClientEvent::ConsumeResponse {
                result: Self::disconnected(),
                purchase_token,
            });
            return;
        }
        if self.consume_result.is_ok() {
            for stored in self.purchases.values_mut() {
                stored.retain(|purchase| purchase.purchase_token != purchase_token);
            }
        }
        self.send(ClientEvent::ConsumeResponse {
            result: self.consume_result.clone(),
            purchase_token,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Receiver};

    fn gold_pack() -> ProductDetails {
        ProductDetails {
            product_id: "gold_pack".into(),
            title: "Gold Pack".into(),
            name: "Gold Pack".into(),
            description: "A pile of gold".into(),
            product_type: product_type::INAPP.into(),
            one_time_purchase_offer_details: None,
            subscription_offer_details: Vec::new(),
        }
    }

    fn connected_mock() -> (MockBillingClient, Receiver<ClientEvent>) {
        let (tx, rx) = mpsc::channel();
        let mut mock = MockBillingClient::new(ClientParams::default(), tx);
        mock.start_connection();
        rx.try_recv().expect("setup event");
        (mock, rx)
    }

    #[test]
    fn operations_before_connect_report_service_disconnected() {
        let (tx, rx) = mpsc::channel();
        let mut mock = MockBillingClient::new(ClientParams::default(), tx);
        mock.query_purchases(product_type::INAPP.into());
        match rx.try_recv().expect("response") {
            ClientEvent::PurchasesResponse { result, .. } => {
                assert_eq!(result.response_code, response_code::SERVICE_DISCONNECTED);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn details_query_splits_found_and_unfetched() {
        let (mut mock, rx) = connected_mock();
        mock.add_product(gold_pack());
        mock.query_product_details(vec![
            ProductQuery {
                product_id: "gold_pack".into(),
                product_type: product_type::INAPP.into(),
            },
            // Right id, wrong type: not a catalog match.
            ProductQuery {
                product_id: "gold_pack".into(),
                product_type: product_type::SUBS.into(),
            },
        ]);
        match rx.try_recv().expect("response") {
            ClientEvent::ProductDetailsResponse {
                result,
                product_details,
                unfetched_products,
                queried_ids,
            } => {
                assert!(result.is_ok());
                assert_eq!(product_details.len(), 1);
                assert_eq!(unfetched_products.len(), 1);
                assert_eq!(unfetched_products[0].product_type, product_type::SUBS);
                assert_eq!(queried_ids.len(), 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn successful_flow_completes_with_a_purchase_push() {
        let (mut mock, rx) = connected_mock();
        let params = BillingFlowParams {
            product_details: gold_pack(),
            offer_token: None,
            obfuscated_account_id: None,
            obfuscated_profile_id: None,
            subscription_update: None,
        };
        assert!(mock.launch_billing_flow(params).is_ok());
        match rx.try_recv().expect("purchase push") {
            ClientEvent::PurchasesUpdated { result, purchases } => {
                assert!(result.is_ok());
                let purchases = purchases.expect("list");
                assert_eq!(purchases[0].product_ids, vec!["gold_pack".to_string()]);
                assert!(!purchases[0].is_acknowledged);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        // The purchase is now owned and visible to queries.
        mock.query_purchases(product_type::INAPP.into());
        match rx.try_recv().expect("query response") {
            ClientEvent::PurchasesResponse { purchases, .. } => {
                assert_eq!(purchases.len(), 1);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn consume_removes_the_stored_purchase() {
        let (mut mock, rx) = connected_mock();
        let params = BillingFlowParams {
            product_details: gold_pack(),
            offer_token: None,
            obfuscated_account_id: None,
            obfuscated_profile_id: None,
            subscription_update: None,
        };
        mock.launch_billing_flow(params);
        let token = match rx.try_recv().expect("purchase push") {
            ClientEvent::PurchasesUpdated { purchases, .. } => {
                purchases.expect("list")[0].purchase_token.clone()
            }
            other => panic!("unexpected event: {other:?}"),
        };

        mock.consume_purchase(token);
        rx.try_recv().expect("consume response");
        mock.query_purchases(product_type::INAPP.into());
        match rx.try_recv().expect("query response") {
            ClientEvent::PurchasesResponse { purchases, .. } => assert!(purchases.is_empty()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn disabled_pending_purchases_reject_flows() {
        let (tx, rx) = mpsc::channel();
        let params = ClientParams {
            enable_pending_purchases: false,
            enable_prepaid_plans: false,
        };
        let mut mock = MockBillingClient::new(params, tx);
        mock.start_connection();
        rx.try_recv().expect("setup event");

        let verdict = mock.launch_billing_flow(BillingFlowParams {
            product_details: gold_pack(),
            offer_token: None,
            obfuscated_account_id: None,
            obfuscated_profile_id: None,
            subscription_update: None,
        });
        assert_eq!(verdict.response_code, response_code::DEVELOPER_ERROR);
        assert!(mock.launched().lock().expect("log").is_empty());
    }
}
