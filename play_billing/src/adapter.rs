// Billing adapter: command surface, precondition gates, and callback
// translation.
//
// `BillingAdapter` sits between the host's command calls and a
// `BillingClient` implementation. Responsibilities:
// - Track the connection lifecycle and gate operations that need a ready
//   connection.
// - Cache product details from completed queries; purchasing is only
//   allowed for cached products (the vendor requires a details object to
//   launch a flow).
// - Build purchase-flow parameters: offer selection for subscriptions,
//   obfuscated ids, optional subscription replacement.
// - Translate client completions into `BillingEvent` notifications.
//
// Threading: the adapter owns the `Receiver` end of the client's event
// channel and applies completions only inside `poll()`, which the host
// calls on its main thread. All cache and state mutation therefore happens
// under `&mut self` on one thread; in particular the purchase
// check-then-launch sequence cannot interleave with a query completing in
// flight.
//
// Failures are data, never panics: every fallible command returns a
// `CommandResult`, and vendor errors arrive as events. No operation is
// retried and no vendor verdict is reinterpreted.
//
// See also: `client.rs` for the vendor boundary, `event.rs` for the
// notification surface, `convert.rs` for the dictionary forms of
// `CommandResult` and the vendor records.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver};

use crate::client::{
    BillingClient, BillingFlowParams, ClientEvent, ProductQuery, SubscriptionUpdateParams,
    UnavailableClient,
};
use crate::event::BillingEvent;
use crate::response::{BillingResult, ConnectionState, replacement_mode};
use crate::types::{ProductDetails, product_type};

/// Status codes carried in [`CommandResult::status`].
pub mod status {
    pub const OK: i32 = 0;
    pub const FAILED: i32 = 1;
}

const NOT_CONNECTED: &str = "The billing client is not connected!";
const MUST_QUERY_FIRST: &str =
    "You must query the product details and wait for the result before purchasing!";

/// Synchronous verdict of a command.
///
/// `status` is `status::OK` or `status::FAILED`. Failures detected locally
/// (a missing precondition) carry no vendor response code; failures
/// reported by the vendor carry its code and message.
#[derive(Clone, Debug, PartialEq)]
pub struct CommandResult {
    pub status: i32,
    pub response_code: Option<i32>,
    pub debug_message: Option<String>,
}

impl CommandResult {
    pub fn ok() -> Self {
        Self {
            status: status::OK,
            response_code: None,
            debug_message: None,
        }
    }

    /// A failure detected before reaching the vendor.
    pub fn precondition(debug_message: impl Into<String>) -> Self {
        Self {
            status: status::FAILED,
            response_code: None,
            debug_message: Some(debug_message.into()),
        }
    }

    /// A failure reported by the vendor.
    pub fn vendor(result: BillingResult) -> Self {
        Self {
            status: status::FAILED,
            response_code: Some(result.response_code),
            debug_message: Some(result.debug_message),
        }
    }

    /// Fold a synchronous vendor verdict into a command result.
    pub fn from_launch(result: BillingResult) -> Self {
        if result.is_ok() {
            Self::ok()
        } else {
            Self::vendor(result)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == status::OK
    }

    /// True for failures that never reached the vendor.
    pub fn is_local_failure(&self) -> bool {
        self.status == status::FAILED && self.response_code.is_none()
    }
}

/// State machine bridging host commands to a billing client.
pub struct BillingAdapter {
    client: Box<dyn BillingClient>,
    inbox: Receiver<ClientEvent>,
    connection_state: ConnectionState,
    product_details_cache: HashMap<String, ProductDetails>,
    obfuscated_account_id: String,
    obfuscated_profile_id: String,
    called_start_connection: bool,
}

impl BillingAdapter {
    /// Wire an adapter to a client that reports on `inbox`.
    pub fn new(client: Box<dyn BillingClient>, inbox: Receiver<ClientEvent>) -> Self {
        Self {
            client,
            inbox,
            connection_state: ConnectionState::Disconnected,
            product_details_cache: HashMap::new(),
            obfuscated_account_id: String::new(),
            obfuscated_profile_id: String::new(),
            called_start_connection: false,
        }
    }

    /// An adapter backed by `UnavailableClient`, for platforms without a
    /// billing service.
    pub fn unavailable() -> Self {
        let (tx, rx) = mpsc::channel();
        Self::new(Box::new(UnavailableClient::new(tx)), rx)
    }

    /// Replace the backing client and reset all adapter state. Completions
    /// still queued on the old inbox are dropped with it.
    pub fn install_client(
        &mut self,
        client: Box<dyn BillingClient>,
        inbox: Receiver<ClientEvent>,
    ) {
        *self = Self::new(client, inbox);
    }

    pub fn start_connection(&mut self) {
        self.called_start_connection = true;
        self.connection_state = ConnectionState::Connecting;
        self.client.start_connection();
    }

    /// Close the connection. The adapter can be reconnected afterwards with
    /// `start_connection`.
    pub fn end_connection(&mut self) {
        self.client.end_connection();
        self.connection_state = ConnectionState::Disconnected;
    }

    pub fn is_ready(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    /// Ask the vendor for all current purchases of one product type. The
    /// answer arrives as `BillingEvent::QueryPurchasesResponse`.
    pub fn query_purchases(&mut self, product_type_str: &str) -> CommandResult {
        if !self.is_ready() {
            return CommandResult::precondition(NOT_CONNECTED);
        }
        if let Err(message) = check_product_type(product_type_str) {
            return CommandResult::precondition(message);
        }
        self.client.query_purchases(product_type_str.to_string());
        CommandResult::ok()
    }

    /// Ask the vendor for details of the given products. A single entry in
    /// `product_types` applies to every id; otherwise the two slices must
    /// pair up. The answer arrives as `ProductDetailsQueryCompleted` or
    /// `ProductDetailsQueryError`.
    pub fn query_product_details(
        &mut self,
        product_ids: &[String],
        product_types: &[String],
    ) -> CommandResult {
        if !self.is_ready() {
            return CommandResult::precondition(NOT_CONNECTED);
        }
        if product_ids.is_empty() {
            return CommandResult::precondition("No product ids were given!");
        }
        let types: Vec<&str> = if product_types.len() == 1 {
            vec![product_types[0].as_str(); product_ids.len()]
        } else if product_types.len() == product_ids.len() {
            product_types.iter().map(String::as_str).collect()
        } else {
            return CommandResult::precondition(
                "Product id and product type counts do not match!",
            );
        };
        for type_str in &types {
            if let Err(message) = check_product_type(type_str) {
                return CommandResult::precondition(message);
            }
        }
        let queries = product_ids
            .iter()
            .zip(types)
            .map(|(id, type_str)| ProductQuery {
                product_id: id.clone(),
                product_type: type_str.to_string(),
            })
            .collect();
        self.client.query_product_details(queries);
        CommandResult::ok()
    }

    /// Launch a purchase flow for a cached product, selecting the first
    /// subscription offer when the product is a subscription.
    pub fn purchase(&mut self, product_id: &str) -> CommandResult {
        self.purchase_internal(product_id, "", None)
    }

    /// Launch a purchase flow selecting the first offer of the named base
    /// plan.
    pub fn purchase_with_plan(&mut self, product_id: &str, base_plan_id: &str) -> CommandResult {
        self.purchase_internal(product_id, base_plan_id, None)
    }

    /// Replace an existing subscription. Replacement parameters are
    /// attached only when `replacement_mode` names an actual proration
    /// policy; with `UNKNOWN_REPLACEMENT_MODE` the flow launches without
    /// them, exactly as if `purchase` had been called.
    pub fn update_subscription(
        &mut self,
        old_purchase_token: &str,
        product_id: &str,
        replacement_mode_code: i32,
    ) -> CommandResult {
        self.update_subscription_with_plan(old_purchase_token, product_id, "", replacement_mode_code)
    }

    /// `update_subscription`, selecting the first offer of the named base
    /// plan.
    pub fn update_subscription_with_plan(
        &mut self,
        old_purchase_token: &str,
        product_id: &str,
        base_plan_id: &str,
        replacement_mode_code: i32,
    ) -> CommandResult {
        if old_purchase_token.is_empty() {
            return CommandResult::precondition(
                "An old purchase token is required to update a subscription!",
            );
        }
        let update = if replacement_mode_code == replacement_mode::UNKNOWN_REPLACEMENT_MODE {
            None
        } else {
            Some(SubscriptionUpdateParams {
                old_purchase_token: old_purchase_token.to_string(),
                replacement_mode: replacement_mode_code,
            })
        };
        self.purchase_internal(product_id, base_plan_id, update)
    }

    /// Confirm entitlement for a purchase. The answer arrives as
    /// `PurchaseAcknowledged` or `PurchaseAcknowledgementError`.
    pub fn acknowledge_purchase(&mut self, purchase_token: &str) -> CommandResult {
        if !self.is_ready() {
            return CommandResult::precondition(NOT_CONNECTED);
        }
        self.client.acknowledge_purchase(purchase_token.to_string());
        CommandResult::ok()
    }

    /// Consume a purchase so the product can be bought again. The answer
    /// arrives as `PurchaseConsumed` or `PurchaseConsumptionError`.
    pub fn consume_purchase(&mut self, purchase_token: &str) -> CommandResult {
        if !self.is_ready() {
            return CommandResult::precondition(NOT_CONNECTED);
        }
        self.client.consume_purchase(purchase_token.to_string());
        CommandResult::ok()
    }

    /// Set the obfuscated account id attached to subsequent purchase flows.
    /// Last write wins; an empty string detaches it.
    pub fn set_obfuscated_account_id(&mut self, id: &str) {
        self.obfuscated_account_id = id.to_string();
    }

    /// Set the obfuscated profile id attached to subsequent purchase flows.
    /// Last write wins; an empty string detaches it.
    pub fn set_obfuscated_profile_id(&mut self, id: &str) {
        self.obfuscated_profile_id = id.to_string();
    }

    /// Drain the client's completions, apply their state transitions, and
    /// return the notifications to emit, in arrival order.
    pub fn poll(&mut self) -> Vec<BillingEvent> {
        let mut events = Vec::new();
        while let Ok(client_event) = self.inbox.try_recv() {
            events.push(self.apply(client_event));
        }
        events
    }

    /// Called when the application returns to the foreground. Forwarded to
    /// scripts only once a connection has been requested, so launch-time
    /// resume notifications stay silent.
    pub fn on_main_resume(&mut self) -> Option<BillingEvent> {
        if self.called_start_connection {
            Some(BillingEvent::BillingResume)
        } else {
            None
        }
    }

    fn purchase_internal(
        &mut self,
        product_id: &str,
        base_plan_id: &str,
        subscription_update: Option<SubscriptionUpdateParams>,
    ) -> CommandResult {
        let Some(details) = self.product_details_cache.get(product_id) else {
            return CommandResult::precondition(MUST_QUERY_FIRST);
        };
        let offer_token = match select_offer_token(details, base_plan_id) {
            Ok(token) => token,
            Err(message) => return CommandResult::precondition(message),
        };
        let params = BillingFlowParams {
            product_details: details.clone(),
            offer_token,
            obfuscated_account_id: non_empty(&self.obfuscated_account_id),
            obfuscated_profile_id: non_empty(&self.obfuscated_profile_id),
            subscription_update,
        };
        CommandResult::from_launch(self.client.launch_billing_flow(params))
    }

    /// Translate one client completion, updating adapter state as a side
    /// effect. The only writers of `connection_state` are here and the
    /// connection commands.
    fn apply(&mut self, event: ClientEvent) -> BillingEvent {
        match event {
            ClientEvent::SetupFinished { result } => {
                if result.is_ok() {
                    self.connection_state = ConnectionState::Connected;
                    BillingEvent::Connected
                } else {
                    self.connection_state = ConnectionState::Disconnected;
                    BillingEvent::ConnectError { result }
                }
            }
            ClientEvent::ServiceDisconnected => {
                self.connection_state = ConnectionState::Disconnected;
                BillingEvent::Disconnected
            }
            ClientEvent::ProductDetailsResponse {
                result,
                product_details,
                unfetched_products,
                queried_ids,
            } => {
                if result.is_ok() {
                    for details in &product_details {
                        self.product_details_cache
                            .insert(details.product_id.clone(), details.clone());
                    }
                    BillingEvent::ProductDetailsQueryCompleted {
                        product_details,
                        unfetched_products,
                    }
                } else {
                    BillingEvent::ProductDetailsQueryError {
                        result,
                        queried_ids,
                    }
                }
            }
            ClientEvent::PurchasesResponse { result, purchases } => {
                BillingEvent::QueryPurchasesResponse { result, purchases }
            }
            // An OK result with a null list is a real vendor behavior; it is
            // surfaced as an error carrying the OK code.
            ClientEvent::PurchasesUpdated { result, purchases } => match purchases {
                Some(purchases) if result.is_ok() => BillingEvent::PurchasesUpdated { purchases },
                _ => BillingEvent::PurchaseError { result },
            },
            ClientEvent::AcknowledgeResponse {
                result,
                purchase_token,
            } => {
                if result.is_ok() {
                    BillingEvent::PurchaseAcknowledged { purchase_token }
                } else {
                    BillingEvent::PurchaseAcknowledgementError {
                        result,
                        purchase_token,
                    }
                }
            }
            ClientEvent::ConsumeResponse {
                result,
                purchase_token,
            } => {
                if result.is_ok() {
                    BillingEvent::PurchaseConsumed { purchase_token }
                } else {
                    BillingEvent::PurchaseConsumptionError {
                        result,
                        purchase_token,
                    }
                }
            }
        }
    }
}

/// Pick the offer token for a purchase flow. One-time products have none;
/// subscriptions take the first offer, or the first offer of the named base
/// plan.
fn select_offer_token(
    details: &ProductDetails,
    base_plan_id: &str,
) -> Result<Option<String>, String> {
    if details.product_type != product_type::SUBS {
        if base_plan_id.is_empty() {
            return Ok(None);
        }
        return Err(format!(
            "Product {} is not a subscription!",
            details.product_id
        ));
    }
    let offer = if base_plan_id.is_empty() {
        details.subscription_offer_details.first()
    } else {
        details
            .subscription_offer_details
            .iter()
            .find(|offer| offer.base_plan_id == base_plan_id)
    };
    match offer {
        Some(offer) => Ok(Some(offer.offer_token.clone())),
        None if base_plan_id.is_empty() => Err(format!(
            "Subscription {} has no offers!",
            details.product_id
        )),
        None => Err(format!(
            "Subscription {} has no base plan {base_plan_id}!",
            details.product_id
        )),
    }
}

fn check_product_type(type_str: &str) -> Result<(), String> {
    if type_str == product_type::INAPP || type_str == product_type::SUBS {
        Ok(())
    } else {
        Err(format!("Unknown product type {type_str}!"))
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
