// GDExtension bridge class for Google Play billing.
//
// Exposes a `GooglePlayBilling` node that Godot scenes can use to query
// products, launch purchase flows, and finish purchases. This is the sole
// interface between GDScript and the Rust billing core — all billing
// interaction goes through methods and signals on this class.
//
// ## What it exposes
//
// - **Connection:** `start_connection()`, `end_connection()`, `is_ready()`,
//   `get_connection_state()` (0 disconnected, 1 connecting, 2 connected).
//   Outcomes arrive as `connected`, `disconnected`, `connect_error` and,
//   after the app returns to the foreground, `billing_resume`.
// - **Catalog:** `query_product_details(ids, types)` — `types` is either a
//   single product type applied to every id or one type per id. Results
//   arrive as `product_details_query_completed(details, unfetched)` or
//   `product_details_query_error(code, message, queried_ids)`.
// - **Purchases:** `query_purchases(type)` with results on
//   `query_purchases_response`; `purchase(id)` /
//   `purchase_with_plan(id, base_plan)` launch the store flow, and finished
//   flows land on `purchases_updated` or `purchase_error`.
//   `update_subscription(...)` switches an active subscription to another
//   product, carrying the old purchase token and a replacement mode.
// - **Finishing:** `acknowledge_purchase(token)`, `consume_purchase(token)`
//   with per-token success and error signals.
// - **Account scoping:** `set_obfuscated_account_id(id)`,
//   `set_obfuscated_profile_id(id)` attach opaque ids to later flows.
// - **Client installation:** `install_client(client, inbox)` — Rust-level,
//   not a script method. The platform binding swaps in the real vendor
//   client; until then the node answers with the unavailable fallback.
//
// Every command returns a `VarDictionary` verdict: `{"status": 0}` when the
// request went out, or `{"status": 1, "response_code": ..,
// "debug_message": ..}` when it failed up front (`response_code` is null
// for failures raised on this side of the service boundary).
//
// Vendor callbacks land on a channel inside the core crate; `process()`
// drains them once per frame on the main thread and re-emits them as the
// signals above, so scripts never see billing state mid-mutation.
//
// See also: `lib.rs` for the GDExtension entry point, the `play_billing`
// crate for all billing logic, `variant.rs` for JSON-to-Variant
// conversion.

use std::sync::mpsc::Receiver;

use godot::classes::notify::NodeNotification;
use godot::prelude::*;
use serde_json::Value;

use play_billing::adapter::{BillingAdapter, CommandResult};
use play_billing::client::{BillingClient, ClientEvent};
use play_billing::convert;
use play_billing::event::BillingEvent;
use play_billing::response::BillingResult;

use crate::variant::{json_object_to_dictionary, json_value_to_variant, packed_strings};

/// Godot node that owns the billing client and relays its events.
///
/// Add this as a child node in your main scene. Call `start_connection()`
/// from GDScript, wait for `connected`, then query and purchase. The node
/// polls for billing events every frame while it is in the tree.
#[derive(GodotClass)]
#[class(base=Node)]
pub struct GooglePlayBilling {
    base: Base<Node>,
    adapter: BillingAdapter,
}

#[godot_api]
impl INode for GooglePlayBilling {
    fn init(base: Base<Node>) -> Self {
        Self {
            base,
            adapter: BillingAdapter::unavailable(),
        }
    }

    fn ready(&mut self) {
        self.base_mut().set_process(true);
    }

    fn process(&mut self, _delta: f64) {
        for event in self.adapter.poll() {
            self.emit_billing_event(event);
        }
    }

    fn on_notification(&mut self, what: NodeNotification) {
        if what != NodeNotification::APPLICATION_RESUMED {
            return;
        }
        if let Some(event) = self.adapter.on_main_resume() {
            self.emit_billing_event(event);
        }
    }
}

#[godot_api]
impl GooglePlayBilling {
    // ------------------------------------------------------------------
    // Signals
    // ------------------------------------------------------------------

    /// The billing service connection is established.
    #[signal]
    fn connected();

    /// The billing service connection has been lost.
    #[signal]
    fn disconnected();

    /// The app returned to the foreground; purchases may have completed
    /// outside the app, so re-query them.
    #[signal]
    fn billing_resume();

    /// Connecting to the billing service failed.
    #[signal]
    fn connect_error(response_code: i32, debug_message: GString);

    /// A purchase flow finished with new or changed purchases.
    #[signal]
    fn purchases_updated(purchases: Array<Variant>);

    /// A purchase flow finished without purchases (canceled or failed).
    #[signal]
    fn purchase_error(response_code: i32, debug_message: GString);

    /// Reply to `query_purchases`: `{"status": 0, "purchases": [..]}` on
    /// success, a failure verdict otherwise.
    #[signal]
    fn query_purchases_response(query_result: VarDictionary);

    /// Reply to `query_product_details`: fetched records and the ids the
    /// store did not recognize.
    #[signal]
    fn product_details_query_completed(
        product_details: Array<Variant>,
        unfetched_products: Array<Variant>,
    );

    /// `query_product_details` failed as a whole; no details were cached.
    #[signal]
    fn product_details_query_error(
        response_code: i32,
        debug_message: GString,
        queried_product_ids: PackedStringArray,
    );

    /// The purchase with this token is acknowledged.
    #[signal]
    fn purchase_acknowledged(purchase_token: GString);

    /// Acknowledging the purchase with this token failed.
    #[signal]
    fn purchase_acknowledgement_error(
        response_code: i32,
        debug_message: GString,
        purchase_token: GString,
    );

    /// The purchase with this token is consumed.
    #[signal]
    fn purchase_consumed(purchase_token: GString);

    /// Consuming the purchase with this token failed.
    #[signal]
    fn purchase_consumption_error(
        response_code: i32,
        debug_message: GString,
        purchase_token: GString,
    );

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Start connecting to the billing service. The outcome arrives as
    /// `connected` or `connect_error`.
    #[func]
    fn start_connection(&mut self) {
        godot_print!("GooglePlayBilling: connecting to the billing service");
        self.adapter.start_connection();
    }

    /// Close the billing service connection.
    #[func]
    fn end_connection(&mut self) {
        self.adapter.end_connection();
    }

    /// Return true while the billing service connection is established.
    #[func]
    fn is_ready(&self) -> bool {
        self.adapter.is_ready()
    }

    /// Return the connection state code (0 disconnected, 1 connecting,
    /// 2 connected).
    #[func]
    fn get_connection_state(&self) -> i32 {
        self.adapter.connection_state().as_code()
    }

    /// Query the user's current purchases of one product type ("inapp" or
    /// "subs"). Results arrive on `query_purchases_response`.
    #[func]
    fn query_purchases(&mut self, product_type: GString) -> VarDictionary {
        let result = self.adapter.query_purchases(&product_type.to_string());
        command_reply(&result)
    }

    /// Query the store catalog for the given product ids. `product_types`
    /// holds either a single type applied to every id or one type per id.
    /// Results arrive on `product_details_query_completed` or
    /// `product_details_query_error`.
    #[func]
    fn query_product_details(
        &mut self,
        product_ids: PackedStringArray,
        product_types: PackedStringArray,
    ) -> VarDictionary {
        let ids = to_strings(&product_ids);
        let types = to_strings(&product_types);
        let result = self.adapter.query_product_details(&ids, &types);
        command_reply(&result)
    }

    /// Launch the store purchase flow for a queried product. Subscriptions
    /// use the first offer of their first base plan; finished flows arrive
    /// on `purchases_updated` or `purchase_error`.
    #[func]
    fn purchase(&mut self, product_id: GString) -> VarDictionary {
        let result = self.adapter.purchase(&product_id.to_string());
        command_reply(&result)
    }

    /// Launch the store purchase flow for a subscription, using the first
    /// offer of the named base plan.
    #[func]
    fn purchase_with_plan(&mut self, product_id: GString, base_plan_id: GString) -> VarDictionary {
        let result = self
            .adapter
            .purchase_with_plan(&product_id.to_string(), &base_plan_id.to_string());
        command_reply(&result)
    }

    /// Switch an active subscription to another queried subscription
    /// product. `old_purchase_token` identifies the running subscription
    /// and `replacement_mode` is one of the replacement mode codes.
    #[func]
    fn update_subscription(
        &mut self,
        old_purchase_token: GString,
        product_id: GString,
        replacement_mode: i32,
    ) -> VarDictionary {
        let result = self.adapter.update_subscription(
            &old_purchase_token.to_string(),
            &product_id.to_string(),
            replacement_mode,
        );
        command_reply(&result)
    }

    /// `update_subscription`, targeting the first offer of the named base
    /// plan on the new product.
    #[func]
    fn update_subscription_with_plan(
        &mut self,
        old_purchase_token: GString,
        product_id: GString,
        base_plan_id: GString,
        replacement_mode: i32,
    ) -> VarDictionary {
        let result = self.adapter.update_subscription_with_plan(
            &old_purchase_token.to_string(),
            &product_id.to_string(),
            &base_plan_id.to_string(),
            replacement_mode,
        );
        command_reply(&result)
    }

    /// Acknowledge a non-consumable purchase or subscription. The outcome
    /// arrives on `purchase_acknowledged` or `purchase_acknowledgement_error`.
    #[func]
    fn acknowledge_purchase(&mut self, purchase_token: GString) -> VarDictionary {
        let result = self.adapter.acknowledge_purchase(&purchase_token.to_string());
        command_reply(&result)
    }

    /// Consume a purchase, removing it from the user's entitlements so it
    /// can be bought again. The outcome arrives on `purchase_consumed` or
    /// `purchase_consumption_error`.
    #[func]
    fn consume_purchase(&mut self, purchase_token: GString) -> VarDictionary {
        let result = self.adapter.consume_purchase(&purchase_token.to_string());
        command_reply(&result)
    }

    /// Attach an obfuscated account id to later purchase flows. An empty
    /// string detaches it.
    #[func]
    fn set_obfuscated_account_id(&mut self, account_id: GString) {
        self.adapter.set_obfuscated_account_id(&account_id.to_string());
    }

    /// Attach an obfuscated profile id to later purchase flows. An empty
    /// string detaches it.
    #[func]
    fn set_obfuscated_profile_id(&mut self, profile_id: GString) {
        self.adapter.set_obfuscated_profile_id(&profile_id.to_string());
    }
}

impl GooglePlayBilling {
    /// Install the platform billing client. The production binding calls
    /// this with its vendor client and the receiving half of the channel
    /// that client reports on. Replaces the adapter wholesale, so call it
    /// before `start_connection`.
    pub fn install_client(
        &mut self,
        client: Box<dyn BillingClient>,
        inbox: Receiver<ClientEvent>,
    ) {
        self.adapter.install_client(client, inbox);
    }

    fn emit(&mut self, name: &str, args: &[Variant]) {
        let _ = self.base_mut().emit_signal(name, args);
    }

    /// Emit a signal whose payload starts with (response_code,
    /// debug_message), followed by `rest`.
    fn emit_billing_error(&mut self, name: &str, result: &BillingResult, rest: &[Variant]) {
        let mut args = vec![
            result.response_code.to_variant(),
            GString::from(result.debug_message.as_str()).to_variant(),
        ];
        args.extend_from_slice(rest);
        self.emit(name, &args);
    }

    /// Re-emit one drained billing event as its GDScript-facing signal.
    fn emit_billing_event(&mut self, event: BillingEvent) {
        match event {
            BillingEvent::Connected => self.emit("connected", &[]),
            BillingEvent::Disconnected => self.emit("disconnected", &[]),
            BillingEvent::BillingResume => self.emit("billing_resume", &[]),
            BillingEvent::ConnectError { result } => {
                self.emit_billing_error("connect_error", &result, &[]);
            }
            BillingEvent::PurchasesUpdated { purchases } => {
                let list = json_value_to_variant(&convert::purchase_list_to_values(&purchases));
                self.emit("purchases_updated", &[list]);
            }
            BillingEvent::PurchaseError { result } => {
                self.emit_billing_error("purchase_error", &result, &[]);
            }
            BillingEvent::QueryPurchasesResponse { result, purchases } => {
                let reply = json_value_to_variant(&convert::query_purchases_response_to_value(
                    &result, &purchases,
                ));
                self.emit("query_purchases_response", &[reply]);
            }
            BillingEvent::ProductDetailsQueryCompleted {
                product_details,
                unfetched_products,
            } => {
                let details =
                    json_value_to_variant(&convert::product_details_list_to_values(&product_details));
                let unfetched = json_value_to_variant(&convert::unfetched_product_list_to_values(
                    &unfetched_products,
                ));
                self.emit("product_details_query_completed", &[details, unfetched]);
            }
            BillingEvent::ProductDetailsQueryError {
                result,
                queried_ids,
            } => {
                let ids = packed_strings(&queried_ids).to_variant();
                self.emit_billing_error("product_details_query_error", &result, &[ids]);
            }
            BillingEvent::PurchaseAcknowledged { purchase_token } => {
                let token = GString::from(purchase_token.as_str()).to_variant();
                self.emit("purchase_acknowledged", &[token]);
            }
            BillingEvent::PurchaseAcknowledgementError {
                result,
                purchase_token,
            } => {
                let token = GString::from(purchase_token.as_str()).to_variant();
                self.emit_billing_error("purchase_acknowledgement_error", &result, &[token]);
            }
            BillingEvent::PurchaseConsumed { purchase_token } => {
                let token = GString::from(purchase_token.as_str()).to_variant();
                self.emit("purchase_consumed", &[token]);
            }
            BillingEvent::PurchaseConsumptionError {
                result,
                purchase_token,
            } => {
                let token = GString::from(purchase_token.as_str()).to_variant();
                self.emit_billing_error("purchase_consumption_error", &result, &[token]);
            }
        }
    }
}

/// Convert a command verdict into the dictionary scripts receive, warning
/// on failures raised before the request reached the billing service.
fn command_reply(result: &CommandResult) -> VarDictionary {
    if result.is_local_failure() {
        let message = result.debug_message.as_deref().unwrap_or("");
        godot_warn!("GooglePlayBilling: {message}");
    }
    match convert::command_result_to_value(result) {
        Value::Object(map) => json_object_to_dictionary(&map),
        _ => VarDictionary::new(),
    }
}

fn to_strings(strings: &PackedStringArray) -> Vec<String> {
    strings.as_slice().iter().map(|s| s.to_string()).collect()
}
