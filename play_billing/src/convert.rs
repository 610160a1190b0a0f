// Conversion of vendor records and command verdicts into ordered JSON maps.
//
// These are the structured values scripts receive: each function is a
// stateless field-by-field transcription with a fixed key order (serde_json
// is built with `preserve_order`, so construction order is iteration
// order). The engine shell turns the values into dictionaries without
// reordering.
//
// Conventions:
// - Optional vendor fields that are absent produce no key at all, with one
//   exception: `response_code` in a failed command result is an explicit
//   null, keeping the (status, response_code, debug_message) interface
//   shape stable for scripts.
// - List-valued fields are always present, an empty list when the vendor
//   returned nothing. Never null.
// - Product-id order is the vendor's order, unchanged.
// - Price micros stay `i64` JSON integers end to end; there is no float
//   path to lose precision through.
//
// See also: `types.rs` for the record definitions, `adapter.rs` for
// `CommandResult`.

use serde_json::{Map, Value};

use crate::adapter::{CommandResult, status};
use crate::response::BillingResult;
use crate::types::{
    InstallmentPlanDetails, OneTimePurchaseOfferDetails, PricingPhase, ProductDetails, Purchase,
    SubscriptionOfferDetails, UnfetchedProduct,
};

/// `{ response_code, debug_message }`.
pub fn billing_result_to_value(result: &BillingResult) -> Value {
    let mut map = Map::new();
    map.insert("response_code".into(), Value::from(result.response_code));
    map.insert(
        "debug_message".into(),
        Value::from(result.debug_message.as_str()),
    );
    Value::Object(map)
}

/// `{ status: 0 }` on success; `{ status: 1, response_code, debug_message }`
/// on failure, with a null `response_code` when the failure never reached
/// the vendor.
pub fn command_result_to_value(result: &CommandResult) -> Value {
    let mut map = Map::new();
    map.insert("status".into(), Value::from(result.status));
    if result.status != status::OK {
        let code = match result.response_code {
            Some(code) => Value::from(code),
            None => Value::Null,
        };
        map.insert("response_code".into(), code);
        map.insert(
            "debug_message".into(),
            Value::from(result.debug_message.as_deref().unwrap_or("")),
        );
    }
    Value::Object(map)
}

/// The payload of a purchase list query: `{ status: 0, purchases }` on
/// success, the failed command-result shape otherwise.
pub fn query_purchases_response_to_value(result: &BillingResult, purchases: &[Purchase]) -> Value {
    if result.is_ok() {
        let mut map = Map::new();
        map.insert("status".into(), Value::from(status::OK));
        map.insert("purchases".into(), purchase_list_to_values(purchases));
        Value::Object(map)
    } else {
        command_result_to_value(&CommandResult::vendor(result.clone()))
    }
}

pub fn purchase_to_value(purchase: &Purchase) -> Value {
    let mut map = Map::new();
    if let Some(order_id) = &purchase.order_id {
        map.insert("order_id".into(), Value::from(order_id.as_str()));
    }
    map.insert(
        "purchase_token".into(),
        Value::from(purchase.purchase_token.as_str()),
    );
    map.insert(
        "package_name".into(),
        Value::from(purchase.package_name.as_str()),
    );
    map.insert("purchase_state".into(), Value::from(purchase.purchase_state));
    map.insert("purchase_time".into(), Value::from(purchase.purchase_time));
    map.insert(
        "original_json".into(),
        Value::from(purchase.original_json.as_str()),
    );
    map.insert(
        "is_acknowledged".into(),
        Value::from(purchase.is_acknowledged),
    );
    map.insert(
        "is_auto_renewing".into(),
        Value::from(purchase.is_auto_renewing),
    );
    map.insert("quantity".into(), Value::from(purchase.quantity));
    map.insert("signature".into(), Value::from(purchase.signature.as_str()));
    map.insert(
        "product_ids".into(),
        Value::from(purchase.product_ids.clone()),
    );
    Value::Object(map)
}

pub fn purchase_list_to_values(purchases: &[Purchase]) -> Value {
    Value::Array(purchases.iter().map(purchase_to_value).collect())
}

pub fn product_details_to_value(details: &ProductDetails) -> Value {
    let mut map = Map::new();
    map.insert("product_id".into(), Value::from(details.product_id.as_str()));
    map.insert("title".into(), Value::from(details.title.as_str()));
    map.insert("name".into(), Value::from(details.name.as_str()));
    map.insert(
        "description".into(),
        Value::from(details.description.as_str()),
    );
    map.insert(
        "product_type".into(),
        Value::from(details.product_type.as_str()),
    );
    if let Some(offer) = &details.one_time_purchase_offer_details {
        map.insert(
            "one_time_purchase_offer_details".into(),
            one_time_offer_to_value(offer),
        );
    }
    map.insert(
        "subscription_offer_details".into(),
        Value::Array(
            details
                .subscription_offer_details
                .iter()
                .map(subscription_offer_to_value)
                .collect(),
        ),
    );
    Value::Object(map)
}

pub fn product_details_list_to_values(details: &[ProductDetails]) -> Value {
    Value::Array(details.iter().map(product_details_to_value).collect())
}

pub fn unfetched_product_to_value(product: &UnfetchedProduct) -> Value {
    let mut map = Map::new();
    map.insert("product_id".into(), Value::from(product.product_id.as_str()));
    map.insert(
        "product_type".into(),
        Value::from(product.product_type.as_str()),
    );
    map.insert("status_code".into(), Value::from(product.status_code));
    Value::Object(map)
}

pub fn unfetched_product_list_to_values(products: &[UnfetchedProduct]) -> Value {
    Value::Array(products.iter().map(unfetched_product_to_value).collect())
}

fn one_time_offer_to_value(offer: &OneTimePurchaseOfferDetails) -> Value {
    let mut map = Map::new();
    map.insert(
        "price_amount_micros".into(),
        Value::from(offer.price_amount_micros),
    );
    map.insert(
        "price_currency_code".into(),
        Value::from(offer.price_currency_code.as_str()),
    );
    map.insert(
        "formatted_price".into(),
        Value::from(offer.formatted_price.as_str()),
    );
    Value::Object(map)
}

fn subscription_offer_to_value(offer: &SubscriptionOfferDetails) -> Value {
    let mut map = Map::new();
    map.insert("base_plan_id".into(), Value::from(offer.base_plan_id.as_str()));
    if let Some(offer_id) = &offer.offer_id {
        map.insert("offer_id".into(), Value::from(offer_id.as_str()));
    }
    map.insert("offer_token".into(), Value::from(offer.offer_token.as_str()));
    if let Some(plan) = &offer.installment_plan_details {
        map.insert("installment_plan_details".into(), installment_plan_to_value(plan));
    }
    map.insert(
        "pricing_phases".into(),
        Value::Array(offer.pricing_phases.iter().map(pricing_phase_to_value).collect()),
    );
    map.insert("offer_tags".into(), Value::from(offer.offer_tags.clone()));
    Value::Object(map)
}

fn installment_plan_to_value(plan: &InstallmentPlanDetails) -> Value {
    let mut map = Map::new();
    map.insert(
        "installment_plan_commitment_payments_count".into(),
        Value::from(plan.commitment_payments_count),
    );
    map.insert(
        "subsequent_installment_plan_commitment_payments_count".into(),
        Value::from(plan.subsequent_commitment_payments_count),
    );
    Value::Object(map)
}

fn pricing_phase_to_value(phase: &PricingPhase) -> Value {
    let mut map = Map::new();
    map.insert(
        "price_amount_micros".into(),
        Value::from(phase.price_amount_micros),
    );
    map.insert(
        "price_currency_code".into(),
        Value::from(phase.price_currency_code.as_str()),
    );
    map.insert(
        "formatted_price".into(),
        Value::from(phase.formatted_price.as_str()),
    );
    map.insert(
        "billing_period".into(),
        Value::from(phase.billing_period.as_str()),
    );
    map.insert("recurrence_mode".into(), Value::from(phase.recurrence_mode));
    map.insert(
        "billing_cycle_count".into(),
        Value::from(phase.billing_cycle_count),
    );
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::response::{purchase_state, recurrence_mode, response_code};

    fn sample_purchase() -> Purchase {
        Purchase {
            order_id: Some("GPA.3317-0762-9964-88091".into()),
            purchase_token: "opaque-token-".repeat(20),
            package_name: "com.example.game".into(),
            purchase_state: purchase_state::PURCHASED,
            purchase_time: 1_756_080_000_123,
            original_json: r#"{"productIds":["gold_pack"]}"#.into(),
            is_acknowledged: false,
            is_auto_renewing: true,
            quantity: 3,
            signature: "MEUCIQ:base64sig".into(),
            product_ids: vec![
                "gold_pack".into(),
                "gem_pack".into(),
                "starter_bundle".into(),
            ],
        }
    }

    fn sample_subscription() -> ProductDetails {
        ProductDetails {
            product_id: "premium".into(),
            title: "Premium (Example Game)".into(),
            name: "Premium".into(),
            description: "All the features".into(),
            product_type: "subs".into(),
            one_time_purchase_offer_details: None,
            subscription_offer_details: vec![
                SubscriptionOfferDetails {
                    base_plan_id: "monthly".into(),
                    offer_id: Some("intro-month".into()),
                    offer_token: "offer-token-monthly".into(),
                    installment_plan_details: None,
                    pricing_phases: vec![
                        PricingPhase {
                            price_amount_micros: 0,
                            price_currency_code: "USD".into(),
                            formatted_price: "Free".into(),
                            billing_period: "P1W".into(),
                            recurrence_mode: recurrence_mode::FINITE_RECURRING,
                            billing_cycle_count: 1,
                        },
                        PricingPhase {
                            price_amount_micros: 9_990_000,
                            price_currency_code: "USD".into(),
                            formatted_price: "$9.99".into(),
                            billing_period: "P1M".into(),
                            recurrence_mode: recurrence_mode::INFINITE_RECURRING,
                            billing_cycle_count: 0,
                        },
                    ],
                    offer_tags: vec!["intro".into()],
                },
                SubscriptionOfferDetails {
                    base_plan_id: "yearly".into(),
                    offer_id: None,
                    offer_token: "offer-token-yearly".into(),
                    installment_plan_details: Some(InstallmentPlanDetails {
                        commitment_payments_count: 12,
                        subsequent_commitment_payments_count: 1,
                    }),
                    pricing_phases: vec![PricingPhase {
                        price_amount_micros: 99_990_000,
                        price_currency_code: "USD".into(),
                        formatted_price: "$99.99".into(),
                        billing_period: "P1Y".into(),
                        recurrence_mode: recurrence_mode::INFINITE_RECURRING,
                        billing_cycle_count: 0,
                    }],
                    offer_tags: Vec::new(),
                },
            ],
        }
    }

    fn keys_of(value: &Value) -> Vec<&str> {
        match value {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            other => panic!("expected an object, got {other}"),
        }
    }

    #[test]
    fn purchase_keeps_product_ids_count_and_order() {
        let value = purchase_to_value(&sample_purchase());
        assert_eq!(
            value["product_ids"],
            json!(["gold_pack", "gem_pack", "starter_bundle"])
        );
    }

    #[test]
    fn purchase_key_order_is_fixed() {
        let value = purchase_to_value(&sample_purchase());
        assert_eq!(
            keys_of(&value),
            vec![
                "order_id",
                "purchase_token",
                "package_name",
                "purchase_state",
                "purchase_time",
                "original_json",
                "is_acknowledged",
                "is_auto_renewing",
                "quantity",
                "signature",
                "product_ids",
            ]
        );
    }

    #[test]
    fn pending_purchase_omits_order_id() {
        let mut purchase = sample_purchase();
        purchase.order_id = None;
        purchase.purchase_state = purchase_state::PENDING;
        let value = purchase_to_value(&purchase);
        assert!(value.get("order_id").is_none());
        assert_eq!(value["purchase_state"], json!(purchase_state::PENDING));
    }

    #[test]
    fn purchase_round_trips_without_loss() {
        let purchase = sample_purchase();
        let value = purchase_to_value(&purchase);
        let back: Purchase = serde_json::from_value(value).expect("converted purchase must parse");
        assert_eq!(back, purchase);
        assert_eq!(back.purchase_time, 1_756_080_000_123);
        assert_eq!(back.purchase_token.len(), "opaque-token-".len() * 20);
    }

    #[test]
    fn one_time_product_has_empty_offer_list_not_null() {
        let details = ProductDetails {
            product_id: "gold_pack".into(),
            title: "Gold Pack".into(),
            name: "Gold Pack".into(),
            description: "A pile of gold".into(),
            product_type: "inapp".into(),
            one_time_purchase_offer_details: Some(OneTimePurchaseOfferDetails {
                price_amount_micros: 4_990_000,
                price_currency_code: "USD".into(),
                formatted_price: "$4.99".into(),
            }),
            subscription_offer_details: Vec::new(),
        };
        let value = product_details_to_value(&details);
        assert_eq!(value["subscription_offer_details"], json!([]));
        assert_eq!(
            value["one_time_purchase_offer_details"],
            json!({
                "price_amount_micros": 4_990_000,
                "price_currency_code": "USD",
                "formatted_price": "$4.99",
            })
        );
    }

    #[test]
    fn product_details_key_order_is_fixed() {
        let value = product_details_to_value(&sample_subscription());
        assert_eq!(
            keys_of(&value),
            vec![
                "product_id",
                "title",
                "name",
                "description",
                "product_type",
                "subscription_offer_details",
            ]
        );
        assert_eq!(
            keys_of(&value["subscription_offer_details"][0]),
            vec![
                "base_plan_id",
                "offer_id",
                "offer_token",
                "pricing_phases",
                "offer_tags",
            ]
        );
        assert_eq!(
            keys_of(&value["subscription_offer_details"][1]),
            vec![
                "base_plan_id",
                "offer_token",
                "installment_plan_details",
                "pricing_phases",
                "offer_tags",
            ]
        );
    }

    #[test]
    fn subscription_details_round_trip_without_loss() {
        let details = sample_subscription();
        let value = product_details_to_value(&details);
        let back: ProductDetails =
            serde_json::from_value(value).expect("converted details must parse");
        assert_eq!(back, details);
    }

    #[test]
    fn price_micros_survive_as_integers() {
        let mut details = sample_subscription();
        details.subscription_offer_details[1].pricing_phases[0].price_amount_micros =
            4_503_599_627_370_496;
        let value = product_details_to_value(&details);
        let micros =
            &value["subscription_offer_details"][1]["pricing_phases"][0]["price_amount_micros"];
        assert_eq!(micros.as_i64(), Some(4_503_599_627_370_496));
    }

    #[test]
    fn ok_command_result_is_just_a_status() {
        assert_eq!(
            command_result_to_value(&CommandResult::ok()),
            json!({ "status": 0 })
        );
    }

    #[test]
    fn local_failure_has_null_response_code() {
        let value = command_result_to_value(&CommandResult::precondition("not yet queried"));
        assert_eq!(
            value,
            json!({
                "status": 1,
                "response_code": null,
                "debug_message": "not yet queried",
            })
        );
        assert_eq!(keys_of(&value), vec!["status", "response_code", "debug_message"]);
    }

    #[test]
    fn vendor_failure_carries_its_code() {
        let result = BillingResult::new(response_code::ITEM_ALREADY_OWNED, "already owned");
        let value = command_result_to_value(&CommandResult::vendor(result));
        assert_eq!(
            value,
            json!({
                "status": 1,
                "response_code": response_code::ITEM_ALREADY_OWNED,
                "debug_message": "already owned",
            })
        );
    }

    #[test]
    fn query_purchases_response_has_both_shapes() {
        let ok = query_purchases_response_to_value(
            &BillingResult::ok(),
            &[sample_purchase()],
        );
        assert_eq!(keys_of(&ok), vec!["status", "purchases"]);
        assert_eq!(ok["status"], json!(0));
        assert_eq!(ok["purchases"].as_array().map(Vec::len), Some(1));

        let failed = query_purchases_response_to_value(
            &BillingResult::new(response_code::SERVICE_DISCONNECTED, "gone"),
            &[],
        );
        assert_eq!(
            failed,
            json!({
                "status": 1,
                "response_code": response_code::SERVICE_DISCONNECTED,
                "debug_message": "gone",
            })
        );
    }

    #[test]
    fn billing_result_value_shape() {
        let value =
            billing_result_to_value(&BillingResult::new(response_code::NETWORK_ERROR, "offline"));
        assert_eq!(keys_of(&value), vec!["response_code", "debug_message"]);
        assert_eq!(value["response_code"], json!(response_code::NETWORK_ERROR));
    }

    #[test]
    fn unfetched_product_value_shape() {
        let value = unfetched_product_to_value(&UnfetchedProduct {
            product_id: "retired_pack".into(),
            product_type: "inapp".into(),
            status_code: response_code::ITEM_UNAVAILABLE,
        });
        assert_eq!(
            value,
            json!({
                "product_id": "retired_pack",
                "product_type": "inapp",
                "status_code": response_code::ITEM_UNAVAILABLE,
            })
        );
        assert_eq!(keys_of(&value), vec!["product_id", "product_type", "status_code"]);
    }

    #[test]
    fn list_converters_preserve_element_order() {
        let mut second = sample_purchase();
        second.purchase_token = "second-token".into();
        let value = purchase_list_to_values(&[sample_purchase(), second]);
        let tokens: Vec<&str> = value
            .as_array()
            .expect("array")
            .iter()
            .map(|p| p["purchase_token"].as_str().expect("token"))
            .collect();
        assert!(tokens[0].starts_with("opaque-token-"));
        assert_eq!(tokens[1], "second-token");

        let details = product_details_list_to_values(&[sample_subscription()]);
        assert_eq!(details[0]["product_id"], json!("premium"));

        let unfetched = unfetched_product_list_to_values(&[]);
        assert_eq!(unfetched, json!([]));
    }
}
