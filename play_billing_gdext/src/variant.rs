// JSON-to-Variant conversion at the GDExtension boundary.
//
// The core crate hands over `serde_json::Value`s whose object key order is
// fixed by construction; this module turns them into engine types without
// reordering, so the dictionary key order scripts iterate matches the
// vendor record order. Dictionaries and arrays are built element by
// element — there is no serialization detour through JSON text.

use godot::prelude::*;
use serde_json::{Map, Number, Value};

/// Convert a JSON value into the closest engine Variant: null to nil,
/// numbers to int (or float when not integral), strings to `GString`,
/// arrays and objects recursively. Integers beyond i64 range arrive as
/// their decimal digits in a string.
pub fn json_value_to_variant(value: &Value) -> Variant {
    match value {
        Value::Null => Variant::nil(),
        Value::Bool(b) => b.to_variant(),
        Value::Number(n) => match classify_number(n) {
            Some(JsonNumber::Int(i)) => i.to_variant(),
            Some(JsonNumber::Big(digits)) => GString::from(digits.as_str()).to_variant(),
            Some(JsonNumber::Float(f)) => f.to_variant(),
            None => Variant::nil(),
        },
        Value::String(s) => GString::from(s.as_str()).to_variant(),
        Value::Array(values) => {
            let mut array = Array::<Variant>::new();
            for element in values {
                let element = json_value_to_variant(element);
                array.push(&element);
            }
            array.to_variant()
        }
        Value::Object(map) => json_object_to_dictionary(map).to_variant(),
    }
}

/// Convert a JSON object to a dictionary, preserving key order.
pub fn json_object_to_dictionary(map: &Map<String, Value>) -> VarDictionary {
    let mut dict = VarDictionary::new();
    for (key, value) in map {
        dict.set(GString::from(key.as_str()), json_value_to_variant(value));
    }
    dict
}

/// A `PackedStringArray` from plain strings.
pub fn packed_strings(strings: &[String]) -> PackedStringArray {
    strings.iter().map(|s| GString::from(s.as_str())).collect()
}

/// A JSON number reduced to what the engine can hold.
#[derive(Debug, PartialEq)]
enum JsonNumber {
    Int(i64),
    /// Beyond i64 range; carried as decimal digits so nothing is lost.
    Big(String),
    Float(f64),
}

fn classify_number(n: &Number) -> Option<JsonNumber> {
    if let Some(i) = n.as_i64() {
        Some(JsonNumber::Int(i))
    } else if let Some(u) = n.as_u64() {
        Some(JsonNumber::Big(u.to_string()))
    } else {
        n.as_f64().map(JsonNumber::Float)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Engine types cannot be constructed outside a running engine, so
    // these cover the numeric classification the Variant mapping rests on.

    fn number(value: Value) -> Number {
        match value {
            Value::Number(n) => n,
            other => panic!("expected a number, got {other}"),
        }
    }

    #[test]
    fn integers_in_range_stay_integers() {
        assert_eq!(
            classify_number(&number(json!(1_756_080_000_123_i64))),
            Some(JsonNumber::Int(1_756_080_000_123))
        );
        assert_eq!(classify_number(&number(json!(-3))), Some(JsonNumber::Int(-3)));
        assert_eq!(
            classify_number(&number(json!(i64::MAX))),
            Some(JsonNumber::Int(i64::MAX))
        );
    }

    #[test]
    fn u64_beyond_i64_range_becomes_decimal_digits() {
        assert_eq!(
            classify_number(&number(json!(u64::MAX))),
            Some(JsonNumber::Big("18446744073709551615".into()))
        );
        assert_eq!(
            classify_number(&number(json!(i64::MAX as u64 + 1))),
            Some(JsonNumber::Big("9223372036854775808".into()))
        );
    }

    #[test]
    fn fractional_numbers_classify_as_floats() {
        assert_eq!(
            classify_number(&number(json!(4.99))),
            Some(JsonNumber::Float(4.99))
        );
    }
}
