//! JSON reshaping helpers shared by the handlers
//!
//! Clients send camelCase, the database stores snake_case, and older clients
//! send either. These helpers keep the translation rules in one place.

use serde_json::{Map, Value};

/// Loose truthiness: null, false, 0, "" and empty containers are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// First truthy value among several alias keys
pub fn pick<'a>(payload: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| payload.get(*key))
        .find(|value| truthy(value))
}

/// Like [`pick`] but rendered as text, with a fallback
pub fn pick_str(payload: &Value, keys: &[&str], default: &str) -> String {
    pick(payload, keys)
        .map(text)
        .unwrap_or_else(|| default.to_string())
}

/// String form of a scalar without JSON quoting
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accepts booleans, numbers and the strings "true", "1", "yes", "on".
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on"),
        _ => false,
    }
}

pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
        }
        _ => None,
    }
}

/// Copy of an object without its null fields
pub fn strip_nulls(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        _ => Map::new(),
    }
}

/// First row of a representation, if any
pub fn first_row(rows: Vec<Value>) -> Option<Value> {
    rows.into_iter().next()
}

/// camelCase client key -> snake_case column
pub type FieldTable = &'static [(&'static str, &'static str)];

pub const ORDER_FIELDS: FieldTable = &[
    ("guestName", "guest_name"),
    ("unitNumber", "unit_number"),
    ("arrivalDate", "arrival_date"),
    ("departureDate", "departure_date"),
    ("guestsCount", "guests_count"),
    ("specialRequests", "special_requests"),
    ("internalNotes", "internal_notes"),
    ("paidAmount", "paid_amount"),
    ("totalAmount", "total_amount"),
    ("paymentMethod", "payment_method"),
];

pub const MAINTENANCE_FIELDS: FieldTable = &[
    ("unitId", "unit_id"),
    ("createdDate", "created_date"),
    ("assignedTo", "assigned_to"),
    ("imageUri", "image_uri"),
    ("closingImageUri", "closing_image_uri"),
];

pub const INVENTORY_ORDER_FIELDS: FieldTable = &[
    ("deliveryDate", "delivery_date"),
    ("orderType", "order_type"),
    ("orderedBy", "ordered_by"),
    ("unitNumber", "unit_number"),
];

pub const INVENTORY_ITEM_FIELDS: FieldTable = &[
    ("itemId", "item_id"),
    ("itemName", "item_name"),
];

/// Rename camelCase keys to their snake_case columns.
///
/// When both spellings are present the snake_case value wins. Keys not in
/// the table pass through untouched.
pub fn to_snake(payload: &Value, fields: FieldTable) -> Map<String, Value> {
    let mut out = Map::new();
    let Value::Object(input) = payload else {
        return out;
    };
    for (key, value) in input {
        match fields.iter().find(|(camel, _)| camel == key) {
            Some((_, snake)) => {
                if !input.contains_key(*snake) {
                    out.insert(snake.to_string(), value.clone());
                }
            }
            None => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(truthy(&json!("0")));
        assert!(truthy(&json!(0.5)));
    }

    #[test]
    fn test_pick_prefers_first_truthy_alias() {
        let payload = json!({"unitNumber": "", "unit_number": "A3"});
        assert_eq!(pick_str(&payload, &["unitNumber", "unit_number"], ""), "A3");
        assert_eq!(pick_str(&payload, &["guestName", "guest_name"], "-"), "-");
        assert_eq!(pick_str(&json!({"n": 7}), &["n"], ""), "7");
    }

    #[test]
    fn test_coerce_bool_accepts_form_values() {
        for yes in [json!(true), json!("true"), json!("1"), json!("YES"), json!("on"), json!(1)] {
            assert!(coerce_bool(&yes), "{yes} should be true");
        }
        for no in [json!(false), json!("false"), json!("0"), json!(null), json!(0), json!({})] {
            assert!(!coerce_bool(&no), "{no} should be false");
        }
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce_f64(&json!("12.5")), Some(12.5));
        assert_eq!(coerce_f64(&json!("abc")), None);
        assert_eq!(coerce_i64(&json!("3")), Some(3));
        assert_eq!(coerce_i64(&json!(4.0)), Some(4));
        assert_eq!(coerce_i64(&json!("2.0")), Some(2));
    }

    #[test]
    fn test_strip_nulls() {
        let stripped = strip_nulls(&json!({"a": null, "b": 0, "c": "x"}));
        assert_eq!(Value::Object(stripped), json!({"b": 0, "c": "x"}));
    }

    #[test]
    fn test_to_snake_renames_known_keys_only() {
        let mapped = to_snake(
            &json!({"unitId": "U1", "title": "Leak", "createdDate": "2025-01-01", "created_date": "2025-02-02"}),
            MAINTENANCE_FIELDS,
        );
        assert_eq!(
            Value::Object(mapped),
            json!({"unit_id": "U1", "title": "Leak", "created_date": "2025-02-02"})
        );
    }
}
