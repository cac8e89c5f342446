//! Tagged decoder for DeepBook order storage.
//!
//! Sui JSON-RPC renders Move structs as `{ "type": .., "fields": { .. } }`
//! and dynamic fields as an extra `value` layer. Instead of peeling an
//! unknown number of layers, the decoder recognises a fixed set of named
//! shapes and reports anything else as [`DecodeError::UnrecognizedShape`].
//!
//! Recognised object shapes (relative to `content.fields`):
//! - `Slice`       = `vals: [..]`
//! - `FieldSlice`  = `value.fields.vals: [..]`
//! - `FieldOrder`  = `value.fields` carrying `order_id`
//! - `BareOrder`   = `fields` carrying `order_id`
//!
//! Recognised element shapes inside a slice:
//! - `Wrapped` = `{ "fields": { "order_id": .. } }`
//! - `Bare`    = `{ "order_id": .. }`

use serde_json::{Map, Value};
use thiserror::Error;

use super::order::{price_from_order_id, Order, OrderId, Side};

type Fields = Map<String, Value>;

/// Why an object or element did not decode into an order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("content is not a Move object (dataType={0})")]
    NotMoveObject(String),
    #[error("unrecognized object shape")]
    UnrecognizedShape,
    #[error("element carries no order id")]
    NotAnOrder,
    #[error("field {field} has unparseable value {value}")]
    BadField { field: &'static str, value: String },
}

/// Named object layouts the decoder accepts.
#[derive(Debug, PartialEq)]
pub enum ObjectShape<'a> {
    Slice(&'a [Value]),
    FieldSlice(&'a [Value]),
    FieldOrder(&'a Fields),
    BareOrder(&'a Fields),
}

impl ObjectShape<'_> {
    /// Shape name for log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Slice(_) => "slice",
            Self::FieldSlice(_) => "field_slice",
            Self::FieldOrder(_) => "field_order",
            Self::BareOrder(_) => "bare_order",
        }
    }
}

/// Named element layouts inside a slice.
#[derive(Debug, PartialEq)]
pub enum ElementShape<'a> {
    Wrapped(&'a Fields),
    Bare(&'a Fields),
}

impl<'a> ElementShape<'a> {
    fn fields(&self) -> &'a Fields {
        match self {
            Self::Wrapped(f) | Self::Bare(f) => *f,
        }
    }
}

/// Result of decoding one object: the orders found plus per-element drops.
#[derive(Debug, Default)]
pub struct DecodedObject {
    pub orders: Vec<Order>,
    pub dropped: usize,
}

/// Classify a Sui `content` value into one of the recognised shapes.
pub fn classify(content: &Value) -> Result<ObjectShape<'_>, DecodeError> {
    if let Some(kind) = content.get("dataType").and_then(Value::as_str) {
        if kind != "moveObject" {
            return Err(DecodeError::NotMoveObject(kind.to_string()));
        }
    }

    let fields = content
        .get("fields")
        .and_then(Value::as_object)
        .ok_or(DecodeError::UnrecognizedShape)?;

    if let Some(vals) = fields.get("vals").and_then(Value::as_array) {
        return Ok(ObjectShape::Slice(vals));
    }

    if let Some(inner) = lookup(fields.get("value"), &["fields"]).and_then(Value::as_object) {
        if let Some(vals) = inner.get("vals").and_then(Value::as_array) {
            return Ok(ObjectShape::FieldSlice(vals));
        }
        if has_order_id(inner) {
            return Ok(ObjectShape::FieldOrder(inner));
        }
    }

    if has_order_id(fields) {
        return Ok(ObjectShape::BareOrder(fields));
    }

    Err(DecodeError::UnrecognizedShape)
}

/// Classify one slice element.
pub fn classify_element(element: &Value) -> Result<ElementShape<'_>, DecodeError> {
    let map = element.as_object().ok_or(DecodeError::NotAnOrder)?;

    if let Some(inner) = map.get("fields").and_then(Value::as_object) {
        if has_order_id(inner) {
            return Ok(ElementShape::Wrapped(inner));
        }
        return Err(DecodeError::NotAnOrder);
    }

    if has_order_id(map) {
        return Ok(ElementShape::Bare(map));
    }

    Err(DecodeError::NotAnOrder)
}

/// Decode every order an object holds.
///
/// Slices may legitimately contain non-order elements (inner BigVector
/// nodes); those count as `dropped` rather than failing the object.
/// `storage_rebate` is attributed only when the object holds a single order.
pub fn decode_object(
    content: &Value,
    object_id: &str,
    storage_rebate: Option<u64>,
    side: Side,
) -> Result<DecodedObject, DecodeError> {
    let shape = classify(content)?;
    let mut decoded = DecodedObject::default();

    match shape {
        ObjectShape::Slice(vals) | ObjectShape::FieldSlice(vals) => {
            for element in vals {
                match classify_element(element)
                    .and_then(|e| decode_order(e.fields(), side, object_id, None))
                {
                    Ok(order) => decoded.orders.push(order),
                    Err(_) => decoded.dropped += 1,
                }
            }
        }
        ObjectShape::FieldOrder(fields) | ObjectShape::BareOrder(fields) => {
            decoded
                .orders
                .push(decode_order(fields, side, object_id, storage_rebate)?);
        }
    }

    Ok(decoded)
}

/// Decode one order from its struct fields.
pub fn decode_order(
    fields: &Fields,
    side: Side,
    object_id: &str,
    incentive_mist: Option<u64>,
) -> Result<Order, DecodeError> {
    let order_id = parse_u128(fields.get("order_id"), "order_id")?.ok_or(DecodeError::NotAnOrder)?;

    let owner = ["owner", "balance_manager_id"]
        .iter()
        .find_map(|k| fields.get(*k).and_then(object_id_of))
        .unwrap_or_default();

    let price = match parse_u64(fields.get("price"), "price")? {
        Some(p) => p,
        None => price_from_order_id(order_id),
    };

    Ok(Order {
        order_id,
        owner,
        side,
        price,
        quantity: parse_u64(fields.get("quantity"), "quantity")?.unwrap_or(0),
        expire_timestamp: parse_u64(fields.get("expire_timestamp"), "expire_timestamp")?.unwrap_or(0),
        source_object_id: object_id.to_string(),
        incentive_mist,
    })
}

/// Walk `path` through nested `serde_json` objects.
pub fn lookup<'a>(root: Option<&'a Value>, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root?, |v, key| v.get(*key))
}

/// Read an id rendered either as a bare string or as `{ "id": "0x.." }`.
pub fn object_id_of(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(m) => m.get("id").and_then(object_id_of),
        _ => None,
    }
}

fn has_order_id(fields: &Fields) -> bool {
    match fields.get("order_id") {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

/// Sui renders u64/u128 as decimal strings; small values occasionally as numbers.
fn parse_u128(v: Option<&Value>, field: &'static str) -> Result<Option<OrderId>, DecodeError> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s.parse::<u128>().map(Some).map_err(|_| DecodeError::BadField {
            field,
            value: s.clone(),
        }),
        Some(Value::Number(n)) => n.as_u64().map(|n| Some(u128::from(n))).ok_or_else(|| {
            DecodeError::BadField {
                field,
                value: n.to_string(),
            }
        }),
        Some(other) => Err(DecodeError::BadField {
            field,
            value: other.to_string(),
        }),
    }
}

fn parse_u64(v: Option<&Value>, field: &'static str) -> Result<Option<u64>, DecodeError> {
    parse_u128(v, field)?
        .map(|n| {
            u64::try_from(n).map_err(|_| DecodeError::BadField {
                field,
                value: n.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn wrapped_order(id: &str, expire: &str) -> Value {
        json!({
            "type": "0xdee9::order_info::Order",
            "fields": {
                "order_id": id,
                "balance_manager_id": "0xbm",
                "quantity": "1000",
                "expire_timestamp": expire
            }
        })
    }

    #[test]
    fn test_field_slice_decodes_wrapped_elements() {
        let content = json!({
            "dataType": "moveObject",
            "fields": {
                "name": "7",
                "value": {
                    "type": "Slice<Order>",
                    "fields": {
                        "keys": ["1", "2"],
                        "vals": [wrapped_order("1", "18446744073709551615"), wrapped_order("2", "5")]
                    }
                }
            }
        });

        let decoded = decode_object(&content, "0xslice", Some(99), Side::Ask).unwrap();
        assert_eq!(decoded.orders.len(), 2);
        assert_eq!(decoded.orders[1].expire_timestamp, 5);
        assert_eq!(decoded.orders[0].owner, "0xbm");
        assert_eq!(decoded.orders[0].incentive_mist, None);
        assert_eq!(decoded.dropped, 0);
    }

    #[test]
    fn test_bare_slice_with_bare_elements() {
        let content = json!({
            "fields": { "vals": [{ "order_id": "10", "owner": "0xo", "price": "3" }] }
        });
        let decoded = decode_object(&content, "0xs", None, Side::Bid).unwrap();
        assert_eq!(decoded.orders[0].price, 3);
        assert_eq!(decoded.orders[0].owner, "0xo");
    }

    #[test]
    fn test_single_order_object_keeps_rebate() {
        let content = json!({
            "dataType": "moveObject",
            "fields": { "value": { "fields": { "order_id": "77", "expire_timestamp": "0" } } }
        });
        let decoded = decode_object(&content, "0xo", Some(2_000_000), Side::Bid).unwrap();
        assert_eq!(decoded.orders[0].incentive_mist, Some(2_000_000));
    }

    #[test]
    fn test_inner_node_elements_are_dropped() {
        let content = json!({ "fields": { "vals": ["12", "13", wrapped_order("", "1")] } });
        let decoded = decode_object(&content, "0xs", None, Side::Bid).unwrap();
        assert!(decoded.orders.is_empty());
        assert_eq!(decoded.dropped, 3);
    }

    #[test]
    fn test_unrecognized_shape_fails_closed() {
        let content = json!({ "fields": { "value": { "fields": { "size": "1" } } } });
        assert_eq!(
            decode_object(&content, "0x1", None, Side::Bid).unwrap_err(),
            DecodeError::UnrecognizedShape
        );
    }

    #[test]
    fn test_package_content_rejected() {
        let content = json!({ "dataType": "package", "disassembled": {} });
        assert!(matches!(classify(&content), Err(DecodeError::NotMoveObject(_))));
    }

    #[test]
    fn test_large_order_id_is_lossless() {
        let id = (1u128 << 127) | (123u128 << 64) | 9;
        let content = json!({ "fields": { "order_id": id.to_string() } });
        let decoded = decode_object(&content, "0x1", None, Side::Ask).unwrap();
        assert_eq!(decoded.orders[0].order_id, id);
        assert_eq!(decoded.orders[0].price, 123);
    }

    #[test]
    fn test_bad_quantity_is_an_error() {
        let fields = json!({ "order_id": "1", "quantity": "lots" });
        let err = decode_order(fields.as_object().unwrap(), Side::Bid, "0x1", None).unwrap_err();
        assert!(matches!(err, DecodeError::BadField { field: "quantity", .. }));
    }

    #[test]
    fn test_lookup_nested_path() {
        let v = json!({ "a": { "b": { "c": 1 } } });
        assert_eq!(lookup(Some(&v), &["a", "b", "c"]), Some(&json!(1)));
        assert_eq!(lookup(Some(&v), &["a", "x"]), None);
    }
}
