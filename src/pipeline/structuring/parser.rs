use serde_json::{Map, Value};

use super::prompt::{ALLOWED_RESPONSE_KEYS, REQUIRED_RESPONSE_KEYS};
use super::ExtractionError;
use crate::models::{Field, OrderDetails};

/// Parse the model's reply into an order draft.
///
/// The reply must decode to exactly the order shape; anything else is an
/// error rather than a partially trusted draft. A surrounding ```json fence
/// is tolerated.
pub fn parse_extraction_response(response: &str) -> Result<OrderDetails, ExtractionError> {
    let json_str = strip_code_fence(response);
    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractionError::JsonParsing(e.to_string()))?;

    let obj = value
        .as_object()
        .ok_or_else(|| ExtractionError::MalformedResponse("Expected a JSON object".into()))?;
    check_keys(obj)?;

    Ok(OrderDetails {
        customer_name: required_text(obj, "customerName")?,
        phone_number: required_text(obj, "phoneNumber")?,
        delivery_address: required_text(obj, "deliveryAddress")?,
        total_price: price(obj)?,
        items: optional_text(obj, "items")?,
        note: optional_text(obj, "note")?,
    })
}

/// Return the content of the first fenced block, or the trimmed input.
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[open + 3..];
    // Skip the info string ("json") up to the end of the fence line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn check_keys(obj: &Map<String, Value>) -> Result<(), ExtractionError> {
    if let Some(extra) = obj
        .keys()
        .find(|k| !ALLOWED_RESPONSE_KEYS.contains(&k.as_str()))
    {
        return Err(ExtractionError::MalformedResponse(format!(
            "Unexpected field '{extra}'"
        )));
    }
    if let Some(missing) = REQUIRED_RESPONSE_KEYS
        .iter()
        .find(|k| !obj.contains_key(**k))
    {
        return Err(ExtractionError::MalformedResponse(format!(
            "Missing field '{missing}'"
        )));
    }
    Ok(())
}

/// String-or-null. Blank strings carry no information and become Unknown.
fn required_text(obj: &Map<String, Value>, key: &str) -> Result<Field<String>, ExtractionError> {
    Ok(optional_text(obj, key)?.into())
}

fn optional_text(obj: &Map<String, Value>, key: &str) -> Result<Option<String>, ExtractionError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_string()))
        }
        Some(other) => Err(ExtractionError::MalformedResponse(format!(
            "Field '{key}' must be a string or null, got {other}"
        ))),
    }
}

fn price(obj: &Map<String, Value>) -> Result<Field<f64>, ExtractionError> {
    match obj.get("totalPrice") {
        None | Some(Value::Null) => Ok(Field::Unknown),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(v) if v.is_finite() && v >= 0.0 => Ok(Field::Known(v)),
            _ => Err(ExtractionError::MalformedResponse(format!(
                "totalPrice must be a non-negative number, got {n}"
            ))),
        },
        Some(other) => Err(ExtractionError::MalformedResponse(format!(
            "totalPrice must be a number or null, got {other}"
        ))),
    }
}
