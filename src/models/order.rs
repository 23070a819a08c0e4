use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::enums::OrderStatus;

/// A value that is either established or explicitly not established.
///
/// `Unknown` is never conflated with an empty string or a zero price: it
/// serializes as JSON `null` and a user-entered empty string stays
/// `Known(String::new())`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Field<T> {
    #[default]
    Unknown,
    Known(T),
}

impl<T> Field<T> {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Field::Unknown)
    }

    pub fn as_known(&self) -> Option<&T> {
        match self {
            Field::Known(v) => Some(v),
            Field::Unknown => None,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Known(v),
            None => Field::Unknown,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Known(v) => serializer.serialize_some(v),
            Field::Unknown => serializer.serialize_none(),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<T>::deserialize(deserializer)?.into())
    }
}

/// Draft order shape produced by extraction or manual entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    #[serde(default)]
    pub customer_name: Field<String>,
    #[serde(default)]
    pub phone_number: Field<String>,
    #[serde(default)]
    pub delivery_address: Field<String>,
    /// Total in BDT.
    #[serde(default)]
    pub total_price: Field<f64>,
    #[serde(default)]
    pub items: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

impl OrderDetails {
    /// Manual-entry template: nothing established yet.
    pub fn blank() -> Self {
        Self::default()
    }
}

/// A confirmed order as kept in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    /// Creation instant, milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub status: OrderStatus,
    #[serde(flatten)]
    pub details: OrderDetails,
}

/// Render an amount as Bangladeshi taka, e.g. `৳1,200` or `৳99.50`.
pub fn format_taka(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let rounded = (amount.abs() * 100.0).round() / 100.0;
    let whole = rounded.trunc() as u64;
    let cents = ((rounded - rounded.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if cents == 0 {
        format!("{sign}৳{grouped}")
    } else {
        format!("{sign}৳{grouped}.{cents:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> OrderRecord {
        OrderRecord {
            id: "3f1c2a9e-0000-4000-8000-000000000001".into(),
            timestamp: 1_717_000_000_123,
            status: OrderStatus::Confirmed,
            details: OrderDetails {
                customer_name: Field::Known("Rahim".into()),
                phone_number: Field::Known("01712345678".into()),
                delivery_address: Field::Known("Dhanmondi".into()),
                total_price: Field::Known(1200.0),
                items: Some("2 shirts".into()),
                note: None,
            },
        }
    }

    #[test]
    fn unknown_serializes_as_null() {
        let details = OrderDetails::blank();
        let json = serde_json::to_value(&details).unwrap();
        assert!(json["customerName"].is_null());
        assert!(json["totalPrice"].is_null());
    }

    #[test]
    fn empty_string_stays_known() {
        let json = r#"{"customerName": "", "phoneNumber": null}"#;
        let details: OrderDetails = serde_json::from_str(json).unwrap();
        assert_eq!(details.customer_name, Field::Known(String::new()));
        assert!(details.phone_number.is_unknown());
    }

    #[test]
    fn zero_price_is_not_unknown() {
        let details: OrderDetails = serde_json::from_str(r#"{"totalPrice": 0}"#).unwrap();
        assert_eq!(details.total_price, Field::Known(0.0));
    }

    #[test]
    fn missing_keys_default_to_unknown() {
        let details: OrderDetails = serde_json::from_str("{}").unwrap();
        assert_eq!(details, OrderDetails::blank());
    }

    #[test]
    fn record_flattens_details() {
        let json = serde_json::to_value(sample_record()).unwrap();
        assert_eq!(json["customerName"], "Rahim");
        assert_eq!(json["status"], "Confirmed");
        assert_eq!(json["timestamp"], 1_717_000_000_123i64);
        assert!(json.get("details").is_none());
    }

    #[test]
    fn record_reads_original_snapshot_shape() {
        let json = r#"{
            "customerName": "Karim",
            "phoneNumber": "01812345678",
            "deliveryAddress": "House 24/1, Road 5",
            "totalPrice": null,
            "items": "",
            "note": "",
            "id": "k2j3h4g5f",
            "timestamp": 1717000000000,
            "status": "Confirmed"
        }"#;
        let record: OrderRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "k2j3h4g5f");
        assert!(record.details.total_price.is_unknown());
        assert_eq!(record.details.items.as_deref(), Some(""));
    }

    #[test]
    fn record_json_is_stable() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: OrderRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn format_taka_groups_thousands() {
        assert_eq!(format_taka(1200.0), "৳1,200");
        assert_eq!(format_taka(1_234_567.0), "৳1,234,567");
        assert_eq!(format_taka(65.0), "৳65");
    }

    #[test]
    fn format_taka_keeps_paisa() {
        assert_eq!(format_taka(99.5), "৳99.50");
    }
}
