//! Review workflow for order drafts.
//!
//! A draft arrives from extraction or from the blank manual template, is
//! edited field by field, and is either confirmed (after validation) or
//! cancelled. Both entry points share one validation path.
//!
//! Field states stay distinguishable until the user acts: `Missing` is the
//! Unknown marker, `Empty` is a value the user deliberately cleared.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::models::{Field, OrderDetails};

/// Prominent warning shown while the price was never established.
pub const PRICE_MISSING_WARNING: &str =
    "Price was not found in the chat. Enter the total before saving so the customer is not under- or overcharged.";

#[derive(Error, Debug, PartialEq)]
pub enum ReviewInputError {
    #[error("'{0}' is not a valid price")]
    InvalidPrice(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),
}

/// Editable fields of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OrderField {
    CustomerName,
    PhoneNumber,
    DeliveryAddress,
    TotalPrice,
    Items,
    Note,
}

impl OrderField {
    pub const ALL: [OrderField; 6] = [
        OrderField::CustomerName,
        OrderField::PhoneNumber,
        OrderField::DeliveryAddress,
        OrderField::TotalPrice,
        OrderField::Items,
        OrderField::Note,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::CustomerName => "Customer name",
            Self::PhoneNumber => "Phone number",
            Self::DeliveryAddress => "Delivery address",
            Self::TotalPrice => "Total price",
            Self::Items => "Items",
            Self::Note => "Note",
        }
    }

    /// Short name used by the shell's `set` command.
    pub fn key(&self) -> &'static str {
        match self {
            Self::CustomerName => "name",
            Self::PhoneNumber => "phone",
            Self::DeliveryAddress => "address",
            Self::TotalPrice => "price",
            Self::Items => "items",
            Self::Note => "note",
        }
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Items | Self::Note)
    }
}

impl FromStr for OrderField {
    type Err = ReviewInputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" | "customer" | "customername" => Ok(Self::CustomerName),
            "phone" | "phonenumber" => Ok(Self::PhoneNumber),
            "address" | "deliveryaddress" => Ok(Self::DeliveryAddress),
            "price" | "total" | "totalprice" => Ok(Self::TotalPrice),
            "items" => Ok(Self::Items),
            "note" | "notes" => Ok(Self::Note),
            _ => Err(ReviewInputError::UnknownField(s.to_string())),
        }
    }
}

impl fmt::Display for OrderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldStatus {
    /// Never established (Unknown marker).
    Missing,
    /// Set by the user to blank text.
    Empty,
    Filled,
    /// Price present but not strictly positive.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: OrderField,
    pub status: FieldStatus,
    pub message: String,
}

/// Outcome of checking a draft. Not an error: an incomplete draft is a
/// normal state the user resolves by editing.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_issue(&self, field: OrderField) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }

    pub fn fields(&self) -> Vec<OrderField> {
        self.issues.iter().map(|i| i.field).collect()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.issues.iter().map(|i| i.message.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

/// Where the draft under review came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReviewOrigin {
    Extraction,
    Manual,
}

/// The one editable copy of a draft.
#[derive(Debug, Clone)]
pub struct ReviewSession {
    draft: OrderDetails,
    origin: ReviewOrigin,
    price_arrived_missing: bool,
}

impl ReviewSession {
    pub fn from_extraction(draft: OrderDetails) -> Self {
        Self::open(draft, ReviewOrigin::Extraction)
    }

    /// Blank template: every field starts as Unknown.
    pub fn manual() -> Self {
        Self::open(OrderDetails::blank(), ReviewOrigin::Manual)
    }

    fn open(draft: OrderDetails, origin: ReviewOrigin) -> Self {
        let price_arrived_missing = !matches!(draft.total_price, Field::Known(p) if p > 0.0);
        tracing::debug!(?origin, price_arrived_missing, "Review opened");
        Self {
            draft,
            origin,
            price_arrived_missing,
        }
    }

    pub fn draft(&self) -> &OrderDetails {
        &self.draft
    }

    pub fn origin(&self) -> ReviewOrigin {
        self.origin
    }

    pub fn set_customer_name(&mut self, value: &str) {
        self.draft.customer_name = Field::Known(value.to_string());
    }

    pub fn set_phone_number(&mut self, value: &str) {
        self.draft.phone_number = Field::Known(value.to_string());
    }

    pub fn set_delivery_address(&mut self, value: &str) {
        self.draft.delivery_address = Field::Known(value.to_string());
    }

    pub fn set_total_price(&mut self, value: f64) {
        self.draft.total_price = Field::Known(value);
    }

    /// Set the price from typed text. Clearing the input returns the field
    /// to Unknown; text that is not a number is rejected and the current
    /// value is kept.
    pub fn set_total_price_input(&mut self, input: &str) -> Result<(), ReviewInputError> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('৳')
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let cleaned = cleaned.trim();

        if cleaned.is_empty() {
            self.draft.total_price = Field::Unknown;
            return Ok(());
        }

        match cleaned.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                self.draft.total_price = Field::Known(v);
                Ok(())
            }
            _ => Err(ReviewInputError::InvalidPrice(input.trim().to_string())),
        }
    }

    pub fn set_items(&mut self, value: &str) {
        self.draft.items = Some(value.to_string());
    }

    pub fn set_note(&mut self, value: &str) {
        self.draft.note = Some(value.to_string());
    }

    /// Route a typed value to the named field.
    pub fn set_field(&mut self, field: OrderField, value: &str) -> Result<(), ReviewInputError> {
        match field {
            OrderField::CustomerName => self.set_customer_name(value),
            OrderField::PhoneNumber => self.set_phone_number(value),
            OrderField::DeliveryAddress => self.set_delivery_address(value),
            OrderField::TotalPrice => return self.set_total_price_input(value),
            OrderField::Items => self.set_items(value),
            OrderField::Note => self.set_note(value),
        }
        Ok(())
    }

    pub fn field_status(&self, field: OrderField) -> FieldStatus {
        match field {
            OrderField::CustomerName => text_status(&self.draft.customer_name),
            OrderField::PhoneNumber => text_status(&self.draft.phone_number),
            OrderField::DeliveryAddress => text_status(&self.draft.delivery_address),
            OrderField::TotalPrice => match self.draft.total_price {
                Field::Unknown => FieldStatus::Missing,
                Field::Known(p) if p.is_finite() && p > 0.0 => FieldStatus::Filled,
                Field::Known(_) => FieldStatus::Invalid,
            },
            OrderField::Items => optional_status(&self.draft.items),
            OrderField::Note => optional_status(&self.draft.note),
        }
    }

    /// Check the required fields. Optional fields never block.
    pub fn validate(&self) -> ValidationReport {
        let issues = OrderField::ALL
            .into_iter()
            .filter(OrderField::is_required)
            .filter_map(|field| {
                let status = self.field_status(field);
                let message = match status {
                    FieldStatus::Filled => return None,
                    FieldStatus::Missing => format!("{} was not found; enter it", field.label()),
                    FieldStatus::Empty => format!("{} cannot be empty", field.label()),
                    FieldStatus::Invalid => format!("{} must be greater than zero", field.label()),
                };
                Some(FieldIssue {
                    field,
                    status,
                    message,
                })
            })
            .collect();
        ValidationReport { issues }
    }

    /// The confirmed draft, with required text trimmed and blank optional
    /// text dropped. On failure the session is unchanged.
    pub fn confirm(&self) -> Result<OrderDetails, ValidationReport> {
        let report = self.validate();
        if !report.is_valid() {
            tracing::debug!(issue_count = report.issues.len(), "Confirmation blocked");
            return Err(report);
        }

        Ok(OrderDetails {
            customer_name: trimmed(&self.draft.customer_name),
            phone_number: trimmed(&self.draft.phone_number),
            delivery_address: trimmed(&self.draft.delivery_address),
            total_price: self.draft.total_price.clone(),
            items: non_blank(&self.draft.items),
            note: non_blank(&self.draft.note),
        })
    }

    /// Discard the draft. Nothing is written anywhere.
    pub fn cancel(self) {
        tracing::debug!(origin = ?self.origin, "Review cancelled");
    }

    /// The missing-price warning, while it applies.
    pub fn price_warning(&self) -> Option<&'static str> {
        let resolved = self.field_status(OrderField::TotalPrice) == FieldStatus::Filled;
        (self.price_arrived_missing && !resolved).then_some(PRICE_MISSING_WARNING)
    }
}

fn text_status(field: &Field<String>) -> FieldStatus {
    match field {
        Field::Unknown => FieldStatus::Missing,
        Field::Known(s) if s.trim().is_empty() => FieldStatus::Empty,
        Field::Known(_) => FieldStatus::Filled,
    }
}

fn optional_status(value: &Option<String>) -> FieldStatus {
    match value {
        None => FieldStatus::Missing,
        Some(s) if s.trim().is_empty() => FieldStatus::Empty,
        Some(_) => FieldStatus::Filled,
    }
}

fn trimmed(field: &Field<String>) -> Field<String> {
    match field {
        Field::Known(s) => Field::Known(s.trim().to_string()),
        Field::Unknown => Field::Unknown,
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rahim_draft() -> OrderDetails {
        OrderDetails {
            customer_name: Field::Known("Rahim".into()),
            phone_number: Field::Known("01712345678".into()),
            delivery_address: Field::Known("Dhanmondi".into()),
            total_price: Field::Known(1200.0),
            items: Some("2 shirts".into()),
            note: None,
        }
    }

    fn karim_draft() -> OrderDetails {
        OrderDetails {
            customer_name: Field::Known("Karim".into()),
            phone_number: Field::Unknown,
            delivery_address: Field::Known("House 24/1, Road 5".into()),
            total_price: Field::Unknown,
            items: None,
            note: None,
        }
    }

    #[test]
    fn complete_draft_confirms() {
        let session = ReviewSession::from_extraction(rahim_draft());
        assert!(session.validate().is_valid());
        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed, rahim_draft());
        assert!(session.price_warning().is_none());
    }

    #[test]
    fn missing_price_blocks_and_warns() {
        let mut session = ReviewSession::from_extraction(karim_draft());
        let report = session.confirm().unwrap_err();
        assert!(report.has_issue(OrderField::TotalPrice));
        assert!(report.has_issue(OrderField::PhoneNumber));
        assert!(!report.has_issue(OrderField::CustomerName));
        assert_eq!(session.price_warning(), Some(PRICE_MISSING_WARNING));

        session.set_phone_number("01812345678");
        session.set_total_price_input("850").unwrap();
        assert!(session.price_warning().is_none());
        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed.total_price, Field::Known(850.0));
    }

    #[test]
    fn zero_and_negative_prices_invalid() {
        let mut session = ReviewSession::from_extraction(rahim_draft());
        session.set_total_price(0.0);
        let report = session.validate();
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].status, FieldStatus::Invalid);

        session.set_total_price(-10.0);
        assert!(session.confirm().is_err());
    }

    #[test]
    fn price_warning_persists_until_valid() {
        let mut session = ReviewSession::from_extraction(karim_draft());
        session.set_total_price(0.0);
        assert!(session.price_warning().is_some());
        session.set_total_price(1.0);
        assert!(session.price_warning().is_none());
    }

    #[test]
    fn zero_price_from_extraction_warns() {
        let draft = OrderDetails {
            total_price: Field::Known(0.0),
            ..rahim_draft()
        };
        let mut session = ReviewSession::from_extraction(draft);
        assert_eq!(session.price_warning(), Some(PRICE_MISSING_WARNING));
        session.set_total_price(1200.0);
        assert!(session.price_warning().is_none());
    }

    #[test]
    fn known_price_never_warns_even_if_cleared() {
        let mut session = ReviewSession::from_extraction(rahim_draft());
        session.set_total_price_input("").unwrap();
        assert!(session.price_warning().is_none());
        assert_eq!(
            session.field_status(OrderField::TotalPrice),
            FieldStatus::Missing
        );
        assert!(session.confirm().is_err());
    }

    #[test]
    fn cleared_text_is_empty_not_missing() {
        let mut session = ReviewSession::from_extraction(karim_draft());
        assert_eq!(
            session.field_status(OrderField::PhoneNumber),
            FieldStatus::Missing
        );
        session.set_phone_number("");
        assert_eq!(
            session.field_status(OrderField::PhoneNumber),
            FieldStatus::Empty
        );
        assert_eq!(session.draft().phone_number, Field::Known(String::new()));

        let report = session.validate();
        let issue = report
            .issues
            .iter()
            .find(|i| i.field == OrderField::PhoneNumber)
            .unwrap();
        assert_eq!(issue.status, FieldStatus::Empty);
    }

    #[test]
    fn whitespace_only_is_empty() {
        let mut session = ReviewSession::from_extraction(rahim_draft());
        session.set_customer_name("   ");
        assert!(session.confirm().unwrap_err().has_issue(OrderField::CustomerName));
    }

    #[test]
    fn manual_template_all_missing() {
        let session = ReviewSession::manual();
        assert_eq!(session.origin(), ReviewOrigin::Manual);
        for field in OrderField::ALL {
            assert_eq!(session.field_status(field), FieldStatus::Missing);
        }
        let report = session.validate();
        assert_eq!(
            report.fields(),
            vec![
                OrderField::CustomerName,
                OrderField::PhoneNumber,
                OrderField::DeliveryAddress,
                OrderField::TotalPrice,
            ]
        );
        assert!(session.price_warning().is_some());
    }

    #[test]
    fn manual_entry_shares_validation_path() {
        let mut session = ReviewSession::manual();
        session.set_customer_name("Nila");
        session.set_phone_number("01911000000");
        session.set_delivery_address("Mirpur 10");
        session.set_total_price_input("৳1,500").unwrap();
        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed.total_price, Field::Known(1500.0));
        assert_eq!(confirmed.items, None);
    }

    #[test]
    fn optional_fields_never_block() {
        let mut session = ReviewSession::from_extraction(rahim_draft());
        session.set_items("");
        session.set_note("  ");
        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed.items, None);
        assert_eq!(confirmed.note, None);
    }

    #[test]
    fn confirm_trims_required_text() {
        let mut session = ReviewSession::from_extraction(rahim_draft());
        session.set_customer_name("  Rahim Uddin ");
        session.set_note(" call first ");
        let confirmed = session.confirm().unwrap();
        assert_eq!(confirmed.customer_name, Field::Known("Rahim Uddin".into()));
        assert_eq!(confirmed.note.as_deref(), Some("call first"));
    }

    #[test]
    fn bad_price_input_leaves_value_unchanged() {
        let mut session = ReviewSession::from_extraction(rahim_draft());
        let err = session.set_total_price_input("twelve hundred").unwrap_err();
        assert_eq!(err, ReviewInputError::InvalidPrice("twelve hundred".into()));
        assert_eq!(session.draft().total_price, Field::Known(1200.0));
        assert!(session.set_total_price_input("NaN").is_err());
    }

    #[test]
    fn set_field_routes_by_key() {
        let mut session = ReviewSession::manual();
        for (key, value) in [
            ("name", "Karim"),
            ("phone", "01712345678"),
            ("address", "Road 5"),
            ("price", "700"),
            ("items", "1 panjabi"),
        ] {
            let field: OrderField = key.parse().unwrap();
            session.set_field(field, value).unwrap();
        }
        assert!(session.validate().is_valid());
        assert_eq!(session.draft().items.as_deref(), Some("1 panjabi"));
    }

    #[test]
    fn unknown_field_name_rejected() {
        assert!(matches!(
            "discount".parse::<OrderField>(),
            Err(ReviewInputError::UnknownField(_))
        ));
        assert_eq!("totalPrice".parse::<OrderField>(), Ok(OrderField::TotalPrice));
    }

    #[test]
    fn report_display_joins_messages() {
        let report = ReviewSession::from_extraction(karim_draft()).validate();
        let text = report.to_string();
        assert!(text.contains("Phone number"));
        assert!(text.contains("Total price"));
    }
}
