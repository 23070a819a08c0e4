//! Review commands: manual entry, field edits, confirm and discard.

use serde::Serialize;

use crate::core_state::{ConfirmOutcome, DeskState};
use crate::models::{Field, OrderRecord};
use crate::review::{FieldIssue, FieldStatus, OrderField, ReviewOrigin, ReviewSession};

/// One editable field as the front end renders it.
#[derive(Debug, Clone, Serialize)]
pub struct FieldView {
    pub field: OrderField,
    pub key: &'static str,
    pub label: &'static str,
    /// `None` while the field is Unknown / absent.
    pub value: Option<String>,
    pub status: FieldStatus,
    pub required: bool,
}

/// The open review: every field with its state, plus the price warning.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    pub origin: ReviewOrigin,
    pub fields: Vec<FieldView>,
    pub price_warning: Option<String>,
    /// Current validation issues; empty when the draft can be saved.
    pub issues: Vec<FieldIssue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmResult {
    Saved { order: OrderRecord },
    Blocked { review: ReviewView },
}

pub fn review_view(session: &ReviewSession) -> ReviewView {
    let draft = session.draft();
    let fields = OrderField::ALL
        .into_iter()
        .map(|field| {
            let value = match field {
                OrderField::CustomerName => draft.customer_name.as_known().cloned(),
                OrderField::PhoneNumber => draft.phone_number.as_known().cloned(),
                OrderField::DeliveryAddress => draft.delivery_address.as_known().cloned(),
                OrderField::TotalPrice => match draft.total_price {
                    Field::Known(p) => Some(p.to_string()),
                    Field::Unknown => None,
                },
                OrderField::Items => draft.items.clone(),
                OrderField::Note => draft.note.clone(),
            };
            FieldView {
                field,
                key: field.key(),
                label: field.label(),
                value,
                status: session.field_status(field),
                required: field.is_required(),
            }
        })
        .collect();

    ReviewView {
        origin: session.origin(),
        fields,
        price_warning: session.price_warning().map(str::to_string),
        issues: session.validate().issues,
    }
}

/// The review currently open.
pub fn get_review(state: &DeskState) -> Result<ReviewView, String> {
    state
        .review()
        .map(review_view)
        .ok_or_else(|| "No order is open for review".to_string())
}

/// Open a blank order for manual entry.
pub fn start_manual_order(state: &mut DeskState) -> ReviewView {
    review_view(state.start_manual())
}

/// Set one field of the open review from typed text.
pub fn update_review_field(
    state: &mut DeskState,
    field: &str,
    value: &str,
) -> Result<ReviewView, String> {
    let field = field.parse::<OrderField>().map_err(|e| e.to_string())?;
    let session = state.review_mut().map_err(|e| e.to_string())?;
    session.set_field(field, value).map_err(|e| e.to_string())?;
    Ok(review_view(session))
}

/// Validate and save the open review.
pub fn confirm_review(state: &mut DeskState) -> Result<ConfirmResult, String> {
    match state.confirm_review().map_err(|e| e.to_string())? {
        ConfirmOutcome::Saved(order) => Ok(ConfirmResult::Saved { order }),
        ConfirmOutcome::Blocked(_) => {
            let review = get_review(state)?;
            Ok(ConfirmResult::Blocked { review })
        }
    }
}

/// Close the open review without saving.
pub fn discard_review(state: &mut DeskState) -> Result<(), String> {
    if state.discard_review() {
        Ok(())
    } else {
        Err("No order is open for review".to_string())
    }
}
