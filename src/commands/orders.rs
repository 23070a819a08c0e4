//! Order history commands.

use crate::core_state::DeskState;
use crate::models::OrderRecord;
use crate::orders::OrderStats;

/// Full history, most recent first.
pub fn list_orders(state: &DeskState) -> Vec<OrderRecord> {
    state.store().orders().to_vec()
}

/// Orders matching `query` by customer name or phone number.
pub fn search_orders(state: &DeskState, query: &str) -> Vec<OrderRecord> {
    state.store().search(query).into_iter().cloned().collect()
}

/// Delete an order. Returns whether it existed; an unknown id is not an error.
pub fn delete_order(state: &mut DeskState, id: &str) -> Result<bool, String> {
    state.delete_order(id.trim()).map_err(|e| e.to_string())
}

pub fn order_stats(state: &DeskState) -> OrderStats {
    state.store().stats()
}
