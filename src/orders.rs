//! Order history: confirmed orders, most recent first.
//!
//! The in-memory list is the source of truth while the desk runs. It is
//! loaded once from the `merchant_orders` slot and the full list is written
//! back to that slot after every append or delete.

use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{DatabaseError, KeyValueSlot};
use crate::models::{OrderDetails, OrderRecord, OrderStatus};

/// Slot holding the JSON-encoded order history.
pub const ORDERS_SLOT_KEY: &str = "merchant_orders";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Summary figures for the history header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderStats {
    pub order_count: usize,
    /// Sum of all known totals, in BDT.
    pub total_revenue: f64,
}

pub struct OrderStore {
    orders: Vec<OrderRecord>,
    slot: Box<dyn KeyValueSlot>,
    /// Every id this instance has seen, including deleted ones.
    seen_ids: HashSet<String>,
}

impl OrderStore {
    /// Load history from `slot`. Absent or unreadable content yields an
    /// empty history; this never fails. Individual records that do not
    /// decode are skipped and the rest are kept.
    pub fn load(slot: Box<dyn KeyValueSlot>) -> Self {
        let orders = match slot.read(ORDERS_SLOT_KEY) {
            Ok(Some(raw)) => decode_snapshot(&raw),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read order history, starting empty");
                Vec::new()
            }
        };

        tracing::info!(count = orders.len(), "Order history loaded");
        let seen_ids = orders.iter().map(|o| o.id.clone()).collect();
        Self {
            orders,
            slot,
            seen_ids,
        }
    }

    /// Confirm `details` as a new order at the front of the history.
    ///
    /// The record stays in memory even if the snapshot write fails; the
    /// error is returned so the caller can tell the user.
    pub fn append(&mut self, details: OrderDetails) -> Result<&OrderRecord, StoreError> {
        let record = OrderRecord {
            id: self.fresh_id(),
            timestamp: Utc::now().timestamp_millis(),
            status: OrderStatus::Confirmed,
            details,
        };
        tracing::info!(order_id = %record.id, "Order confirmed");

        self.orders.insert(0, record);
        self.flush()?;
        Ok(&self.orders[0])
    }

    /// Remove the order with `id`. Returns whether anything was removed;
    /// an unknown id leaves both the list and the snapshot untouched.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.orders.len();
        self.orders.retain(|o| o.id != id);
        if self.orders.len() == before {
            tracing::debug!(order_id = %id, "Delete ignored, no such order");
            return Ok(false);
        }

        tracing::info!(order_id = %id, "Order deleted");
        self.flush()?;
        Ok(true)
    }

    /// Orders whose customer name contains `query` (case-insensitive) or
    /// whose phone number contains it verbatim, in store order.
    pub fn search(&self, query: &str) -> Vec<&OrderRecord> {
        let query = query.trim();
        if query.is_empty() {
            return self.orders.iter().collect();
        }

        let needle = query.to_lowercase();
        self.orders
            .iter()
            .filter(|o| {
                let name_hit = o
                    .details
                    .customer_name
                    .as_known()
                    .is_some_and(|n| n.to_lowercase().contains(&needle));
                let phone_hit = o
                    .details
                    .phone_number
                    .as_known()
                    .is_some_and(|p| p.contains(query));
                name_hit || phone_hit
            })
            .collect()
    }

    /// Write the full history to the slot.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        let snapshot = serde_json::to_string(&self.orders)?;
        self.slot.write(ORDERS_SLOT_KEY, &snapshot).map_err(|e| {
            tracing::error!(error = %e, "Failed to persist order history");
            StoreError::Storage(e)
        })
    }

    pub fn orders(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn stats(&self) -> OrderStats {
        OrderStats {
            order_count: self.orders.len(),
            total_revenue: self
                .orders
                .iter()
                .filter_map(|o| o.details.total_price.as_known())
                .sum(),
        }
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.seen_ids.insert(id.clone()) {
                return id;
            }
        }
    }
}

fn decode_snapshot(raw: &str) -> Vec<OrderRecord> {
    let values = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "Stored order history is unreadable, starting empty");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<OrderRecord>(value) {
            Ok(order) => Some(order),
            Err(e) => {
                tracing::warn!(index, error = %e, "Skipping undecodable stored order");
                None
            }
        })
        .collect()
}
