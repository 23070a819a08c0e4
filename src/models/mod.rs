pub mod enums;
pub mod order;

pub use enums::OrderStatus;
pub use order::{format_taka, Field, OrderDetails, OrderRecord};
