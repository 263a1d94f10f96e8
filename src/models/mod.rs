// Shopify payloads as received
pub mod lenient;
pub mod order;

// Report layout
pub mod sheet_row;

pub use order::{NoteAttribute, OrdersPage, ShopifyOrder};
pub use sheet_row::{CellValue, Column, Row};
