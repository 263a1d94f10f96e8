// Upstream client
pub mod shopify_orders;

// Transformation
pub mod coercion;
pub mod normalizer;
pub mod row_mapper;
pub mod traceability;

// Downstream sink
pub mod sheets;
