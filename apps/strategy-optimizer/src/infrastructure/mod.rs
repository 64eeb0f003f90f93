//! Infrastructure Layer
//!
//! Adapters implementing the application ports.

pub mod price_data;

pub use price_data::{InMemoryPriceData, JsonFilePriceData, PriceFile};
