//! Application Ports (Driven)
//!
//! Interfaces the use cases depend on. Adapters live in `infrastructure`.

mod price_data_port;

pub use price_data_port::{PriceDataError, PriceDataPort};
