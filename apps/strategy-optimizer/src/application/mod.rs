//! Application Layer
//!
//! Orchestrates the optimizer through use cases:
//!
//! - **Ports**: Interfaces for external systems (price data)
//! - **Use Cases**: Resolve strategy, grid and data, then run one optimization

pub mod ports;
pub mod use_cases;

pub use ports::*;
pub use use_cases::*;
