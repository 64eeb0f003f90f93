//! Trading signals produced by strategies.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Desired position after observing a bar's close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Hold a long position.
    Long,
    /// Hold no position.
    #[default]
    Flat,
    /// Hold a short position.
    Short,
}

impl Signal {
    /// Signed exposure: +1 long, 0 flat, -1 short.
    #[must_use]
    pub const fn exposure(&self) -> Decimal {
        match self {
            Self::Long => Decimal::ONE,
            Self::Flat => Decimal::ZERO,
            Self::Short => Decimal::NEGATIVE_ONE,
        }
    }

    /// Whether the signal holds a position.
    #[must_use]
    pub const fn is_in_market(&self) -> bool {
        !matches!(self, Self::Flat)
    }
}
