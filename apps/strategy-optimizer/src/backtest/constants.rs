//! Decimal constants for performance metric calculations.

use rust_decimal::Decimal;

pub const TWO: Decimal = Decimal::TWO;
pub const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 10); // 0.0000000001
