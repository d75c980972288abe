use alloy_primitives::U256;

use crate::error::TransformerError;

/// Computes `ceil(a * b / c)` with checked 256-bit arithmetic.
///
/// Share-based tokens floor their conversions, so the amount needed to
/// guarantee an expected output is the floored quotient plus one whenever
/// the division left a remainder.
pub fn mul_div_up(a: U256, b: U256, c: U256) -> Result<U256, TransformerError> {
    if c.is_zero() {
        return Err(TransformerError::ArithmeticOverflow);
    }
    let product = a.checked_mul(b).ok_or(TransformerError::ArithmeticOverflow)?;
    let floor = product / c;
    if (product % c).is_zero() {
        Ok(floor)
    } else {
        floor
            .checked_add(U256::from(1u8))
            .ok_or(TransformerError::ArithmeticOverflow)
    }
}
