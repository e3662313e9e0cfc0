//! Money calculation utilities using rust_decimal for precision
//!
//! Monetary values are stored and serialized as `f64`; all arithmetic runs
//! through `Decimal` and is rounded to 2 decimal places on the way back.

use rust_decimal::prelude::*;

use crate::db::models::{OrderItem, OrderItemInput};
use crate::utils::AppError;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Maximum allowed price per item (₱100,000,000)
pub const MAX_PRICE: f64 = 100_000_000.0;
/// Maximum allowed quantity per line item
pub const MAX_QUANTITY: i32 = 9999;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> Result<(), AppError> {
    if !value.is_finite() {
        return Err(AppError::validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a checkout line item before resolving it against the catalog.
pub fn validate_line_item(item: &OrderItemInput) -> Result<(), AppError> {
    if item.product.trim().is_empty() {
        return Err(AppError::validation("item product id must not be empty"));
    }
    if item.quantity <= 0 {
        return Err(AppError::validation(format!(
            "quantity must be positive, got {}",
            item.quantity
        )));
    }
    if item.quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, item.quantity
        )));
    }
    Ok(())
}

/// Validate a client-declared order total.
pub fn validate_client_total(total: f64) -> Result<(), AppError> {
    require_finite(total, "total_amount")?;
    if total < 0.0 {
        return Err(AppError::validation(format!(
            "total_amount must be non-negative, got {}",
            total
        )));
    }
    Ok(())
}

/// Validate a catalog price.
pub fn validate_price(price: f64) -> Result<(), AppError> {
    require_finite(price, "price")?;
    if price < 0.0 {
        return Err(AppError::validation(format!(
            "price must be non-negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "price exceeds maximum allowed ({}), got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: unit price × quantity
pub fn line_total(price: f64, quantity: i32) -> Decimal {
    (to_decimal(price) * Decimal::from(quantity))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Order total: Σ line totals over the captured items
pub fn order_total(items: &[OrderItem]) -> Decimal {
    items
        .iter()
        .map(|item| line_total(item.price, item.quantity))
        .sum()
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::OrderItem;

    fn item(price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            product: "product:test".parse().unwrap(),
            name: "Test".to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_to_decimal_precision() {
        // Classic floating point problem: 0.1 + 0.2 != 0.3
        let sum_f64 = 0.1_f64 + 0.2_f64;
        assert_ne!(sum_f64, 0.3);

        let sum_dec = to_decimal(0.1) + to_decimal(0.2);
        assert_eq!(to_f64(sum_dec), 0.3);
    }

    #[test]
    fn test_accumulation_precision() {
        // Sum 0.01 one thousand times
        let mut total = Decimal::ZERO;
        for _ in 0..1000 {
            total += to_decimal(0.01);
        }
        assert_eq!(to_f64(total), 10.0);
    }

    #[test]
    fn test_order_total_sums_line_totals() {
        let items = vec![item(849_000.50, 2), item(1_250_000.25, 1)];
        // 849000.50 * 2 + 1250000.25 = 2948001.25
        assert_eq!(to_f64(order_total(&items)), 2_948_001.25);
    }

    #[test]
    fn test_money_eq_tolerance() {
        assert!(money_eq(100.0, 100.0));
        assert!(money_eq(100.004, 100.006));
        assert!(!money_eq(100.0, 100.02));
    }

    // ========================================================================
    // Decimal 转换边界测试
    // ========================================================================

    #[test]
    fn test_to_decimal_nan_becomes_zero() {
        // NaN 被 Decimal::from_f64 拒绝，unwrap_or_default 返回 0
        assert_eq!(to_decimal(f64::NAN), Decimal::ZERO);
    }

    #[test]
    fn test_to_decimal_infinity_becomes_zero() {
        assert_eq!(to_decimal(f64::INFINITY), Decimal::ZERO);
        assert_eq!(to_decimal(f64::NEG_INFINITY), Decimal::ZERO);
    }

    // ========================================================================
    // 校验边界测试
    // ========================================================================

    #[test]
    fn test_validate_line_item_bounds() {
        let ok = OrderItemInput {
            product: "product:a".to_string(),
            quantity: 2,
        };
        assert!(validate_line_item(&ok).is_ok());

        let zero = OrderItemInput {
            product: "product:a".to_string(),
            quantity: 0,
        };
        assert!(validate_line_item(&zero).is_err());

        let negative = OrderItemInput {
            product: "product:a".to_string(),
            quantity: -3,
        };
        assert!(validate_line_item(&negative).is_err());

        let oversized = OrderItemInput {
            product: "product:a".to_string(),
            quantity: MAX_QUANTITY + 1,
        };
        assert!(validate_line_item(&oversized).is_err());

        let blank = OrderItemInput {
            product: "  ".to_string(),
            quantity: 1,
        };
        assert!(validate_line_item(&blank).is_err());
    }

    #[test]
    fn test_validate_client_total_rejects_nan_and_negative() {
        assert!(validate_client_total(0.0).is_ok());
        assert!(validate_client_total(2_948_001.25).is_ok());
        assert!(validate_client_total(f64::NAN).is_err());
        assert!(validate_client_total(f64::INFINITY).is_err());
        assert!(validate_client_total(-1.0).is_err());
    }

    #[test]
    fn test_validate_price_bounds() {
        assert!(validate_price(849_000.50).is_ok());
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(MAX_PRICE + 1.0).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }
}
