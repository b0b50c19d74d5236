use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use sqlx::FromRow;

/// Largest magnitude accepted for a daily quantity or an opening balance.
pub const MAX_QUANTITY: i64 = 1_000_000_000_000;
/// Largest unit price accepted, in whole currency units.
pub const MAX_PRICE: i64 = 10_000_000_000;
/// Prices are stored as `NUMERIC(18, 4)`.
pub const PRICE_SCALE: u32 = 4;

pub fn quantity_in_range(qty: i64) -> bool {
    (-MAX_QUANTITY..=MAX_QUANTITY).contains(&qty)
}

/// Rounds a price to the stored scale, half away from zero as Postgres does
/// on insert. `None` when the price exceeds `MAX_PRICE`.
pub fn stored_price(price: Decimal) -> Option<Decimal> {
    if price.abs() > Decimal::from(MAX_PRICE) {
        return None;
    }
    Some(price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// One calendar day of raw activity for a product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub day: u32,
    pub procurement_qty: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub procurement_price: Decimal,
    pub sales_qty: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales_price: Decimal,
}

impl DailyRecord {
    pub fn new(
        day: u32,
        procurement_qty: i64,
        procurement_price: Decimal,
        sales_qty: i64,
        sales_price: Decimal,
    ) -> Self {
        Self { day, procurement_qty, procurement_price, sales_qty, sales_price }
    }
}

/// A product as read back from the store (or the built-in samples).
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub product_id: String,
    pub product_name: String,
    pub opening_inventory: i64,
    pub daily_data: Vec<DailyRecord>,
}

/// A product that has been parsed and validated but not stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub product_id: String,
    pub product_name: String,
    pub opening_inventory: i64,
    pub daily_data: Vec<DailyRecord>,
}

impl NewProduct {
    pub fn into_product(self, id: i64) -> Product {
        Product {
            id,
            product_id: self.product_id,
            product_name: self.product_name,
            opening_inventory: self.opening_inventory,
            daily_data: self.daily_data,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub product_code: String,
    pub product_name: String,
    pub opening_inventory: i64,
}

#[derive(Debug, FromRow)]
pub struct DailyRecordRow {
    pub product_id: i64,
    pub day: i32,
    pub procurement_qty: i64,
    pub procurement_price: Decimal,
    pub sales_qty: i64,
    pub sales_price: Decimal,
}

impl From<DailyRecordRow> for DailyRecord {
    fn from(row: DailyRecordRow) -> Self {
        Self {
            day: u32::try_from(row.day).unwrap_or(0),
            procurement_qty: row.procurement_qty,
            procurement_price: row.procurement_price,
            sales_qty: row.sales_qty,
            sales_price: row.sales_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn prices_round_to_stored_scale() {
        assert_eq!(stored_price(dec!(5.98)), Some(dec!(5.98)));
        assert_eq!(stored_price(dec!(0.3333333333333333)), Some(dec!(0.3333)));
        assert_eq!(stored_price(dec!(0.33335)), Some(dec!(0.3334)));
        assert_eq!(stored_price(dec!(0.33345)), Some(dec!(0.3335)));
    }

    #[test]
    fn prices_above_the_limit_are_refused() {
        assert_eq!(stored_price(Decimal::from(MAX_PRICE)), Some(Decimal::from(MAX_PRICE)));
        assert_eq!(stored_price(dec!(99999999999)), None);
        assert_eq!(stored_price(Decimal::MAX), None);
    }

    #[test]
    fn quantity_bounds() {
        assert!(quantity_in_range(0));
        assert!(quantity_in_range(-MAX_QUANTITY));
        assert!(!quantity_in_range(MAX_QUANTITY + 1));
        assert!(!quantity_in_range(i64::MAX));
    }
}
