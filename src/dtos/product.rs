// src/dtos/product.rs
use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::analytics::rollup::{DerivedDayPoint, RollupEngine};
use crate::analytics::summary::{summarize, ProductSummary};
use crate::error::AppError;
use crate::models::product::{
    quantity_in_range, stored_price, DailyRecord, NewProduct, Product, MAX_PRICE, MAX_QUANTITY,
};

#[derive(Debug, Deserialize)]
pub struct DailyRecordInput {
    pub day: u32,
    #[serde(default)]
    pub procurement_qty: i64,
    #[serde(default)]
    pub procurement_price: Decimal,
    #[serde(default)]
    pub sales_qty: i64,
    #[serde(default)]
    pub sales_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub product_id: String,
    pub product_name: Option<String>,
    #[serde(default)]
    pub opening_inventory: i64,
    #[serde(default)]
    pub daily_data: Vec<DailyRecordInput>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceProductsRequest {
    pub products: Vec<ProductInput>,
}

impl ProductInput {
    /// Checks the import against the reporting window: days in `1..=horizon`,
    /// at most one record per day, quantities and prices non-negative and
    /// within the stored bounds. Prices are rounded to the stored scale.
    pub fn validate(self, horizon_days: u32) -> Result<NewProduct, AppError> {
        let product_id = self.product_id.trim().to_string();
        if product_id.is_empty() {
            return Err(AppError::validation("product_id is required"));
        }
        if !quantity_in_range(self.opening_inventory) {
            return Err(AppError::validation(format!(
                "Product {product_id}: opening_inventory must be within ±{MAX_QUANTITY}"
            )));
        }

        let mut seen = HashSet::new();
        let mut daily_data = Vec::with_capacity(self.daily_data.len());
        for d in self.daily_data {
            let day = d.day;
            if day == 0 || day > horizon_days {
                return Err(AppError::validation(format!(
                    "Product {product_id}: day {day} is outside 1..={horizon_days}"
                )));
            }
            if !seen.insert(day) {
                return Err(AppError::validation(format!(
                    "Product {product_id}: duplicate day {day}"
                )));
            }
            if d.procurement_qty < 0 || d.sales_qty < 0 {
                return Err(AppError::validation(format!(
                    "Product {product_id}: quantities must not be negative (day {day})"
                )));
            }
            if d.procurement_price < Decimal::ZERO || d.sales_price < Decimal::ZERO {
                return Err(AppError::validation(format!(
                    "Product {product_id}: prices must not be negative (day {day})"
                )));
            }
            if d.procurement_qty > MAX_QUANTITY || d.sales_qty > MAX_QUANTITY {
                return Err(AppError::validation(format!(
                    "Product {product_id}: quantities must not exceed {MAX_QUANTITY} (day {day})"
                )));
            }
            let (Some(procurement_price), Some(sales_price)) =
                (stored_price(d.procurement_price), stored_price(d.sales_price))
            else {
                return Err(AppError::validation(format!(
                    "Product {product_id}: prices must not exceed {MAX_PRICE} (day {day})"
                )));
            };
            daily_data.push(DailyRecord::new(
                day,
                d.procurement_qty,
                procurement_price,
                d.sales_qty,
                sales_price,
            ));
        }
        daily_data.sort_by_key(|d| d.day);

        Ok(NewProduct {
            product_id,
            product_name: self
                .product_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Unknown Product".to_string()),
            opening_inventory: self.opening_inventory,
            daily_data,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Sample,
    Uploaded,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_procurement: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_sales: Decimal,
    pub final_inventory: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub average_inventory: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub inventory_turnover: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub profit_margin_percent: Option<Decimal>,
    pub days_reported: usize,
}

/// Sales over average inventory, rounded to 2 places. `None` when the
/// average is missing or zero.
pub fn inventory_turnover(summary: &ProductSummary) -> Option<Decimal> {
    match summary.average_inventory {
        Some(avg) if !avg.is_zero() => {
            summary.total_sales.checked_div(avg).map(|t| t.round_dp(2))
        }
        _ => None,
    }
}

/// Net revenue as a percentage of sales, rounded to 1 place. `None` without sales.
pub fn profit_margin_percent(summary: &ProductSummary) -> Option<Decimal> {
    if summary.total_sales.is_zero() {
        return None;
    }
    summary
        .net_revenue
        .checked_div(summary.total_sales)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|percent| percent.round_dp(1))
}

impl From<&ProductSummary> for SummaryResponse {
    fn from(summary: &ProductSummary) -> Self {
        Self {
            total_procurement: summary.total_procurement,
            total_sales: summary.total_sales,
            final_inventory: summary.final_inventory,
            net_revenue: summary.net_revenue,
            average_inventory: summary.average_inventory,
            inventory_turnover: inventory_turnover(summary),
            profit_margin_percent: profit_margin_percent(summary),
            days_reported: summary.days_reported,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductAnalyticsResponse {
    pub id: i64,
    pub product_id: String,
    pub product_name: String,
    pub opening_inventory: i64,
    pub daily_data: Vec<DailyRecord>,
    pub chart_data: Vec<DerivedDayPoint>,
    pub summary: SummaryResponse,
}

impl ProductAnalyticsResponse {
    pub fn build(product: Product, engine: &RollupEngine) -> Self {
        let chart_data = engine.compute_series(&product);
        let summary = summarize(&chart_data);
        Self {
            id: product.id,
            product_id: product.product_id,
            product_name: product.product_name,
            opening_inventory: product.opening_inventory,
            daily_data: product.daily_data,
            summary: SummaryResponse::from(&summary),
            chart_data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductAnalyticsResponse>,
    pub source: DataSource,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub data: Vec<ProductAnalyticsResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::rollup::RollupConfig;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn summary(
        total_sales: Decimal,
        net_revenue: Decimal,
        average_inventory: Option<Decimal>,
    ) -> ProductSummary {
        ProductSummary {
            total_procurement: total_sales - net_revenue,
            total_sales,
            final_inventory: 0,
            net_revenue,
            average_inventory,
            days_reported: 1,
        }
    }

    fn input(value: serde_json::Value) -> ProductInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn ratios_are_guarded() {
        assert_eq!(inventory_turnover(&summary(dec!(50), dec!(0), None)), None);
        assert_eq!(inventory_turnover(&summary(dec!(50), dec!(0), Some(dec!(0)))), None);
        assert_eq!(profit_margin_percent(&summary(dec!(0), dec!(-10), Some(dec!(3)))), None);
    }

    #[test]
    fn ratios_are_rounded_for_display() {
        let s = summary(dec!(100), dec!(12.345), Some(dec!(3)));
        assert_eq!(inventory_turnover(&s), Some(dec!(33.33)));
        assert_eq!(profit_margin_percent(&s), Some(dec!(12.3)));
    }

    #[test]
    fn sample_cherry_ratios_come_from_the_engine_series() {
        let cherry = crate::sample::sample_products().remove(0);
        let series = RollupEngine::default().compute_series(&cherry);
        let summary = summarize(&series);

        // 238.18 / (296 / 3) and -49.94 / 238.18
        assert_eq!(inventory_turnover(&summary), Some(dec!(2.41)));
        assert_eq!(profit_margin_percent(&summary), Some(dec!(-21.0)));
    }

    #[test]
    fn extreme_margin_is_dropped_rather_than_overflowing() {
        let s = summary(dec!(1), dec!(-1000000000000000000000000000), Some(dec!(1)));
        assert_eq!(profit_margin_percent(&s), None);
    }

    #[test]
    fn analytics_response_serializes_numbers() {
        let product = crate::sample::sample_products().remove(0);
        let response = ProductAnalyticsResponse::build(product, &RollupEngine::default());
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["chart_data"][0]["label"], "Day 1");
        assert_eq!(value["chart_data"][0]["inventory"], 95);
        assert_eq!(value["chart_data"][0]["sales_amount"], json!(131.56));
        assert_eq!(value["summary"]["total_sales"], json!(238.18));
        assert_eq!(value["summary"]["net_revenue"], json!(-49.94));
        assert_eq!(value["summary"]["final_inventory"], 97);
        assert_eq!(value["summary"]["inventory_turnover"], json!(2.41));
        assert_eq!(value["summary"]["profit_margin_percent"], json!(-21.0));
    }

    #[test]
    fn empty_product_has_null_ratios() {
        let product = Product {
            id: 9,
            product_id: "X".into(),
            product_name: "Nothing".into(),
            opening_inventory: 4,
            daily_data: vec![],
        };
        let engine = RollupEngine::new(RollupConfig::default());
        let response = ProductAnalyticsResponse::build(product, &engine);
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(value["chart_data"], json!([]));
        assert!(value["summary"]["average_inventory"].is_null());
        assert!(value["summary"]["inventory_turnover"].is_null());
        assert!(value["summary"]["profit_margin_percent"].is_null());
    }

    #[test]
    fn data_source_is_snake_case() {
        assert_eq!(serde_json::to_value(DataSource::Uploaded).unwrap(), json!("uploaded"));
    }

    #[test]
    fn import_is_validated_and_sorted() {
        let product = input(json!({
            "product_id": " 0000009 ",
            "opening_inventory": -3,
            "daily_data": [
                { "day": 2, "sales_qty": 1, "sales_price": 2.5 },
                { "day": 1, "procurement_qty": 4, "procurement_price": "1.10" }
            ]
        }))
        .validate(3)
        .unwrap();

        assert_eq!(product.product_id, "0000009");
        assert_eq!(product.product_name, "Unknown Product");
        assert_eq!(product.opening_inventory, -3);
        assert_eq!(
            product.daily_data,
            vec![
                DailyRecord::new(1, 4, dec!(1.10), 0, dec!(0)),
                DailyRecord::new(2, 0, dec!(0), 1, dec!(2.5)),
            ]
        );
    }

    #[test]
    fn import_rejects_out_of_range_and_duplicate_days() {
        let out_of_range = input(json!({ "product_id": "A", "daily_data": [{ "day": 4 }] }));
        assert!(matches!(out_of_range.validate(3), Err(AppError::ValidationError(_))));

        let zero = input(json!({ "product_id": "A", "daily_data": [{ "day": 0 }] }));
        assert!(zero.validate(3).is_err());

        let duplicate =
            input(json!({ "product_id": "A", "daily_data": [{ "day": 1 }, { "day": 1 }] }));
        assert!(duplicate.validate(3).is_err());
    }

    #[test]
    fn import_rejects_negative_values() {
        let qty =
            input(json!({ "product_id": "A", "daily_data": [{ "day": 1, "sales_qty": -1 }] }));
        assert!(qty.validate(3).is_err());

        let price = input(json!({
            "product_id": "A",
            "daily_data": [{ "day": 1, "procurement_price": -0.5 }]
        }));
        assert!(price.validate(3).is_err());

        let blank = input(json!({ "product_id": "  " }));
        assert!(blank.validate(3).is_err());
    }

    #[test]
    fn import_rejects_values_beyond_stored_bounds() {
        let huge_amount = input(json!({
            "product_id": "A",
            "daily_data": [{
                "day": 1,
                "procurement_qty": 9_000_000_000_000_000_000i64,
                "procurement_price": 99999999999i64
            }]
        }));
        assert!(matches!(huge_amount.validate(3), Err(AppError::ValidationError(_))));

        let huge_price = input(json!({
            "product_id": "A",
            "daily_data": [{ "day": 1, "sales_qty": 1, "sales_price": 99999999999i64 }]
        }));
        assert!(huge_price.validate(3).is_err());

        let opening = input(json!({ "product_id": "A", "opening_inventory": i64::MAX }));
        assert!(opening.validate(3).is_err());
    }

    #[test]
    fn largest_accepted_import_builds_analytics() {
        let product = input(json!({
            "product_id": "A",
            "opening_inventory": MAX_QUANTITY,
            "daily_data": [
                { "day": 1, "procurement_qty": MAX_QUANTITY, "procurement_price": MAX_PRICE },
                { "day": 2, "sales_qty": MAX_QUANTITY, "sales_price": MAX_PRICE },
                { "day": 3, "procurement_qty": MAX_QUANTITY, "procurement_price": MAX_PRICE }
            ]
        }))
        .validate(3)
        .unwrap()
        .into_product(1);

        let response = ProductAnalyticsResponse::build(product, &RollupEngine::default());
        assert_eq!(response.summary.final_inventory, 2 * MAX_QUANTITY);
        let max_amount = Decimal::from(MAX_QUANTITY) * Decimal::from(MAX_PRICE);
        assert_eq!(response.summary.total_sales, max_amount);
    }

    #[test]
    fn import_prices_are_rounded_to_stored_scale() {
        let product = input(json!({
            "product_id": "A",
            "daily_data": [{
                "day": 1,
                "procurement_price": "0.3333333333",
                "sales_price": "1.23455"
            }]
        }))
        .validate(3)
        .unwrap();

        assert_eq!(product.daily_data[0].procurement_price, dec!(0.3333));
        assert_eq!(product.daily_data[0].sales_price, dec!(1.2346));
    }
}
