use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::product::{DailyRecord, Product};

/// Horizon and clamp policy for the roll-forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupConfig {
    /// Number of days in the reporting window (days `1..=horizon_days`).
    pub horizon_days: u32,
    /// Lowest inventory value ever displayed.
    pub clamp_floor: i64,
    /// When false the displayed inventory is the raw running balance.
    pub clamp_display: bool,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self { horizon_days: 3, clamp_floor: 0, clamp_display: true }
    }
}

/// One emitted row of the derived daily series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedDayPoint {
    pub label: String,
    pub day: u32,
    pub inventory: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub procurement_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales_amount: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RollupEngine {
    config: RollupConfig,
}

impl RollupEngine {
    pub fn new(config: RollupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RollupConfig {
        &self.config
    }

    /// Rolls the opening inventory forward through days `1..=N`.
    ///
    /// Days without a record emit no point and leave the balance untouched.
    /// The displayed inventory is clamped to the floor, but the running
    /// balance carried into the next day is the unclamped one. Records
    /// outside the window are ignored; for duplicate days the first record
    /// wins. Balances and amounts saturate instead of overflowing.
    pub fn compute_series(&self, product: &Product) -> Vec<DerivedDayPoint> {
        let mut by_day: HashMap<u32, &DailyRecord> =
            HashMap::with_capacity(product.daily_data.len());
        for record in &product.daily_data {
            by_day.entry(record.day).or_insert(record);
        }

        let mut running = product.opening_inventory;
        let mut points = Vec::with_capacity(by_day.len().min(self.config.horizon_days as usize));

        for day in 1..=self.config.horizon_days {
            let Some(record) = by_day.get(&day) else {
                continue;
            };

            running = running
                .saturating_add(record.procurement_qty)
                .saturating_sub(record.sales_qty);

            points.push(DerivedDayPoint {
                label: format!("Day {day}"),
                day,
                inventory: self.displayed(running),
                procurement_amount: amount(record.procurement_qty, record.procurement_price),
                sales_amount: amount(record.sales_qty, record.sales_price),
            });
        }

        points
    }

    fn displayed(&self, running: i64) -> i64 {
        if self.config.clamp_display {
            running.max(self.config.clamp_floor)
        } else {
            running
        }
    }
}

fn amount(qty: i64, price: Decimal) -> Decimal {
    Decimal::from(qty).saturating_mul(price)
}
