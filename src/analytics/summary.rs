use rust_decimal::Decimal;

use super::rollup::DerivedDayPoint;

/// Aggregates over one product's derived series. Recomputed on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSummary {
    pub total_procurement: Decimal,
    pub total_sales: Decimal,
    pub final_inventory: i64,
    pub net_revenue: Decimal,
    /// `None` for an empty series.
    pub average_inventory: Option<Decimal>,
    pub days_reported: usize,
}

pub fn summarize(series: &[DerivedDayPoint]) -> ProductSummary {
    let total_procurement = saturating_sum(series.iter().map(|p| p.procurement_amount));
    let total_sales = saturating_sum(series.iter().map(|p| p.sales_amount));
    let total_inventory = saturating_sum(series.iter().map(|p| Decimal::from(p.inventory)));

    let average_inventory = if series.is_empty() {
        None
    } else {
        total_inventory.checked_div(Decimal::from(series.len()))
    };

    ProductSummary {
        total_procurement,
        total_sales,
        final_inventory: series.last().map(|p| p.inventory).unwrap_or(0),
        net_revenue: total_sales.saturating_sub(total_procurement),
        average_inventory,
        days_reported: series.len(),
    }
}

fn saturating_sum(values: impl Iterator<Item = Decimal>) -> Decimal {
    values.fold(Decimal::ZERO, Decimal::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::rollup::RollupEngine;
    use crate::models::product::{DailyRecord, Product};
    use rust_decimal_macros::dec;

    fn point(day: u32, inventory: i64, procurement: Decimal, sales: Decimal) -> DerivedDayPoint {
        DerivedDayPoint {
            label: format!("Day {day}"),
            day,
            inventory,
            procurement_amount: procurement,
            sales_amount: sales,
        }
    }

    #[test]
    fn cherry_pack_totals_are_exact() {
        let product = Product {
            id: 1,
            product_id: "0000001".into(),
            product_name: "CHERRY 1PACK".into(),
            opening_inventory: 117,
            daily_data: vec![
                DailyRecord::new(1, 0, dec!(0), 22, dec!(5.98)),
                DailyRecord::new(2, 21, dec!(13.72), 12, dec!(5.98)),
                DailyRecord::new(3, 0, dec!(0), 7, dec!(4.98)),
            ],
        };
        let summary = summarize(&RollupEngine::default().compute_series(&product));

        // 131.56 + 71.76 + 34.86
        assert_eq!(summary.total_sales, dec!(238.18));
        assert_eq!(summary.total_procurement, dec!(288.12));
        assert_eq!(summary.net_revenue, dec!(-49.94));
        assert_eq!(summary.final_inventory, 97);
        assert_eq!(summary.days_reported, 3);
        assert_eq!(summary.average_inventory.map(|a| a.round_dp(2)), Some(dec!(98.67)));
    }

    #[test]
    fn empty_series_has_no_average() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_procurement, Decimal::ZERO);
        assert_eq!(summary.total_sales, Decimal::ZERO);
        assert_eq!(summary.net_revenue, Decimal::ZERO);
        assert_eq!(summary.final_inventory, 0);
        assert_eq!(summary.average_inventory, None);
    }

    #[test]
    fn net_revenue_identity_holds() {
        let series = vec![
            point(1, 4, dec!(10.10), dec!(3.33)),
            point(2, 0, dec!(0), dec!(99.99)),
            point(3, 12, dec!(7.5), dec!(0.01)),
        ];
        let summary = summarize(&series);
        assert_eq!(summary.net_revenue, summary.total_sales - summary.total_procurement);
        assert_eq!(summary.final_inventory, 12);
    }

    #[test]
    fn extreme_inventories_do_not_overflow_the_average() {
        let series = vec![
            point(1, i64::MAX, Decimal::MAX, dec!(0)),
            point(2, i64::MAX, Decimal::MAX, dec!(0)),
        ];
        let summary = summarize(&series);
        assert_eq!(summary.average_inventory, Some(Decimal::from(i64::MAX)));
        assert_eq!(summary.total_procurement, Decimal::MAX);
        assert_eq!(summary.net_revenue, Decimal::MIN);
    }
}
