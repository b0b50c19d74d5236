use rust_decimal_macros::dec;

use crate::models::product::{DailyRecord, Product};

/// Demo data shown to users who have not uploaded anything yet.
pub fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            product_id: "0000001".to_string(),
            product_name: "CHERRY 1PACK".to_string(),
            opening_inventory: 117,
            daily_data: vec![
                DailyRecord::new(1, 0, dec!(0), 22, dec!(5.98)),
                DailyRecord::new(2, 21, dec!(13.72), 12, dec!(5.98)),
                DailyRecord::new(3, 0, dec!(0), 7, dec!(4.98)),
            ],
        },
        Product {
            id: 2,
            product_id: "0000002".to_string(),
            product_name: "ENOKI MUSHROOM 360G".to_string(),
            opening_inventory: 1020,
            daily_data: vec![
                DailyRecord::new(1, 750, dec!(3.2), 157, dec!(4.38)),
                DailyRecord::new(2, 240, dec!(2.8), 111, dec!(4.38)),
                DailyRecord::new(3, 192, dec!(3.6), 95, dec!(4.38)),
            ],
        },
        Product {
            id: 3,
            product_id: "0000003".to_string(),
            product_name: "JIN RAMEN HOT 5P".to_string(),
            opening_inventory: 23,
            daily_data: vec![
                DailyRecord::new(1, 720, dec!(7), 23, dec!(9.98)),
                DailyRecord::new(2, 0, dec!(7), 20, dec!(9.98)),
                DailyRecord::new(3, 360, dec!(7.6), 15, dec!(9.98)),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::rollup::RollupEngine;

    #[test]
    fn samples_roll_forward() {
        let engine = RollupEngine::default();
        let inventories: Vec<Vec<i64>> = sample_products()
            .iter()
            .map(|p| engine.compute_series(p).iter().map(|d| d.inventory).collect())
            .collect();

        assert_eq!(inventories, vec![
            vec![95, 104, 97],
            vec![1613, 1742, 1839],
            vec![720, 700, 1045],
        ]);
    }
}
