use super::rollup::DerivedDayPoint;

pub const CSV_HEADER: [&str; 4] = ["Day", "Inventory", "Procurement Amount", "Sales Amount"];

/// Writes one CSV row per emitted day point, in series order, under a fixed header.
pub fn write_series_csv<W: std::io::Write>(
    series: &[DerivedDayPoint],
    out: W,
) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for point in series {
        writer.write_record([
            point.label.clone(),
            point.inventory.to_string(),
            point.procurement_amount.normalize().to_string(),
            point.sales_amount.normalize().to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn series_to_csv(series: &[DerivedDayPoint]) -> Result<String, csv::Error> {
    let mut buf = Vec::new();
    write_series_csv(series, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// `<product name>_data.csv`, with characters that break a header value replaced.
pub fn export_file_name(product_name: &str) -> String {
    let cleaned: String = product_name
        .chars()
        .map(|c| if c.is_control() || matches!(c, '"' | '\\' | '/') { '_' } else { c })
        .collect();
    format!("{}_data.csv", cleaned.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn writes_header_and_one_row_per_point() {
        let series = vec![
            DerivedDayPoint {
                label: "Day 1".into(),
                day: 1,
                inventory: 95,
                procurement_amount: dec!(0),
                sales_amount: dec!(131.56),
            },
            DerivedDayPoint {
                label: "Day 3".into(),
                day: 3,
                inventory: 0,
                procurement_amount: dec!(288.120),
                sales_amount: dec!(34.86),
            },
        ];

        let csv = series_to_csv(&series).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![
            "Day,Inventory,Procurement Amount,Sales Amount",
            "Day 1,95,0,131.56",
            "Day 3,0,288.12,34.86",
        ]);
    }

    #[test]
    fn empty_series_still_has_header() {
        let csv = series_to_csv(&[]).unwrap();
        assert_eq!(csv, "Day,Inventory,Procurement Amount,Sales Amount\n");
    }

    #[test]
    fn file_name_is_header_safe() {
        assert_eq!(export_file_name("CHERRY 1PACK"), "CHERRY 1PACK_data.csv");
        assert_eq!(export_file_name("A/B \"x\""), "A_B _x__data.csv");
    }
}
