use std::io::Cursor;
use std::str::FromStr;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::models::product::{
    quantity_in_range, stored_price, DailyRecord, NewProduct, MAX_PRICE, MAX_QUANTITY,
};

const FIXED_COLUMNS: usize = 3;
const UNKNOWN_PRODUCT: &str = "Unknown Product";

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("Failed to read workbook: {0}")]
    Workbook(String),
    #[error("Workbook has no worksheets")]
    NoWorksheet,
    #[error("No product rows found")]
    NoProducts,
    #[error("Row {row}, column {column}: {field} must not be negative")]
    Negative { row: usize, column: String, field: &'static str },
    #[error("Row {row}, column {column}: {field} must not exceed {limit}")]
    OutOfRange { row: usize, column: String, field: &'static str, limit: i64 },
}

/// Positional layout of one upload row for an `N`-day window:
/// `product_id, product_name, opening_inventory`, then `N` procurement
/// `(qty, price)` pairs, then `N` sales `(qty, price)` pairs.
#[derive(Debug, Clone, Copy)]
pub struct RowSchema {
    horizon_days: u32,
}

impl RowSchema {
    pub fn new(horizon_days: u32) -> Self {
        Self { horizon_days }
    }

    pub fn width(&self) -> usize {
        FIXED_COLUMNS + 4 * self.horizon_days as usize
    }

    fn procurement_qty(&self, day: u32) -> usize {
        FIXED_COLUMNS + 2 * (day as usize - 1)
    }

    fn sales_qty(&self, day: u32) -> usize {
        FIXED_COLUMNS + 2 * self.horizon_days as usize + 2 * (day as usize - 1)
    }

    /// Header row matching the layout, for templates.
    pub fn header(&self) -> Vec<String> {
        let mut header = vec![
            "Product ID".to_string(),
            "Product Name".to_string(),
            "Opening Inventory".to_string(),
        ];
        for day in 1..=self.horizon_days {
            header.push(format!("Procurement Qty (Day {day})"));
            header.push(format!("Procurement Price (Day {day})"));
        }
        for day in 1..=self.horizon_days {
            header.push(format!("Sales Qty (Day {day})"));
            header.push(format!("Sales Price (Day {day})"));
        }
        header
    }
}

/// A single typed upload row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub product_id: String,
    pub product_name: String,
    pub opening_inventory: i64,
    pub procurement: Vec<DayCells>,
    pub sales: Vec<DayCells>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayCells {
    pub qty: i64,
    pub price: Decimal,
}

impl ProductRow {
    /// Reads and validates one worksheet row. `row_number` is the 1-based
    /// spreadsheet row used in error messages.
    /// Prices are rounded to the stored scale.
    pub fn from_cells(
        cells: &[Data],
        schema: &RowSchema,
        row_number: usize,
    ) -> Result<Self, SpreadsheetError> {
        let cell = |idx: usize| cells.get(idx).unwrap_or(&Data::Empty);
        let out_of_range = |column: usize, field: &'static str, limit: i64| {
            SpreadsheetError::OutOfRange {
                row: row_number,
                column: column_letter(column),
                field,
                limit,
            }
        };

        let product_id = cell_text(cell(0)).unwrap_or_default();
        let product_name = cell_text(cell(1)).unwrap_or_else(|| UNKNOWN_PRODUCT.to_string());
        let opening_inventory = int_cell(cell(2));
        if !quantity_in_range(opening_inventory) {
            return Err(out_of_range(2, "opening inventory", MAX_QUANTITY));
        }

        let read_pair = |qty_idx: usize, qty_field: &'static str, price_field: &'static str| {
            let qty = int_cell(cell(qty_idx));
            if qty < 0 {
                return Err(negative(row_number, qty_idx, qty_field));
            }
            if qty > MAX_QUANTITY {
                return Err(out_of_range(qty_idx, qty_field, MAX_QUANTITY));
            }
            let price = decimal_cell(cell(qty_idx + 1));
            if price < Decimal::ZERO {
                return Err(negative(row_number, qty_idx + 1, price_field));
            }
            let price = stored_price(price)
                .ok_or_else(|| out_of_range(qty_idx + 1, price_field, MAX_PRICE))?;
            Ok(DayCells { qty, price })
        };

        let mut procurement = Vec::with_capacity(schema.horizon_days as usize);
        let mut sales = Vec::with_capacity(schema.horizon_days as usize);
        for day in 1..=schema.horizon_days {
            procurement.push(read_pair(
                schema.procurement_qty(day),
                "procurement quantity",
                "procurement price",
            )?);
            sales.push(read_pair(schema.sales_qty(day), "sales quantity", "sales price")?);
        }

        Ok(Self { product_id, product_name, opening_inventory, procurement, sales })
    }

    pub fn into_new_product(self) -> NewProduct {
        let daily_data = self
            .procurement
            .iter()
            .zip(self.sales.iter())
            .zip(1u32..)
            .map(|((p, s), day)| DailyRecord::new(day, p.qty, p.price, s.qty, s.price))
            .collect();

        NewProduct {
            product_id: self.product_id,
            product_name: self.product_name,
            opening_inventory: self.opening_inventory,
            daily_data,
        }
    }
}

/// Parses the first worksheet of an `.xlsx`/`.xls` upload.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn parse_workbook(
    bytes: &[u8],
    schema: &RowSchema,
) -> Result<Vec<NewProduct>, SpreadsheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| SpreadsheetError::Workbook(e.to_string()))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SpreadsheetError::NoWorksheet)?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| SpreadsheetError::Workbook(e.to_string()))?;

    // calamine trims leading empty rows; keep spreadsheet numbering for messages
    let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);
    let products = parse_rows(range.rows(), schema, first_row + 1)?;
    debug!(sheet = %sheet, columns = schema.width(), products = products.len(), "Parsed workbook");
    Ok(products)
}

/// Skips the header row and every row without a product id.
pub fn parse_rows<'a, I>(
    rows: I,
    schema: &RowSchema,
    first_row_number: usize,
) -> Result<Vec<NewProduct>, SpreadsheetError>
where
    I: IntoIterator<Item = &'a [Data]>,
{
    let mut products = Vec::new();
    for (offset, cells) in rows.into_iter().enumerate().skip(1) {
        if cells.first().map(is_falsy).unwrap_or(true) {
            continue;
        }
        let row = ProductRow::from_cells(cells, schema, first_row_number + offset)?;
        products.push(row.into_new_product());
    }

    if products.is_empty() {
        return Err(SpreadsheetError::NoProducts);
    }
    Ok(products)
}

fn negative(row: usize, column: usize, field: &'static str) -> SpreadsheetError {
    SpreadsheetError::Negative { row, column: column_letter(column), field }
}

/// Zero-based column index to spreadsheet letters (`0` -> `A`, `26` -> `AA`).
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn is_falsy(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.is_empty(),
        Data::Int(i) => *i == 0,
        Data::Float(f) => *f == 0.0 || f.is_nan(),
        Data::Bool(b) => !*b,
        _ => false,
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        other => Some(other.to_string()),
    }
}

// Numeric text that is too large to represent saturates, so range checks see it.
fn int_cell(cell: &Data) -> i64 {
    match cell {
        Data::Int(i) => *i,
        Data::Float(f) if f.is_finite() => f.trunc() as i64,
        Data::String(s) => match numeric_prefix(s, false) {
            Some(p) => p
                .parse::<i64>()
                .unwrap_or(if p.starts_with('-') { i64::MIN } else { i64::MAX }),
            None => 0,
        },
        _ => 0,
    }
}

fn decimal_cell(cell: &Data) -> Decimal {
    let saturated = |negative: bool| if negative { Decimal::MIN } else { Decimal::MAX };
    match cell {
        Data::Int(i) => Decimal::from(*i),
        Data::Float(f) if f.is_finite() => Decimal::from_str(&f.to_string())
            .unwrap_or_else(|_| if f.abs() < 1.0 { Decimal::ZERO } else { saturated(*f < 0.0) }),
        Data::String(s) => match numeric_prefix(s, true) {
            Some(p) => Decimal::from_str(&p).unwrap_or_else(|_| saturated(p.starts_with('-'))),
            None => Decimal::ZERO,
        },
        _ => Decimal::ZERO,
    }
}

/// Leading `[+-]digits[.digits]` of a trimmed string, if it has any digits.
fn numeric_prefix(raw: &str, allow_fraction: bool) -> Option<String> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let sign = &s[..end];
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let int_digits = &s[int_start..end];

    let mut frac_digits = "";
    if allow_fraction && end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        frac_digits = &s[frac_start..frac_end];
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let sign = if sign == "-" { "-" } else { "" };
    let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
    Some(if frac_digits.is_empty() {
        format!("{sign}{int_digits}")
    } else {
        format!("{sign}{int_digits}.{frac_digits}")
    })
}
