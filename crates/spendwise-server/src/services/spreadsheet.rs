use rust_xlsxwriter::{Workbook, XlsxError};

/// One exported record: label column (source or category), amount, date.
pub struct SheetRow {
    pub label: String,
    pub amount: f64,
    pub date: String,
}

/// Builds a single-sheet xlsx workbook in memory: a header row followed by
/// one row per record.
pub fn build_workbook(
    sheet_name: &str,
    label_header: &str,
    rows: &[SheetRow],
) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    worksheet.write_string(0, 0, label_header)?;
    worksheet.write_string(0, 1, "Amount")?;
    worksheet.write_string(0, 2, "Date")?;

    for (i, row) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        worksheet.write_string(r, 0, &row.label)?;
        worksheet.write_number(r, 1, row.amount)?;
        worksheet.write_string(r, 2, &row.date)?;
    }

    workbook.save_to_buffer()
}

/// Projects a stored timestamp to its YYYY-MM-DD prefix for export.
pub fn date_only(timestamp: &str) -> String {
    timestamp
        .split('T')
        .next()
        .unwrap_or(timestamp)
        .to_string()
}
