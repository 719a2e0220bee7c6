//! Spreadsheet row layout used when mirroring records to a remote sheet.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{budget::BudgetFormData, record::BudgetRecord};

/// Column headers, in column order (A through K).
pub const SHEET_HEADERS: [&str; 11] = [
    "ID",
    "Name",
    "Total Budget",
    "Medical",
    "Salaries",
    "Car Rental",
    "Other",
    "Remaining",
    "Created At",
    "Updated At",
    "User ID",
];

/// Encodes a record as one sheet row.
pub fn sheet_row(record: &BudgetRecord) -> Vec<String> {
    vec![
        record.id.clone(),
        record.name.clone(),
        record.form.total_budget.to_string(),
        record.form.medical_expenses.to_string(),
        record.form.salaries.to_string(),
        record.form.car_rental.to_string(),
        record.form.other_expenses.to_string(),
        record.remaining.to_string(),
        record.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        record.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        record.user_id.clone(),
    ]
}

/// Decodes a sheet row. Amounts that do not parse read as zero; rows without
/// an id or with unreadable timestamps are rejected.
pub fn record_from_sheet_row(row: &[String]) -> Option<BudgetRecord> {
    let id = row.first().map(|cell| cell.trim()).filter(|id| !id.is_empty())?;
    let amount = |index: usize| {
        row.get(index)
            .and_then(|cell| cell.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
    };
    let timestamp = |index: usize| {
        row.get(index)
            .and_then(|cell| DateTime::parse_from_rfc3339(cell.trim()).ok())
            .map(|parsed| parsed.with_timezone(&Utc))
    };
    Some(BudgetRecord {
        id: id.to_string(),
        name: row.get(1).cloned().unwrap_or_default(),
        form: BudgetFormData::new(amount(2), amount(3), amount(4), amount(5), amount(6)),
        remaining: amount(7),
        created_at: timestamp(8)?,
        updated_at: timestamp(9)?,
        user_id: row.get(10).cloned().unwrap_or_default(),
    })
}
