//! Spreadsheet boundary: bulk import of contracts from an uploaded xlsx
//! workbook and export of the dashboard listing as an xlsx attachment.

use std::io::Cursor;

use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::header,
    response::IntoResponse,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDate;
use entity::contract;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use tracing::info;

use crate::{
    auth::require_session,
    contracts::{ContractInput, ListQuery, build_list_query, upsert_by_id_number},
    error::{ApiError, ApiResult},
    state::AppState,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Column order shared by export and the import header matcher.
pub const SHEET_COLUMNS: [&str; 13] = [
    "First name",
    "Last name",
    "ID number",
    "Address",
    "Contract number",
    "Rent",
    "Equipment",
    "Deposit",
    "Internet",
    "Canon",
    "Status",
    "Start date",
    "End date",
];

fn status_label(status: contract::Status) -> &'static str {
    match status {
        contract::Status::Active => "ACTIVE",
        contract::Status::Ended => "ENDED",
    }
}

/// Render contracts as a workbook. Money cells hold whole currency units
/// (cents / 100), the way the legacy spreadsheets were kept.
pub fn write_workbook(rows: &[contract::Model]) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Contracts")?;
    for (col, title) in SHEET_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, &bold)?;
    }
    for (i, model) in rows.iter().enumerate() {
        let r = (i + 1) as u32;
        sheet.write_string(r, 0, &model.first_name)?;
        sheet.write_string(r, 1, &model.last_name)?;
        sheet.write_string(r, 2, &model.id_number)?;
        sheet.write_string(r, 3, &model.address)?;
        sheet.write_string(r, 4, model.contract_number.as_deref().unwrap_or(""))?;
        sheet.write_number(r, 5, model.rent_cents as f64 / 100.0)?;
        sheet.write_number(r, 6, model.equipment_cents as f64 / 100.0)?;
        sheet.write_number(r, 7, model.deposit_cents as f64 / 100.0)?;
        sheet.write_number(r, 8, model.internet_cents as f64 / 100.0)?;
        sheet.write_number(r, 9, model.canon_cents as f64 / 100.0)?;
        sheet.write_string(r, 10, status_label(model.status))?;
        sheet.write_string(r, 11, model.start_date.to_string())?;
        sheet.write_string(
            r,
            12,
            model.end_date.map(|d| d.to_string()).unwrap_or_default(),
        )?;
    }
    workbook.save_to_buffer()
}

/// Parsed import rows; errors carry the 1-based spreadsheet row number.
pub fn parse_workbook(bytes: &[u8]) -> ApiResult<Vec<Result<ContractInput, String>>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| ApiError::invalid(format!("not a valid xlsx workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ApiError::invalid("workbook has no worksheets"))?
        .map_err(|e| ApiError::invalid(format!("failed to read worksheet: {e}")))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| ApiError::invalid("workbook is empty"))?;
    let columns = HeaderMap::from_row(header)?;

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        // +2: one for the header, one for 1-based numbering.
        let line = i + 2;
        if row.iter().all(is_blank) {
            continue;
        }
        out.push(columns.parse_row(row).map_err(|msg| format!("row {line}: {msg}")));
    }
    Ok(out)
}

struct HeaderMap {
    first_name: usize,
    last_name: usize,
    id_number: usize,
    address: Option<usize>,
    contract_number: Option<usize>,
    rent: Option<usize>,
    equipment: Option<usize>,
    deposit: Option<usize>,
    internet: Option<usize>,
    canon: Option<usize>,
    status: Option<usize>,
    start_date: usize,
    end_date: Option<usize>,
}

impl HeaderMap {
    fn from_row(header: &[Data]) -> ApiResult<Self> {
        let find = |title: &str| {
            header.iter().position(|cell| {
                matches!(cell, Data::String(s) if s.trim().eq_ignore_ascii_case(title))
            })
        };
        let required = |title: &str| {
            find(title).ok_or_else(|| {
                ApiError::invalid(format!("workbook is missing the '{title}' column"))
            })
        };
        Ok(Self {
            first_name: required("First name")?,
            last_name: required("Last name")?,
            id_number: required("ID number")?,
            address: find("Address"),
            contract_number: find("Contract number"),
            rent: find("Rent"),
            equipment: find("Equipment"),
            deposit: find("Deposit"),
            internet: find("Internet"),
            canon: find("Canon"),
            status: find("Status"),
            start_date: required("Start date")?,
            end_date: find("End date"),
        })
    }

    fn parse_row(&self, row: &[Data]) -> Result<ContractInput, String> {
        let first_name =
            cell_string(row, Some(self.first_name)).ok_or("missing first name")?;
        let last_name = cell_string(row, Some(self.last_name)).unwrap_or_default();
        let id_number = cell_string(row, Some(self.id_number)).ok_or("missing id number")?;
        let start_date =
            cell_date(row, Some(self.start_date))?.ok_or("missing start date")?;
        let status = match cell_string(row, self.status).as_deref() {
            None => None,
            Some(s) if s.eq_ignore_ascii_case("active") => {
                Some(crate::contracts::ContractStatus::Active)
            }
            Some(s) if s.eq_ignore_ascii_case("ended") => {
                Some(crate::contracts::ContractStatus::Ended)
            }
            Some(other) => return Err(format!("unknown status '{other}'")),
        };
        Ok(ContractInput {
            first_name,
            last_name,
            id_number,
            address: cell_string(row, self.address),
            contract_number: cell_string(row, self.contract_number),
            rent_cents: cell_cents(row, self.rent)?,
            equipment_cents: cell_cents(row, self.equipment)?,
            deposit_cents: cell_cents(row, self.deposit)?,
            internet_cents: cell_cents(row, self.internet)?,
            canon_cents: cell_cents(row, self.canon)?,
            status,
            start_date,
            end_date: cell_date(row, self.end_date)?,
        })
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn cell_string(row: &[Data], idx: Option<usize>) -> Option<String> {
    let cell = row.get(idx?)?;
    let text = match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format!("{f}"),
        Data::Int(i) => format!("{i}"),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn cell_cents(row: &[Data], idx: Option<usize>) -> Result<i64, String> {
    let Some(cell) = idx.and_then(|i| row.get(i)) else {
        return Ok(0);
    };
    let units = match cell {
        Data::Empty => return Ok(0),
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) if s.trim().is_empty() => return Ok(0),
        Data::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", s.trim()))?,
        other => return Err(format!("'{other}' is not a number")),
    };
    Ok((units * 100.0).round() as i64)
}

fn cell_date(row: &[Data], idx: Option<usize>) -> Result<Option<NaiveDate>, String> {
    let Some(cell) = idx.and_then(|i| row.get(i)) else {
        return Ok(None);
    };
    match cell {
        Data::Empty => Ok(None),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::String(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| format!("'{}' is not a YYYY-MM-DD date", s.trim())),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| Some(d.date()))
            .ok_or_else(|| "unreadable date cell".to_string()),
        other => Err(format!("'{other}' is not a date")),
    }
}

#[derive(Serialize, Default)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

pub async fn import_contracts(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    mut multipart: Multipart,
) -> ApiResult<Json<ImportReport>> {
    require_session(&state, &jar).await?;

    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid(format!("malformed multipart body: {e}")))?
    {
        let named_file = field.name() == Some("file");
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::invalid(format!("failed to read upload: {e}")))?;
        if named_file {
            data = Some(bytes);
            break;
        }
        data.get_or_insert(bytes);
    }
    let data = data.ok_or_else(|| ApiError::invalid("no file in upload"))?;

    let mut report = ImportReport::default();
    for parsed in parse_workbook(&data)? {
        let input = match parsed {
            Ok(input) => input,
            Err(msg) => {
                report.skipped += 1;
                report.errors.push(msg);
                continue;
            }
        };
        match upsert_by_id_number(&state.pool, input).await {
            Ok((_, true)) => report.created += 1,
            Ok((_, false)) => report.updated += 1,
            Err(ApiError::InvalidInput(msg)) => {
                report.skipped += 1;
                report.errors.push(msg);
            }
            Err(other) => return Err(other),
        }
    }
    info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        "contract import finished"
    );
    Ok(Json(report))
}

pub async fn export_contracts(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<ListQuery>,
) -> ApiResult<impl IntoResponse> {
    require_session(&state, &jar).await?;
    let rows = build_list_query(&params)?.all(&state.pool).await?;
    let bytes = write_workbook(&rows)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("failed to build workbook: {e}")))?;
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_MIME),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"contracts.xlsx\"",
            ),
        ],
        bytes,
    ))
}
