use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};

use crate::domain::{AppError, ExportFormat, Result};

use super::{ExportDocument, ExportWriter};

/// Excel workbook with one row per message.
pub struct SpreadsheetWriter;

const HEADERS: [&str; 5] = ["Time", "Sender", "Direction", "Type", "Content"];
const WIDTHS: [f64; 5] = [20.0, 24.0, 10.0, 8.0, 80.0];

impl ExportWriter for SpreadsheetWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Spreadsheet
    }

    fn render(&self, doc: &ExportDocument<'_>) -> Result<Vec<u8>> {
        let rows = doc.messages.iter().map(|m| {
            vec![
                doc.time_of(m),
                doc.sender_of(m).to_string(),
                ExportDocument::direction_of(m).to_string(),
                m.kind.label().to_string(),
                m.display_text().to_string(),
            ]
        });
        workbook_bytes("Messages", &HEADERS, &WIDTHS, rows)
    }
}

/// Longest string Excel accepts in one cell.
const MAX_CELL_CHARS: usize = 32_767;
/// Data rows per worksheet; row 0 holds the header.
const MAX_DATA_ROWS: usize = 1_048_575;

/// Workbook with a bold header row, encoded to bytes. Rows beyond one
/// worksheet's capacity continue on `"<name> 2"`, `"<name> 3"` and so on.
///
/// # Errors
/// Returns a write error if the encoder rejects the data (e.g. a bad sheet name).
pub fn workbook_bytes<I>(
    sheet_name: &str,
    headers: &[&str],
    widths: &[f64],
    rows: I,
) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut workbook = build_workbook(sheet_name, headers, widths, rows, MAX_DATA_ROWS)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook<I>(
    sheet_name: &str,
    headers: &[&str],
    widths: &[f64],
    rows: I,
    rows_per_sheet: usize,
) -> Result<Workbook>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let mut sheet = new_sheet(sheet_name, 1, headers, widths, &bold)?;
    let mut sheet_rows = 0;

    for cells in rows {
        if sheet_rows == rows_per_sheet {
            let number = workbook.worksheets().len() + 2;
            let full = std::mem::replace(
                &mut sheet,
                new_sheet(sheet_name, number, headers, widths, &bold)?,
            );
            workbook.push_worksheet(full);
            sheet_rows = 0;
        }

        sheet_rows += 1;
        let row = RowNum::try_from(sheet_rows)
            .map_err(|_| AppError::write("too many rows for a worksheet"))?;
        for (col, cell) in (0..).zip(cells) {
            let col: ColNum = col;
            sheet.write_string(row, col, fit_cell(cell))?;
        }
    }

    workbook.push_worksheet(sheet);
    Ok(workbook)
}

fn new_sheet(
    base_name: &str,
    number: usize,
    headers: &[&str],
    widths: &[f64],
    bold: &Format,
) -> Result<Worksheet> {
    let mut sheet = Worksheet::new();
    if number == 1 {
        sheet.set_name(base_name)?;
    } else {
        sheet.set_name(format!("{base_name} {number}"))?;
    }

    for (col, (header, width)) in (0..).zip(headers.iter().zip(widths)) {
        let col: ColNum = col;
        sheet.write_string_with_format(0, col, *header, bold)?;
        sheet.set_column_width(col, *width)?;
    }
    Ok(sheet)
}

/// Cuts text to the cell limit on a char boundary, marking the cut.
fn fit_cell(cell: String) -> String {
    match cell.char_indices().nth(MAX_CELL_CHARS - 1) {
        Some((cut, _)) if cell[cut..].chars().nth(1).is_some() => {
            let mut fitted = cell[..cut].to_string();
            fitted.push('…');
            fitted
        }
        _ => cell,
    }
}
