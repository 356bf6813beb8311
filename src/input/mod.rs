//! Reading input workbooks into rows

use std::fs;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};

use crate::domain::{CellValue, Row};
use crate::error::ClassifyError;
use crate::pipeline::FIRST_DATA_ROW;

/// First sheet of an input workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSheet {
    pub sheet_name: String,
    pub headers: Vec<String>,
    /// Data rows below the header row. Interior blank rows are kept so row
    /// numbers stay aligned with the source; trailing blank rows are dropped.
    pub rows: Vec<Row>,
    /// 1-based sheet row of `rows[0]`. The used range starts at the first
    /// non-empty cell, so blank leading rows push this past row 2.
    pub first_data_row: usize,
}

pub fn read_workbook(path: &Path) -> Result<InputSheet, ClassifyError> {
    read_workbook_bytes(fs::read(path)?)
}

pub fn read_workbook_bytes(bytes: Vec<u8>) -> Result<InputSheet, ClassifyError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|err| ClassifyError::Workbook(format!("unable to open spreadsheet: {err}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ClassifyError::Workbook("the workbook has no worksheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|err| ClassifyError::Workbook(format!("unable to read sheet '{sheet_name}': {err}")))?;

    let mut rows_iter = range.rows();
    let Some(header_row) = rows_iter.next() else {
        return Ok(InputSheet {
            sheet_name,
            headers: Vec::new(),
            rows: Vec::new(),
            first_data_row: FIRST_DATA_ROW,
        });
    };
    let first_data_row = range.start().map_or(FIRST_DATA_ROW, |(row, _)| row as usize + 2);
    let headers: Vec<String> = header_row.iter().map(|cell| cell.to_string().trim().to_string()).collect();

    let mut rows: Vec<Row> = rows_iter
        .map(|cells| {
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(cells) {
                // Unlabeled columns cannot be addressed by name.
                if header.is_empty() {
                    continue;
                }
                row.insert(header.as_str(), cell_value(cell));
            }
            row
        })
        .collect();
    while rows.last().is_some_and(Row::is_blank) {
        rows.pop();
    }

    tracing::debug!(
        sheet = %sheet_name,
        columns = headers.len(),
        rows = rows.len(),
        first_data_row,
        "read input sheet"
    );
    Ok(InputSheet { sheet_name, headers, rows, first_data_row })
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        // Dates stay as spreadsheet serial numbers.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(text) | Data::DurationIso(text) => CellValue::Text(text.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook(rows: &[&[&str]]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, cells) in rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                if !value.is_empty() {
                    sheet.write_string(r as u32, c as u16, *value).expect("write");
                }
            }
        }
        sheet.write_number(1, 3, 42.0).expect("write number");
        workbook.save_to_buffer().expect("save")
    }

    #[test]
    fn reads_headers_and_rows_of_first_sheet() {
        let bytes = workbook(&[
            &["id_hecho", "relato", "calle", "altura"],
            &["A1", "robo en comercio", "Mitre", ""],
            &["A2", "", "", ""],
            &["A3", "hurto de celular", "", ""],
        ]);
        let sheet = read_workbook_bytes(bytes).expect("read");

        assert_eq!(sheet.headers, vec!["id_hecho", "relato", "calle", "altura"]);
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0].get("relato"), Some(&CellValue::from("robo en comercio")));
        assert_eq!(sheet.rows[0].get("altura"), Some(&CellValue::Number(42.0)));
        assert_eq!(sheet.rows[2].get("relato"), Some(&CellValue::from("hurto de celular")));
        assert_eq!(sheet.first_data_row, 2);
    }

    #[test]
    fn blank_leading_rows_shift_the_first_data_row() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(1, 0, "relato").expect("header");
        sheet.write_string(2, 0, "robo en comercio").expect("data");
        let bytes = workbook.save_to_buffer().expect("save");

        let sheet = read_workbook_bytes(bytes).expect("read");
        assert_eq!(sheet.headers, vec!["relato"]);
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.first_data_row, 3);
    }

    #[test]
    fn trailing_blank_rows_are_dropped() {
        let bytes = workbook(&[&["relato", "x", "y"], &["uno", "", ""], &["", "", ""], &["", "", ""]]);
        let sheet = read_workbook_bytes(bytes).expect("read");
        // The number written at (1, 3) falls in an unlabeled column.
        assert_eq!(sheet.rows.len(), 1);
        assert_eq!(sheet.rows[0].columns().collect::<Vec<_>>(), vec!["relato", "x", "y"]);
    }

    #[test]
    fn garbage_is_a_workbook_error() {
        let err = read_workbook_bytes(b"not a spreadsheet".to_vec()).expect_err("garbage");
        assert!(matches!(err, ClassifyError::Workbook(_)));
    }
}
