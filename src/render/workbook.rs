//! Spreadsheet output: fresh workbooks and template merging

use std::fs;
use std::io::Cursor;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::domain::{CellValue, ClassifiedRow, Config};
use crate::error::ClassifyError;
use crate::vocab::OutputLayout;

/// A pre-formatted workbook to append classified rows into.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Template {
    pub fn from_path(path: &Path) -> Result<Self, ClassifyError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes: fs::read(path)? })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// New workbook with a header row.
    Fresh,
    /// Rows appended below a template's header rows.
    Template,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub bytes: Vec<u8>,
    pub mode: MergeMode,
    /// Column labels in written order.
    pub columns: Vec<String>,
    /// Template fallback and facets the template has no column for.
    pub warnings: Vec<String>,
}

pub struct TemplateMerger {
    layout: OutputLayout,
    sheet_name: String,
    /// Rows occupied by headers in a template; data starts right below.
    header_row_count: u32,
    /// 1-based template row holding the column labels.
    label_row: u32,
}

impl TemplateMerger {
    pub fn new(layout: OutputLayout, sheet_name: impl Into<String>, header_row_count: u32, label_row: u32) -> Self {
        Self { layout, sheet_name: sheet_name.into(), header_row_count, label_row: label_row.max(1) }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            OutputLayout::from_config(config),
            config.sheet_name.clone(),
            config.header_row_count,
            config.template_label_row,
        )
    }

    /// Serialize `rows` into workbook bytes, into `template` when given.
    ///
    /// A template that cannot be opened degrades to a fresh workbook with a
    /// warning; only a failure to produce the fresh workbook is an error.
    pub fn write(&self, rows: &[ClassifiedRow], template: Option<&Template>) -> Result<MergeOutcome, ClassifyError> {
        let mut warnings = Vec::new();
        if let Some(template) = template {
            match self.write_template(rows, template) {
                Ok((bytes, layout)) => {
                    tracing::info!(template = %template.name, rows = rows.len(), "merged rows into template");
                    let missing = layout.missing_facets();
                    if !missing.is_empty() {
                        let names: Vec<&str> = missing.iter().map(|facet| facet.column()).collect();
                        let warning = format!(
                            "template '{}' has no column for {}; those facets were not written",
                            template.name,
                            names.join(", ")
                        );
                        tracing::warn!("{warning}");
                        warnings.push(warning);
                    }
                    let columns = layout.headers().into_iter().map(str::to_string).collect();
                    return Ok(MergeOutcome { bytes, mode: MergeMode::Template, columns, warnings });
                }
                Err(err) => {
                    let warning = format!(
                        "template '{}' could not be used ({err}); wrote a new workbook instead",
                        template.name
                    );
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
        }

        let bytes = self.write_fresh(rows)?;
        let columns = self.layout.headers().into_iter().map(str::to_string).collect();
        Ok(MergeOutcome { bytes, mode: MergeMode::Fresh, columns, warnings })
    }

    fn write_fresh(&self, rows: &[ClassifiedRow]) -> Result<Vec<u8>, ClassifyError> {
        let workbook_err = |err: rust_xlsxwriter::XlsxError| ClassifyError::Workbook(err.to_string());

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name).map_err(workbook_err)?;

        let header_format = Format::new().set_bold();
        for (col, header) in self.layout.headers().iter().enumerate() {
            sheet
                .write_string_with_format(0, col as u16, *header, &header_format)
                .map_err(workbook_err)?;
        }

        for (index, row) in rows.iter().enumerate() {
            let r = (index + 1) as u32;
            for (col, cell) in self.layout.render(row).into_iter().enumerate() {
                let col = col as u16;
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(text) => {
                        sheet.write_string(r, col, text).map_err(workbook_err)?;
                    }
                    CellValue::Number(n) => {
                        sheet.write_number(r, col, n).map_err(workbook_err)?;
                    }
                    CellValue::Bool(b) => {
                        sheet.write_boolean(r, col, b).map_err(workbook_err)?;
                    }
                }
            }
        }

        workbook.save_to_buffer().map_err(workbook_err)
    }

    /// Append below the template's header rows, in the template's column
    /// order. Header rows are left untouched.
    fn write_template(&self, rows: &[ClassifiedRow], template: &Template) -> Result<(Vec<u8>, OutputLayout), String> {
        let mut book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(template.bytes.as_slice()), true)
            .map_err(|err| err.to_string())?;
        let sheet = book.get_sheet_mut(&0).ok_or_else(|| "template has no worksheets".to_string())?;

        let mut labels: Vec<String> = (1..=sheet.get_highest_column())
            .map(|col| sheet.get_value((col, self.label_row)).trim().to_string())
            .collect();
        while labels.last().is_some_and(|label| label.is_empty()) {
            labels.pop();
        }
        let layout = if labels.is_empty() {
            tracing::warn!(template = %template.name, "template has no column labels, using the default column order");
            self.layout.clone()
        } else {
            self.layout.with_headers(&labels)
        };

        for (index, row) in rows.iter().enumerate() {
            let r = self.header_row_count + 1 + index as u32;
            for (col, cell) in layout.render(row).into_iter().enumerate() {
                let coordinate = (col as u32 + 1, r);
                match cell {
                    CellValue::Empty => {}
                    CellValue::Text(text) => {
                        sheet.get_cell_mut(coordinate).set_value_string(text);
                    }
                    CellValue::Number(n) => {
                        sheet.get_cell_mut(coordinate).set_value_number(n);
                    }
                    CellValue::Bool(b) => {
                        sheet.get_cell_mut(coordinate).set_value_bool(b);
                    }
                }
            }
        }

        let mut buffer = Cursor::new(Vec::new());
        umya_spreadsheet::writer::xlsx::write_writer(&book, &mut buffer).map_err(|err| err.to_string())?;
        Ok((buffer.into_inner(), layout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Facet, Row};
    use crate::pipeline::RowClassificationPipeline;
    use crate::vocab::DEFAULT_OUTPUT_HEADERS;
    use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};

    fn classified_rows() -> Vec<ClassifiedRow> {
        let rows = vec![
            Row::from_pairs([
                ("id_hecho", CellValue::Number(101.0)),
                ("calle", CellValue::from("Mitre")),
                ("relato", CellValue::from("Robo a mano armada con arma de fuego en comercio")),
            ]),
            Row::from_pairs([
                ("id_hecho", CellValue::Number(102.0)),
                ("calle", CellValue::from("Belgrano")),
                ("relato", CellValue::from("")),
            ]),
        ];
        RowClassificationPipeline::from_config(&Config::default())
            .expect("pipeline")
            .run(&rows)
            .expect("run")
            .rows
    }

    fn first_sheet(bytes: &[u8]) -> (String, Range<Data>) {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).expect("open output");
        let name = workbook.sheet_names()[0].clone();
        let range = workbook.worksheet_range(&name).expect("range");
        (name, range)
    }

    fn text(range: &Range<Data>, row: u32, col: u32) -> String {
        range.get_value((row, col)).map(|v| v.to_string()).unwrap_or_default()
    }

    fn template(rows: &[&[&str]]) -> Template {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let bold = Format::new().set_bold();
        for (r, cells) in rows.iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                sheet.write_string_with_format(r as u32, c as u16, *value, &bold).expect("write");
            }
        }
        Template { name: "plantilla.xlsx".to_string(), bytes: workbook.save_to_buffer().expect("save") }
    }

    #[test]
    fn fresh_workbook_has_header_row_in_configured_order() {
        let merger = TemplateMerger::from_config(&Config::default());
        let outcome = merger.write(&classified_rows(), None).expect("write");
        assert_eq!(outcome.mode, MergeMode::Fresh);
        assert!(outcome.warnings.is_empty());

        let (name, range) = first_sheet(&outcome.bytes);
        assert_eq!(name, "Clasificado Legal Local");
        let headers: Vec<String> = (0..DEFAULT_OUTPUT_HEADERS.len() as u32).map(|c| text(&range, 0, c)).collect();
        similar_asserts::assert_eq!(headers, DEFAULT_OUTPUT_HEADERS);
        assert_eq!(outcome.columns, DEFAULT_OUTPUT_HEADERS);

        let col = |label: &str| DEFAULT_OUTPUT_HEADERS.iter().position(|h| *h == label).expect("column") as u32;
        assert_eq!(text(&range, 1, col("id_hecho")), "101");
        assert_eq!(text(&range, 1, col("calle")), "Mitre");
        assert_eq!(text(&range, 1, col("CALIFICACIÓN")), "ROBO");
        assert_eq!(text(&range, 1, col("ARMAS")), "FUEGO");
        assert_eq!(text(&range, 2, col("CALIFICACIÓN")), "NINGUNO DE INTERÉS");
        assert_eq!(text(&range, 2, col("calle")), "Belgrano");
    }

    #[test]
    fn template_rows_land_below_headers_in_template_order() {
        let template = template(&[
            &["CALIFICACIÓN", "id_hecho", "relato", "ARMAS"],
            &["Seleccione", "Número", "Texto libre", "Seleccione"],
        ]);
        let merger = TemplateMerger::from_config(&Config::default());
        let outcome = merger.write(&classified_rows(), Some(&template)).expect("write");

        assert_eq!(outcome.mode, MergeMode::Template);
        assert_eq!(outcome.columns, vec!["CALIFICACIÓN", "id_hecho", "relato", "ARMAS"]);

        let (_, range) = first_sheet(&outcome.bytes);
        // Header rows untouched.
        assert_eq!(text(&range, 0, 0), "CALIFICACIÓN");
        assert_eq!(text(&range, 1, 0), "Seleccione");
        assert_eq!(text(&range, 1, 2), "Texto libre");
        // Input row N at header_row_count + N (1-based), i.e. index 2 and 3.
        assert_eq!(text(&range, 2, 0), "ROBO");
        assert_eq!(text(&range, 2, 1), "101");
        assert_eq!(text(&range, 2, 2), "Robo a mano armada con arma de fuego en comercio");
        assert_eq!(text(&range, 2, 3), "FUEGO");
        assert_eq!(text(&range, 3, 0), "NINGUNO DE INTERÉS");
        assert_eq!(text(&range, 3, 1), "102");

        // Header styling survives the merge; data cells are written unstyled.
        let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(outcome.bytes.as_slice()), true)
            .expect("reopen output");
        let sheet = book.get_sheet(&0).expect("sheet");
        let bold = |coordinate: (u32, u32)| sheet.get_style(coordinate).get_font().is_some_and(|f| *f.get_bold());
        assert!(bold((1, 1)));
        assert!(bold((4, 1)));
        assert!(bold((3, 2)));
        assert!(!bold((1, 3)));
    }

    #[test]
    fn template_without_facet_columns_is_reported() {
        let template = template(&[&["id_hecho", "CALIFICACIÓN", "ARMAS", "LUGAR"]]);
        let merger = TemplateMerger::from_config(&Config::default());
        let outcome = merger.write(&classified_rows(), Some(&template)).expect("write");

        assert_eq!(outcome.mode, MergeMode::Template);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("plantilla.xlsx"));
        assert!(outcome.warnings[0].contains("MODALIDAD"));
        assert!(!outcome.warnings[0].contains("CALIFICACIÓN"));
    }

    #[test]
    fn unreadable_template_falls_back_with_warning() {
        let broken = Template { name: "roto.xlsx".to_string(), bytes: b"PK garbage".to_vec() };
        let merger = TemplateMerger::from_config(&Config::default());
        let outcome = merger.write(&classified_rows(), Some(&broken)).expect("fallback write");

        assert_eq!(outcome.mode, MergeMode::Fresh);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("roto.xlsx"));
        let (_, range) = first_sheet(&outcome.bytes);
        assert_eq!(text(&range, 0, 0), "id_hecho");
    }

    #[test]
    fn every_row_has_the_same_columns() {
        let merger = TemplateMerger::from_config(&Config::default());
        let layout = OutputLayout::from_config(&Config::default());
        for row in classified_rows() {
            assert_eq!(layout.render(&row).len(), merger.layout.len());
        }
        assert_eq!(classified_rows()[0].classification.get(Facet::Place), "COMERCIO");
    }
}
