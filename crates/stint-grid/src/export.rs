//! XLSX rendering of an [`AvailabilityMatrix`].
//!
//! Layout:
//!
//! ```text
//! | Race Time | GMT   | Sim Time | Alice Local | Alice Availability | ...
//! |-----------|-------|----------|-------------|--------------------|
//! | 0         | 14:30 | 09:00    | 09:30       | Tentative          |
//! ```
//!
//! The `Sim Time` column is present only when the matrix has one. Every
//! availability cell carries a dropdown restricted to [`Availability::ALL`].

use std::path::Path;

use rust_xlsxwriter::{
    ColNum, DataValidation, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet,
    XlsxError,
};

use crate::error::{GridError, Result};
use crate::matrix::{Availability, AvailabilityMatrix};

const DEFAULT_SHEET_NAME: &str = "Driver Availability";

#[derive(Clone, Debug)]
pub struct SpreadsheetExporter {
    pub sheet_name: String,
}

impl Default for SpreadsheetExporter {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

struct SheetFormats {
    header: Format,
    cell: Format,
    availability: Format,
}

/// A cell value tagged with the format it is written in.
#[derive(Debug, Clone, PartialEq)]
enum SheetCell {
    Hours(i64),
    Clock(String),
    Status(Availability),
}

/// Sheet contents as plain values, laid out before anything is written.
#[derive(Debug, Clone, PartialEq)]
struct SheetLayout {
    headers: Vec<String>,
    rows: Vec<Vec<SheetCell>>,
    /// Columns that get the availability dropdown.
    status_columns: Vec<ColNum>,
}

impl SheetLayout {
    fn from_matrix(matrix: &AvailabilityMatrix) -> Result<Self> {
        let mut headers = vec!["Race Time".to_string(), "GMT".to_string()];
        if matrix.has_sim_time {
            headers.push("Sim Time".to_string());
        }

        let mut status_columns = Vec::with_capacity(matrix.drivers.len());
        for driver in &matrix.drivers {
            headers.push(format!("{} Local", driver.name));
            headers.push(format!("{} Availability", driver.name));
            status_columns.push(column(headers.len() - 1)?);
        }

        let rows = matrix
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    SheetCell::Hours(row.elapsed_hours),
                    SheetCell::Clock(row.gmt_label.clone()),
                ];
                if matrix.has_sim_time {
                    cells.push(SheetCell::Clock(row.sim_label.clone().unwrap_or_default()));
                }
                for cell in &row.cells {
                    cells.push(SheetCell::Clock(cell.local_time.clone()));
                    cells.push(SheetCell::Status(cell.availability));
                }
                cells
            })
            .collect();

        Ok(SheetLayout {
            headers,
            rows,
            status_columns,
        })
    }

    /// `(first_row, col, last_row, col)` for each dropdown, covering every data row.
    fn dropdown_ranges(&self) -> Result<Vec<(RowNum, ColNum, RowNum, ColNum)>> {
        let Some(last) = self.rows.len().checked_sub(1) else {
            return Ok(Vec::new());
        };
        let last_row = data_row(last)?;
        Ok(self
            .status_columns
            .iter()
            .map(|&col| (1, col, last_row, col))
            .collect())
    }
}

impl SpreadsheetExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worksheet name
    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = name.into();
        self
    }

    /// Render the workbook to bytes.
    pub fn write_to_buffer(&self, matrix: &AvailabilityMatrix) -> Result<Vec<u8>> {
        let mut workbook = self.render(matrix)?;
        workbook.save_to_buffer().map_err(export_error)
    }

    /// Render the workbook and write it to `path`.
    pub fn save(&self, matrix: &AvailabilityMatrix, path: &Path) -> Result<()> {
        let mut workbook = self.render(matrix)?;
        workbook.save(path).map_err(export_error)?;
        tracing::debug!(path = %path.display(), rows = matrix.rows.len(), "saved availability sheet");
        Ok(())
    }

    fn render(&self, matrix: &AvailabilityMatrix) -> Result<Workbook> {
        let layout = SheetLayout::from_matrix(matrix)?;
        let mut workbook = Workbook::new();
        let formats = Self::create_formats();
        let sheet = workbook.add_worksheet();
        sheet.set_name(&self.sheet_name).map_err(export_error)?;

        Self::write_cells(sheet, &layout, &formats)?;
        Self::add_availability_dropdowns(sheet, &layout)?;

        sheet.set_freeze_panes(1, 0).map_err(export_error)?;
        sheet.autofit();
        Ok(workbook)
    }

    fn create_formats() -> SheetFormats {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_text_wrap()
            .set_border(FormatBorder::Thin);

        let cell = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin);

        let availability = Format::new()
            .set_align(FormatAlign::Left)
            .set_align(FormatAlign::Top)
            .set_border(FormatBorder::Thin);

        SheetFormats {
            header,
            cell,
            availability,
        }
    }

    fn write_cells(
        sheet: &mut Worksheet,
        layout: &SheetLayout,
        formats: &SheetFormats,
    ) -> Result<()> {
        for (index, header) in layout.headers.iter().enumerate() {
            sheet
                .write_string_with_format(0, column(index)?, header, &formats.header)
                .map_err(export_error)?;
        }

        for (index, cells) in layout.rows.iter().enumerate() {
            let r = data_row(index)?;
            for (col, cell) in cells.iter().enumerate() {
                let c = column(col)?;
                match cell {
                    SheetCell::Hours(hours) => {
                        sheet.write_number_with_format(r, c, *hours as f64, &formats.cell)
                    }
                    SheetCell::Clock(text) => {
                        sheet.write_string_with_format(r, c, text, &formats.cell)
                    }
                    SheetCell::Status(status) => {
                        sheet.write_string_with_format(r, c, status.as_str(), &formats.availability)
                    }
                }
                .map_err(export_error)?;
            }
        }
        Ok(())
    }

    fn add_availability_dropdowns(sheet: &mut Worksheet, layout: &SheetLayout) -> Result<()> {
        let ranges = layout.dropdown_ranges()?;
        if ranges.is_empty() {
            return Ok(());
        }
        let validation = DataValidation::new()
            .allow_list_strings(&dropdown_options())
            .map_err(export_error)?;
        for (first_row, first_col, last_row, last_col) in ranges {
            sheet
                .add_data_validation(first_row, first_col, last_row, last_col, &validation)
                .map_err(export_error)?;
        }
        Ok(())
    }
}

fn dropdown_options() -> [&'static str; 5] {
    Availability::ALL.map(|status| status.as_str())
}

fn column(index: usize) -> Result<ColNum> {
    ColNum::try_from(index)
        .map_err(|_| GridError::Export(format!("too many columns for one sheet ({index})")))
}

fn data_row(index: usize) -> Result<RowNum> {
    index
        .checked_add(1)
        .and_then(|row| RowNum::try_from(row).ok())
        .ok_or_else(|| GridError::Export(format!("too many rows for one sheet ({index})")))
}

fn export_error(e: XlsxError) -> GridError {
    GridError::Export(e.to_string())
}
