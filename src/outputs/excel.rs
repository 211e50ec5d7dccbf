//! Spreadsheet output.
//!
//! Results are persisted in batches. Each batch opens the workbook (or
//! creates it with a header row), appends one row per item and saves. No
//! state is kept between batches, so the file on disk is always the source
//! of truth and a crash loses at most the batch being written.
//!
//! # Layout
//!
//! | A | B | C | D | E | F |
//! |---|---|---|---|---|---|
//! | Title | Date | Description | Picture Filename | Count of Search Phrases | Contains Money |

use crate::error::SinkError;
use crate::models::NewsItem;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use umya_spreadsheet::{Spreadsheet, Worksheet};

pub const HEADERS: [&str; 6] = [
    "Title",
    "Date",
    "Description",
    "Picture Filename",
    "Count of Search Phrases",
    "Contains Money",
];

/// Destination for finished search results.
pub trait ResultSink {
    /// Persist `items` after every row already stored.
    fn append_rows(&mut self, items: &[NewsItem]) -> Result<(), SinkError>;
}

/// [`ResultSink`] writing an `.xlsx` workbook.
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
    worksheet: String,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>, worksheet: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            worksheet: worksheet.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, message: impl ToString) -> SinkError {
        SinkError::Workbook {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }

    fn open_or_create(&self) -> Result<Spreadsheet, SinkError> {
        if self.path.exists() {
            umya_spreadsheet::reader::xlsx::read(&self.path).map_err(|e| self.error(e))
        } else {
            Ok(umya_spreadsheet::new_file_empty_worksheet())
        }
    }
}

impl ResultSink for XlsxSink {
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), rows = items.len()))]
    fn append_rows(&mut self, items: &[NewsItem]) -> Result<(), SinkError> {
        let mut book = self.open_or_create()?;

        if book.get_sheet_by_name(&self.worksheet).is_none() {
            let sheet = book
                .new_sheet(self.worksheet.clone())
                .map_err(|e| self.error(e))?;
            write_header(sheet);
        }
        let sheet = book
            .get_sheet_by_name_mut(&self.worksheet)
            .ok_or_else(|| self.error(format!("worksheet `{}` missing", self.worksheet)))?;

        let first = sheet.get_highest_row() + 1;
        for (row, item) in (first..).zip(items) {
            write_item(sheet, row, item);
        }

        umya_spreadsheet::writer::xlsx::write(&book, &self.path).map_err(|e| self.error(e))?;
        info!(first_row = first, "Appended rows to workbook");
        Ok(())
    }
}

fn write_header(sheet: &mut Worksheet) {
    for (col, title) in (1u32..).zip(HEADERS) {
        sheet.get_cell_mut((col, 1)).set_value(title);
    }
}

fn write_item(sheet: &mut Worksheet, row: u32, item: &NewsItem) {
    sheet.get_cell_mut((1, row)).set_value_string(item.title.as_str());
    sheet.get_cell_mut((2, row)).set_value_string(item.published_raw.as_str());
    sheet.get_cell_mut((3, row)).set_value_string(item.description.as_str());
    sheet.get_cell_mut((4, row)).set_value_string(item.image_filename.as_str());
    sheet
        .get_cell_mut((5, row))
        .set_value_number(item.phrase_count as f64);
    sheet.get_cell_mut((6, row)).set_value_bool(item.contains_money);
}
