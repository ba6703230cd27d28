// 📒 Workbook Readers - named sheets of string cells
//
// Two containers are supported:
// - Spreadsheet files (xlsx / xlsm / xlsb / xls / ods) via calamine
// - A directory of CSV files, one per sheet: `<sheet name>.csv`
//
// Both produce the same in-memory `Workbook`, so the engine never knows
// which container the data came from.

use crate::error::{IngestError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

// ============================================================================
// CORE TYPES
// ============================================================================

/// One sheet: a header row plus data rows, every cell as text
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Sheet {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Position of a column by header title (surrounding whitespace ignored)
    pub fn column_index(&self, column: &str) -> Option<usize> {
        let wanted = column.trim();
        self.headers.iter().position(|h| h.trim() == wanted)
    }

    /// Like `column_index`, but a missing column is an input-format error
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| IngestError::MissingColumn {
                sheet: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate rows with header-aware accessors
    pub fn iter_rows(&self) -> impl Iterator<Item = SheetRow<'_>> {
        self.rows.iter().enumerate().map(move |(i, cells)| SheetRow {
            headers: &self.headers,
            cells,
            line_number: i + 2, // 1-indexed + header row
        })
    }
}

/// Borrowed view of one data row
#[derive(Debug, Clone, Copy)]
pub struct SheetRow<'a> {
    headers: &'a [String],
    cells: &'a [String],
    pub line_number: usize,
}

impl<'a> SheetRow<'a> {
    /// Cell at a column index; blank or missing cells are `None`
    pub fn cell(&self, index: usize) -> Option<&'a str> {
        self.cells
            .get(index)
            .map(|c| c.as_str())
            .filter(|c| !c.trim().is_empty())
    }

    /// Cell at an optional column index (absent column → `None`)
    pub fn cell_opt(&self, index: Option<usize>) -> Option<&'a str> {
        index.and_then(|i| self.cell(i))
    }

    /// Every non-blank cell paired with its header
    pub fn fields(&self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        let row = *self;
        self.headers
            .iter()
            .enumerate()
            .filter_map(move |(i, header)| row.cell(i).map(|value| (header.as_str(), value)))
    }
}

/// All sheets of one input file, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Workbook { sheets }
    }

    /// Detect the container format and read every sheet
    pub fn open(path: &Path) -> Result<Self> {
        let reader = get_reader(detect_format(path)?);
        tracing::info!("Reading {} as {}", path.display(), reader.format().name());
        reader.read(path)
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    /// Look up a sheet by exact name
    pub fn sheet(&self, name: &str) -> Result<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| IngestError::MissingSheet {
                sheet: name.to_string(),
                available: self.sheet_names(),
            })
    }
}

// ============================================================================
// FORMAT DETECTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookFormat {
    /// xlsx / xlsm / xlsb / xls / ods
    Spreadsheet,

    /// Directory holding one CSV file per sheet
    CsvDirectory,
}

impl WorkbookFormat {
    pub fn name(&self) -> &str {
        match self {
            WorkbookFormat::Spreadsheet => "spreadsheet",
            WorkbookFormat::CsvDirectory => "csv directory",
        }
    }
}

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Decide how to read `path`
///
/// - Directory → `CsvDirectory`
/// - Known spreadsheet extension → `Spreadsheet`
/// - Anything else → `UnsupportedFormat`
pub fn detect_format(path: &Path) -> Result<WorkbookFormat> {
    if !path.exists() {
        return Err(IngestError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        });
    }

    if path.is_dir() {
        return Ok(WorkbookFormat::CsvDirectory);
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if SPREADSHEET_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(WorkbookFormat::Spreadsheet);
    }

    Err(IngestError::UnsupportedFormat(path.to_path_buf()))
}

/// Reader for one container format
pub trait WorkbookReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Workbook>;

    fn format(&self) -> WorkbookFormat;
}

pub fn get_reader(format: WorkbookFormat) -> Box<dyn WorkbookReader> {
    match format {
        WorkbookFormat::Spreadsheet => Box::new(SpreadsheetReader),
        WorkbookFormat::CsvDirectory => Box::new(CsvDirectoryReader),
    }
}

// ============================================================================
// SPREADSHEET READER (calamine)
// ============================================================================

pub struct SpreadsheetReader;

impl WorkbookReader for SpreadsheetReader {
    fn read(&self, path: &Path) -> Result<Workbook> {
        let workbook_error = |source: calamine::Error| IngestError::Workbook {
            path: path.to_path_buf(),
            source,
        };

        let mut spreadsheet = open_workbook_auto(path).map_err(workbook_error)?;

        let mut sheets = Vec::new();
        for name in spreadsheet.sheet_names() {
            let range = spreadsheet.worksheet_range(&name).map_err(workbook_error)?;

            let mut rows = range.rows();
            let headers: Vec<String> = match rows.next() {
                Some(header_row) => header_row
                    .iter()
                    .map(|cell| cell_to_string(cell).trim().to_string())
                    .collect(),
                None => Vec::new(),
            };

            let data: Vec<Vec<String>> = rows
                .map(|row| row.iter().map(cell_to_string).collect::<Vec<_>>())
                .filter(|cells| cells.iter().any(|c| !c.trim().is_empty()))
                .collect();

            tracing::debug!("Sheet '{}': {} columns, {} rows", name, headers.len(), data.len());
            sheets.push(Sheet::new(name, headers, data));
        }

        Ok(Workbook::new(sheets))
    }

    fn format(&self) -> WorkbookFormat {
        WorkbookFormat::Spreadsheet
    }
}

/// Render a spreadsheet cell as text
///
/// Whole floats lose their ".0" so roster ids read "12", not "12.0".
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// CSV DIRECTORY READER
// ============================================================================

pub struct CsvDirectoryReader;

impl CsvDirectoryReader {
    fn read_sheet(&self, name: String, file_path: &Path) -> Result<Sheet> {
        use csv::ReaderBuilder;

        let csv_error = |source: csv::Error| IngestError::Csv {
            path: file_path.to_path_buf(),
            source,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(file_path)
            .map_err(csv_error)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_error)?;
            let cells: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            if cells.iter().any(|c| !c.trim().is_empty()) {
                rows.push(cells);
            }
        }

        Ok(Sheet::new(name, headers, rows))
    }
}

impl WorkbookReader for CsvDirectoryReader {
    fn read(&self, path: &Path) -> Result<Workbook> {
        let io_error = |source: std::io::Error| IngestError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(path).map_err(io_error)? {
            let file_path = entry.map_err(io_error)?.path();
            let is_csv = file_path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);

            if file_path.is_file() && is_csv {
                files.push(file_path);
            }
        }
        files.sort();

        let mut sheets = Vec::new();
        for file_path in files {
            let name = file_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
            sheets.push(self.read_sheet(name, &file_path)?);
        }

        Ok(Workbook::new(sheets))
    }

    fn format(&self) -> WorkbookFormat {
        WorkbookFormat::CsvDirectory
    }
}

// ============================================================================
// TESTS
// ============================================================================
