// 📋 Report Builder - mention records → sorted tabular report
//
// Column order is fixed:
//   id | company | mention count | links | owner (events) | owner (media) | known in roster
//
// Output: CSV, JSON, or an xlsx workbook with a bold header row.

use crate::aggregator::MentionRecord;
use crate::config::ReportConfig;
use crate::error::Result;
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Position of the mention count in a report row (written as a number in xlsx)
const COUNT_COLUMN: usize = 2;

// ============================================================================
// REPORT ROW
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Roster id, empty for free companies
    pub id: String,
    pub company: String,
    pub mention_count: usize,
    /// Source links joined with ", "
    pub links: String,
    pub owner_events: String,
    pub owner_media: String,
    pub known_in_roster: bool,
}

impl ReportRow {
    pub fn from_record(record: &MentionRecord) -> Self {
        let company = record.company.as_ref();

        ReportRow {
            id: company.and_then(|c| c.id.clone()).unwrap_or_default(),
            company: record.name.clone(),
            mention_count: record.count,
            links: record.links.join(", "),
            owner_events: company.and_then(|c| c.owner_events.clone()).unwrap_or_default(),
            owner_media: company.and_then(|c| c.owner_media.clone()).unwrap_or_default(),
            known_in_roster: record.is_known(),
        }
    }

    /// Cells in column order, with the known flag rendered through `config`
    pub fn to_record(&self, config: &ReportConfig) -> [String; 7] {
        [
            self.id.clone(),
            self.company.clone(),
            self.mention_count.to_string(),
            self.links.clone(),
            self.owner_events.clone(),
            self.owner_media.clone(),
            config.known_label(self.known_in_roster).to_string(),
        ]
    }
}

/// One row per record, mention count descending
///
/// The sort is stable: equal counts keep aggregation (first-seen) order.
pub fn build_report(records: &[MentionRecord]) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = records.iter().map(ReportRow::from_record).collect();
    rows.sort_by(|a, b| b.mention_count.cmp(&a.mention_count));
    rows
}

// ============================================================================
// RUN STATISTICS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub posts_scanned: usize,
    pub posts_with_mentions: usize,
    pub roster_companies: usize,
    pub aliases: usize,
    pub alias_collisions: usize,
    pub known_companies: usize,
    pub free_companies: usize,
}

impl RunStats {
    pub fn summary(&self) -> String {
        format!(
            "{} posts ({} with mentions), roster {} companies / {} aliases, \
             found {} known + {} free companies",
            self.posts_scanned,
            self.posts_with_mentions,
            self.roster_companies,
            self.aliases,
            self.known_companies,
            self.free_companies
        )
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
    pub stats: RunStats,
}

impl Report {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write header + rows as CSV
    pub fn write_csv<W: Write>(&self, writer: W, config: &ReportConfig) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(config.headers())?;
        for row in &self.rows {
            csv_writer.write_record(row.to_record(config))?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;

        Ok(())
    }

    pub fn to_csv_string(&self, config: &ReportConfig) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer, config)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One worksheet named after `config.sheet_name`: bold titles, then rows
    fn to_xlsx_workbook(&self, config: &ReportConfig) -> Result<XlsxWorkbook> {
        let mut workbook = XlsxWorkbook::new();
        let bold = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name(config.sheet_name.as_str())?;

        for (col, title) in config.headers().into_iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, title, &bold)?;
        }

        for (i, row) in self.rows.iter().enumerate() {
            let line = (i + 1) as u32;
            for (col, cell) in row.to_record(config).into_iter().enumerate() {
                if col == COUNT_COLUMN {
                    sheet.write_number(line, col as u16, row.mention_count as f64)?;
                } else if !cell.is_empty() {
                    sheet.write_string(line, col as u16, cell)?;
                }
            }
        }
        sheet.autofit();

        Ok(workbook)
    }

    /// Save as an xlsx file
    pub fn write_xlsx(&self, path: &Path, config: &ReportConfig) -> Result<()> {
        let mut workbook = self.to_xlsx_workbook(config)?;
        workbook.save(path)?;
        Ok(())
    }

    /// Render as xlsx bytes (for downloads)
    pub fn to_xlsx_bytes(&self, config: &ReportConfig) -> Result<Vec<u8>> {
        let mut workbook = self.to_xlsx_workbook(config)?;
        Ok(workbook.save_to_buffer()?)
    }
}

// ============================================================================
// TESTS
// ============================================================================
