// 📰 Post Entity - one annotated social-media post

use crate::config::WorkbookConfig;
use crate::error::Result;
use crate::workbook::{Sheet, SheetRow};

/// Column positions in the posts sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostColumns {
    pub annotation: usize,
    pub post_link: Option<usize>,
    pub group_link: Option<usize>,
}

impl PostColumns {
    /// Resolve column titles; only the annotation column is required
    pub fn resolve(sheet: &Sheet, config: &WorkbookConfig) -> Result<Self> {
        Ok(PostColumns {
            annotation: sheet.require_column(&config.annotation_column)?,
            post_link: sheet.column_index(&config.post_link_column),
            group_link: sheet.column_index(&config.group_link_column),
        })
    }
}

/// Borrowed view of one post row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Post<'a> {
    /// Free-text company annotation from the upstream extractor
    pub annotation: Option<&'a str>,
    pub post_link: Option<&'a str>,
    pub group_link: Option<&'a str>,
    pub line_number: usize,
}

impl<'a> Post<'a> {
    pub fn from_row(row: &SheetRow<'a>, columns: &PostColumns) -> Self {
        Post {
            annotation: row.cell(columns.annotation),
            post_link: row.cell_opt(columns.post_link),
            group_link: row.cell_opt(columns.group_link),
            line_number: row.line_number,
        }
    }

    /// Post link, falling back to the group link when blank
    pub fn source_link(&self) -> Option<&'a str> {
        self.post_link
            .map(str::trim)
            .filter(|link| !link.is_empty())
            .or_else(|| self.group_link.map(str::trim).filter(|link| !link.is_empty()))
    }
}
