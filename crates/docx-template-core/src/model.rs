use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Formatting attributes of a run, as read from its `w:rPr`.
///
/// Substitution never rewrites these; they are kept for inspection only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFormat {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<String>,
    pub font: Option<String>,
    /// Font size in half-points, as stored in `w:sz`.
    pub size: Option<u32>,
    /// Hex RGB like "FF0000", or "auto".
    pub color: Option<String>,
}

/// A span of text sharing one set of formatting attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub format: RunFormat,
    /// Index of the XML run this was read from. `None` for runs built in memory.
    pub source: Option<usize>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_format(text: impl Into<String>, format: RunFormat) -> Self {
        Self {
            text: text.into(),
            format,
            source: None,
        }
    }
}

/// A paragraph-like text container: an ordered sequence of runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    /// Visible text: the run texts concatenated in order.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Byte range of each run inside [`Paragraph::text`].
    pub fn spans(&self) -> Vec<Range<usize>> {
        let mut offset = 0;
        self.runs
            .iter()
            .map(|run| {
                let start = offset;
                offset += run.text.len();
                start..offset
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// One story of a document (the body, a header or a footer).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }
}
