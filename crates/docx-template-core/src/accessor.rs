//! Document-order traversal of every paragraph, including those nested in
//! table cells at any depth.

use crate::model::{Block, Document, Paragraph};

/// Collect live references to every paragraph of `document`.
///
/// Tables are walked row by row, cell by cell; each cell's paragraphs and
/// nested tables are visited in source order.
pub fn collect_containers(document: &mut Document) -> Vec<&mut Paragraph> {
    let mut out = Vec::new();
    visit_mut(&mut document.blocks, &mut out);
    out
}

/// Read-only counterpart of [`collect_containers`], same order.
pub fn containers(document: &Document) -> Vec<&Paragraph> {
    let mut out = Vec::new();
    visit(&document.blocks, &mut out);
    out
}

fn visit_mut<'a>(blocks: &'a mut [Block], out: &mut Vec<&'a mut Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => out.push(paragraph),
            Block::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        visit_mut(&mut cell.blocks, out);
                    }
                }
            }
        }
    }
}

fn visit<'a>(blocks: &'a [Block], out: &mut Vec<&'a Paragraph>) {
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => out.push(paragraph),
            Block::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    visit(&cell.blocks, out);
                }
            }
        }
    }
}
