//! Placeholder replacement across style-run boundaries.
//!
//! A placeholder typed in a word processor is frequently split over several
//! runs (spell-check marks, partial edits, autocorrect). The replacer works on
//! the paragraph's concatenated text, then maps each match back onto the runs:
//! the run holding the first character receives the value, runs fully inside
//! the match are emptied, and the run holding the last character keeps only
//! what follows the match. Run formatting is never touched.

use tracing::trace;

use crate::model::Paragraph;

/// Replace every occurrence of `placeholder` in `paragraph` with `value`,
/// returning how many substitutions were made.
///
/// Matches are taken left to right without overlap, as `str::replace` would
/// on the paragraph text. An absent or empty placeholder leaves the paragraph
/// untouched.
pub fn replace_all(paragraph: &mut Paragraph, placeholder: &str, value: &str) -> usize {
    if placeholder.is_empty() {
        return 0;
    }

    let mut count = 0;
    let mut cursor = 0;
    loop {
        // Offsets shift after every splice.
        let full_text = paragraph.text();
        let Some(found) = full_text.get(cursor..).and_then(|rest| rest.find(placeholder)) else {
            break;
        };
        let start = cursor + found;
        let end = start + placeholder.len();

        splice(paragraph, start, end, value);
        trace!(placeholder, start, "replaced occurrence");

        count += 1;
        // Resume after the inserted value: text produced by a substitution is
        // never searched again, so a value that forms or contains the
        // placeholder cannot loop.
        cursor = start + value.len();
    }
    count
}

/// Rewrite the runs so that bytes `start..end` of the paragraph text become `value`.
fn splice(paragraph: &mut Paragraph, start: usize, end: usize, value: &str) {
    let spans = paragraph.spans();
    // A zero-length run never contains an offset, so both lookups land on real text.
    let first = spans.iter().position(|s| s.contains(&start));
    let last = spans.iter().position(|s| s.contains(&(end - 1)));
    let (Some(first), Some(last)) = (first, last) else {
        return;
    };

    let runs = &mut paragraph.runs;
    let head_len = start - spans[first].start;
    let tail_from = end - spans[last].start;

    if first == last {
        let run = &mut runs[first].text;
        let tail = run[tail_from..].to_string();
        run.truncate(head_len);
        run.push_str(value);
        run.push_str(&tail);
        return;
    }

    runs[first].text.truncate(head_len);
    runs[first].text.push_str(value);
    for run in &mut runs[first + 1..last] {
        run.text.clear();
    }
    runs[last].text.drain(..tail_from);
}
