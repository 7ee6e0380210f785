//! Reading a `.docx` archive into the document model and writing it back.
//!
//! Parts are parsed with `roxmltree`, which keeps the byte range of every
//! node. Run text is read from `w:t`, `w:tab` (`\t`) and `w:br`/`w:cr` (`\n`),
//! and each run remembers where those elements live in the source XML, so
//! saving only splices the content of runs that actually changed and leaves
//! every other byte of the part (properties, bookmarks, drawings) as it was.

use std::collections::HashMap;
use std::io::{Cursor, Read as _, Write as _};
use std::ops::Range;
use std::path::Path;

use roxmltree::Node;
use tracing::{debug, info};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::accessor::containers;
use crate::error::{Result, TemplateError};
use crate::model::{Block, Cell, Document, Paragraph, Row, Run, RunFormat, Table};

pub const DOCUMENT_PART: &str = "word/document.xml";

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const W_NS_STRICT: &str = "http://purl.oclc.org/ooxml/wordprocessingml/main";

/// Which parts of the package are treated as stories.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Also parse `word/header*.xml` and `word/footer*.xml`.
    pub include_headers_footers: bool,
}

/// A loaded template: the original archive plus its parsed stories.
pub struct TemplatePackage {
    archive: Vec<u8>,
    stories: Vec<Story>,
}

struct Story {
    part: String,
    xml: String,
    anchors: Vec<RunAnchor>,
    document: Document,
}

/// Location of one `w:r` element in its part.
#[derive(Debug)]
struct RunAnchor {
    element: Range<usize>,
    /// From the first to the last text-bearing child (`w:t`, `w:tab`, `w:br`, `w:cr`).
    content: Option<Range<usize>>,
    /// Other elements inside `content`, written back after the new text.
    kept: Vec<Range<usize>>,
    original: String,
}

impl TemplatePackage {
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, &PackageOptions::default())
    }

    pub fn from_bytes(bytes: &[u8], options: &PackageOptions) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let mut part_names = vec![DOCUMENT_PART.to_string()];
        if options.include_headers_footers {
            part_names.extend(story_parts(&archive, "word/header"));
            part_names.extend(story_parts(&archive, "word/footer"));
        }

        let mut stories = Vec::with_capacity(part_names.len());
        for part in part_names {
            let xml = read_part(&mut archive, &part)?;
            let (document, anchors) = parse_story(&part, &xml)?;
            debug!("Parsed {} ({} runs)", part, anchors.len());
            stories.push(Story {
                part,
                xml,
                anchors,
                document,
            });
        }

        Ok(Self {
            archive: bytes.to_vec(),
            stories,
        })
    }

    /// The main document body.
    pub fn document(&self) -> &Document {
        &self.stories[0].document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.stories[0].document
    }

    /// Every parsed story: the body first, then headers, then footers.
    pub fn stories(&self) -> impl Iterator<Item = (&str, &Document)> {
        self.stories.iter().map(|s| (s.part.as_str(), &s.document))
    }

    pub fn stories_mut(&mut self) -> impl Iterator<Item = (&str, &mut Document)> {
        self.stories
            .iter_mut()
            .map(|s| (s.part.as_str(), &mut s.document))
    }

    /// Serialize the package, rewriting only the parts whose text changed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let rendered: HashMap<&str, String> = self
            .stories
            .iter()
            .filter_map(|s| s.render().map(|xml| (s.part.as_str(), xml)))
            .collect();

        if rendered.is_empty() {
            debug!("No story changed, returning the original archive");
            return Ok(self.archive.clone());
        }

        let mut archive = ZipArchive::new(Cursor::new(self.archive.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.archive.len())));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let file = archive.by_index_raw(i)?;
            let name = file.name().to_string();
            let replacement = rendered.get(name.as_str());
            match replacement {
                Some(xml) => {
                    drop(file);
                    writer.start_file(name, options)?;
                    writer.write_all(xml.as_bytes())?;
                }
                None => writer.raw_copy_file(file)?,
            }
        }

        let bytes = writer.finish()?.into_inner();
        info!("Rewrote {} part(s)", rendered.len());
        Ok(bytes)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

impl Story {
    /// New XML for this part, or `None` when no run text changed.
    fn render(&self) -> Option<String> {
        let mut edits: Vec<(Range<usize>, String)> = Vec::new();

        for paragraph in containers(&self.document) {
            for run in &paragraph.runs {
                let Some(anchor) = run.source.and_then(|i| self.anchors.get(i)) else {
                    continue;
                };
                if anchor.original != run.text {
                    edits.extend(self.run_edits(anchor, &run.text));
                }
            }
        }

        if edits.is_empty() {
            return None;
        }
        edits.sort_by_key(|(range, _)| range.start);

        let mut out = String::with_capacity(self.xml.len());
        let mut pos = 0;
        for (range, replacement) in edits {
            out.push_str(&self.xml[pos..range.start]);
            out.push_str(&replacement);
            pos = range.end;
        }
        out.push_str(&self.xml[pos..]);
        Some(out)
    }

    fn run_edits(&self, anchor: &RunAnchor, text: &str) -> Vec<(Range<usize>, String)> {
        let run_xml = &self.xml[anchor.element.clone()];
        let run_name = qualified_name(run_xml);
        let prefix = run_name.rsplit_once(':').map(|(p, _)| p);

        match &anchor.content {
            Some(content) => {
                let mut replacement = text_xml(prefix, text);
                for kept in &anchor.kept {
                    replacement.push_str(&self.xml[kept.clone()]);
                }
                vec![(content.clone(), replacement)]
            }
            None if text.is_empty() => Vec::new(),
            None if run_xml.ends_with("/>") => {
                let open = run_xml[..run_xml.len() - 2].trim_end();
                let replacement = format!("{}>{}</{}>", open, text_xml(prefix, text), run_name);
                vec![(anchor.element.clone(), replacement)]
            }
            None => {
                let close = anchor.element.start + run_xml.rfind("</").unwrap_or(run_xml.len());
                vec![(close..close, text_xml(prefix, text))]
            }
        }
    }
}

/// Element name as written in the source, e.g. `w:r` from `<w:r w:rsidR="..">`.
fn qualified_name(element_xml: &str) -> &str {
    let name = element_xml.trim_start_matches('<');
    let end = name
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(name.len());
    &name[..end]
}

/// Run content for `text`: tabs and line breaks become their own elements.
fn text_xml(prefix: Option<&str>, text: &str) -> String {
    let tag = |local: &str| match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    };
    let t = tag("t");

    let mut out = String::new();
    let mut segment = String::new();
    let flush = |segment: &mut String, out: &mut String| {
        if !segment.is_empty() {
            out.push_str(&format!("<{t} xml:space=\"preserve\">{}</{t}>", escape_text(segment)));
            segment.clear();
        }
    };

    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut segment, &mut out);
                out.push_str(&format!("<{}/>", tag("tab")));
            }
            '\n' | '\r' => {
                flush(&mut segment, &mut out);
                out.push_str(&format!("<{}/>", tag("br")));
            }
            // Not representable in XML 1.0.
            c if c < ' ' => {}
            c => segment.push(c),
        }
    }
    flush(&mut segment, &mut out);

    if out.is_empty() {
        format!("<{t} xml:space=\"preserve\"></{t}>")
    } else {
        out
    }
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn story_parts(archive: &ZipArchive<Cursor<&[u8]>>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|name| {
            name.strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(".xml"))
                .is_some_and(|stem| stem.chars().all(|c| c.is_ascii_digit()))
        })
        .map(str::to_string)
        .collect();
    names.sort_by_key(|name| (name.len(), name.clone()));
    names
}

fn read_part(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name).map_err(|e| match e {
        ZipError::FileNotFound => TemplateError::MissingPart(name.to_string()),
        other => other.into(),
    })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    if xml.starts_with('\u{feff}') {
        xml.replace_range(..'\u{feff}'.len_utf8(), "");
    }
    Ok(xml)
}

fn parse_story(part: &str, xml: &str) -> Result<(Document, Vec<RunAnchor>)> {
    let tree = roxmltree::Document::parse(xml).map_err(|source| TemplateError::Xml {
        part: part.to_string(),
        source,
    })?;

    let root = tree.root_element();
    let container = if is_w(root, "document") {
        root.children()
            .find(|n| is_w(*n, "body"))
            .ok_or_else(|| TemplateError::Structure {
                part: part.to_string(),
                reason: "document has no w:body".to_string(),
            })?
    } else if is_w(root, "hdr") || is_w(root, "ftr") {
        root
    } else {
        return Err(TemplateError::Structure {
            part: part.to_string(),
            reason: format!("unexpected root element '{}'", root.tag_name().name()),
        });
    };

    let mut anchors = Vec::new();
    let blocks = read_blocks(container, &mut anchors);
    Ok((Document::new(blocks), anchors))
}

fn is_w(node: Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && matches!(node.tag_name().namespace(), Some(W_NS) | Some(W_NS_STRICT))
}

fn read_blocks(parent: Node, anchors: &mut Vec<RunAnchor>) -> Vec<Block> {
    let mut blocks = Vec::new();
    for node in parent.children() {
        if is_w(node, "p") {
            blocks.push(Block::Paragraph(read_paragraph(node, anchors)));
        } else if is_w(node, "tbl") {
            blocks.push(Block::Table(read_table(node, anchors)));
        }
    }
    blocks
}

fn read_table(tbl: Node, anchors: &mut Vec<RunAnchor>) -> Table {
    let rows = tbl
        .children()
        .filter(|n| is_w(*n, "tr"))
        .map(|tr| Row {
            cells: tr
                .children()
                .filter(|n| is_w(*n, "tc"))
                .map(|tc| Cell {
                    blocks: read_blocks(tc, anchors),
                })
                .collect(),
        })
        .collect();
    Table { rows }
}

fn read_paragraph(p: Node, anchors: &mut Vec<RunAnchor>) -> Paragraph {
    let mut runs = Vec::new();
    for r in p.children().filter(|n| is_w(*n, "r")) {
        let mut text = String::new();
        let mut content: Option<Range<usize>> = None;
        let mut kept = Vec::new();
        let mut pending = Vec::new();
        for child in r.children().filter(|n| n.is_element()) {
            match run_text(child) {
                Some(piece) => {
                    text.push_str(piece);
                    let range = child.range();
                    content = Some(match content {
                        Some(c) => c.start..range.end,
                        None => range,
                    });
                    kept.append(&mut pending);
                }
                None if content.is_some() => pending.push(child.range()),
                None => {}
            }
        }
        let format = r
            .children()
            .find(|n| is_w(*n, "rPr"))
            .map(read_format)
            .unwrap_or_default();

        runs.push(Run {
            text: text.clone(),
            format,
            source: Some(anchors.len()),
        });
        anchors.push(RunAnchor {
            element: r.range(),
            content,
            kept,
            original: text,
        });
    }
    Paragraph { runs }
}

/// Visible text of a run child: `w:t` content, a tab, or a line break.
/// Page and column breaks carry no text.
fn run_text<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    if is_w(node, "t") {
        Some(node.text().unwrap_or(""))
    } else if is_w(node, "tab") {
        Some("\t")
    } else if is_w(node, "cr")
        || (is_w(node, "br") && matches!(attr(node, "type"), None | Some("textWrapping")))
    {
        Some("\n")
    } else {
        None
    }
}

fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value())
}

fn val<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    attr(node, "val")
}

fn on_off(node: Node) -> bool {
    !matches!(val(node), Some("0" | "false" | "off"))
}

fn read_format(rpr: Node) -> RunFormat {
    let mut format = RunFormat::default();
    for child in rpr.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "b" => format.bold = Some(on_off(child)),
            "i" => format.italic = Some(on_off(child)),
            "u" => format.underline = Some(val(child).unwrap_or("single").to_string()),
            "sz" => format.size = val(child).and_then(|v| v.parse().ok()),
            "color" => format.color = val(child).map(str::to_string),
            "rFonts" => {
                format.font = child
                    .attributes()
                    .find(|a| a.name() == "ascii" || a.name() == "hAnsi")
                    .map(|a| a.value().to_string());
            }
            _ => {}
        }
    }
    format
}
