//! End-to-end build: template + placeholder map → filled DOCX (+ optional PDF).

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::convert::ConversionChain;
use crate::error::Result;
use crate::package::{PackageOptions, TemplatePackage};
use crate::substitute::{apply_all, parse_placeholder_map, PlaceholderMap, SubstitutionReport};

/// A filled document, serialized.
#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub bytes: Vec<u8>,
    pub report: SubstitutionReport,
}

/// Output of [`build`]. `pdf` is `None` when no converter succeeded.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub document: Vec<u8>,
    pub pdf: Option<Vec<u8>>,
    pub report: SubstitutionReport,
}

/// Files written by [`build_files`].
#[derive(Debug, Clone)]
pub struct BuildArtifacts {
    pub docx_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
    pub report: SubstitutionReport,
}

/// Load a template, substitute every story, serialize.
pub fn fill(template: &[u8], map: &PlaceholderMap, options: &PackageOptions) -> Result<FilledDocument> {
    let mut package = TemplatePackage::from_bytes(template, options)?;

    let mut report = SubstitutionReport::default();
    for (part, document) in package.stories_mut() {
        let story_report = apply_all(document, map);
        debug!("{}: {} substitution(s)", part, story_report.total());
        report.merge(story_report);
    }
    for placeholder in report.unmatched() {
        debug!("Placeholder {} not found in template", placeholder);
    }

    let bytes = package.to_bytes()?;
    info!(
        "Filled template: {} placeholder(s), {} substitution(s)",
        map.len(),
        report.total()
    );
    Ok(FilledDocument { bytes, report })
}

/// Fill `template` and try to render it, staging files in a directory that
/// is removed before returning.
pub fn build(template: &[u8], map: &PlaceholderMap, chain: &ConversionChain) -> Result<BuildOutput> {
    build_with_options(template, map, &PackageOptions::default(), chain)
}

pub fn build_with_options(
    template: &[u8],
    map: &PlaceholderMap,
    options: &PackageOptions,
    chain: &ConversionChain,
) -> Result<BuildOutput> {
    let filled = fill(template, map, options)?;

    let staging = tempfile::tempdir()?;
    let docx_path = staging.path().join("document.docx");
    std::fs::write(&docx_path, &filled.bytes)?;

    let pdf = match chain.convert(&docx_path) {
        Some(pdf_path) => Some(std::fs::read(pdf_path)?),
        None => None,
    };

    Ok(BuildOutput {
        document: filled.bytes,
        pdf,
        report: filled.report,
    })
}

/// Read the template and JSON map from disk, write `<out_stub>.docx` and,
/// when a converter succeeds, `<out_stub>.pdf`.
///
/// The extension is appended to the stub rather than substituted for an
/// existing one: `cv.v2` gives `cv.v2.docx`, and `cv.docx` gives `cv.docx.docx`.
pub fn build_files(
    template_path: &Path,
    map_path: &Path,
    out_stub: &Path,
    options: &PackageOptions,
    chain: &ConversionChain,
) -> Result<BuildArtifacts> {
    let map = parse_placeholder_map(&std::fs::read_to_string(map_path)?)?;
    let template = std::fs::read(template_path)?;
    let filled = fill(&template, &map, options)?;

    let docx_path = with_suffix(out_stub, "docx");
    if let Some(parent) = docx_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&docx_path, &filled.bytes)?;
    info!("Wrote {:?}", docx_path);

    let pdf_path = chain.convert(&docx_path);

    Ok(BuildArtifacts {
        docx_path,
        pdf_path,
        report: filled.report,
    })
}

/// `out_stub` with `.ext` appended, keeping any dots already in the stub.
fn with_suffix(out_stub: &Path, ext: &str) -> PathBuf {
    let mut name = out_stub.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_appended() {
        assert_eq!(with_suffix(Path::new("/tmp/out"), "docx"), PathBuf::from("/tmp/out.docx"));
        assert_eq!(
            with_suffix(Path::new("/tmp/resume.v2"), "pdf"),
            PathBuf::from("/tmp/resume.v2.pdf")
        );
        assert_eq!(
            with_suffix(Path::new("cv.docx"), "docx"),
            PathBuf::from("cv.docx.docx")
        );
    }
}
