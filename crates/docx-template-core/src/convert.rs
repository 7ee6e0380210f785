//! Best-effort PDF rendering through external converters.
//!
//! Backends are tried in order until one produces a PDF. A missing tool, a
//! crash or a timeout only moves on to the next backend; when all of them
//! fail the caller simply gets no rendering.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Well-known LibreOffice install locations, checked in order.
pub const SOFFICE_INSTALL_PATHS: &[&str] = &[
    "/Applications/LibreOffice.app/Contents/MacOS/soffice",
    "/usr/bin/soffice",
    "/usr/lib/libreoffice/program/soffice",
    "/opt/libreoffice/program/soffice",
    r"C:\Program Files\LibreOffice\program\soffice.exe",
];

/// Result of one backend attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Converted(PathBuf),
    /// The tool is not installed.
    Unavailable,
    Failed(String),
}

/// Command-line convention of a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// `docx2pdf <input> <output>`
    Docx2Pdf,
    /// `soffice --headless --convert-to pdf --outdir <dir> <input>`
    LibreOffice,
}

/// How to find a backend's executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Program name looked up on `PATH`.
    OnPath(String),
    /// Fixed install locations; the first one that exists wins.
    Installed(Vec<PathBuf>),
}

impl Locator {
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            Locator::OnPath(program) => which::which(program).ok(),
            Locator::Installed(candidates) => candidates.iter().find(|p| p.is_file()).cloned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub name: String,
    pub kind: BackendKind,
    pub locator: Locator,
}

impl Backend {
    pub fn new(name: impl Into<String>, kind: BackendKind, locator: Locator) -> Self {
        Self {
            name: name.into(),
            kind,
            locator,
        }
    }

    pub fn docx2pdf() -> Self {
        Self::new("docx2pdf", BackendKind::Docx2Pdf, Locator::OnPath("docx2pdf".into()))
    }

    pub fn libreoffice() -> Self {
        Self::libreoffice_at(SOFFICE_INSTALL_PATHS.iter().map(PathBuf::from).collect())
    }

    pub fn libreoffice_at(candidates: Vec<PathBuf>) -> Self {
        Self::new(
            "libreoffice",
            BackendKind::LibreOffice,
            Locator::Installed(candidates),
        )
    }

    pub fn is_available(&self) -> bool {
        self.locator.resolve().is_some()
    }

    fn command(&self, program: &Path, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(program);
        match self.kind {
            BackendKind::Docx2Pdf => {
                cmd.arg(input).arg(output);
            }
            BackendKind::LibreOffice => {
                let outdir = output.parent().unwrap_or_else(|| Path::new("."));
                cmd.args(["--headless", "--convert-to", "pdf", "--outdir"])
                    .arg(outdir)
                    .arg(input);
            }
        }
        cmd
    }
}

/// Settings for the default chain.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    pub timeout: Duration,
    /// Try `docx2pdf` first.
    pub docx2pdf: bool,
    /// Use this `soffice` instead of the well-known install paths.
    pub soffice_path: Option<PathBuf>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            docx2pdf: true,
            soffice_path: None,
        }
    }
}

/// Ordered list of converters, short-circuiting on the first success.
#[derive(Debug, Clone)]
pub struct ConversionChain {
    backends: Vec<Backend>,
    timeout: Duration,
}

impl Default for ConversionChain {
    fn default() -> Self {
        Self::from_config(&ChainConfig::default())
    }
}

impl ConversionChain {
    pub fn new(backends: Vec<Backend>, timeout: Duration) -> Self {
        Self { backends, timeout }
    }

    pub fn from_config(config: &ChainConfig) -> Self {
        let mut backends = Vec::new();
        if config.docx2pdf {
            backends.push(Backend::docx2pdf());
        }
        backends.push(match &config.soffice_path {
            Some(path) => Backend::libreoffice_at(vec![path.clone()]),
            None => Backend::libreoffice(),
        });
        Self::new(backends, config.timeout)
    }

    /// A chain that never renders.
    pub fn disabled() -> Self {
        Self::new(Vec::new(), DEFAULT_TIMEOUT)
    }

    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    /// Names of the backends whose executable can currently be found.
    pub fn available(&self) -> Vec<&str> {
        self.backends
            .iter()
            .filter(|b| b.is_available())
            .map(|b| b.name.as_str())
            .collect()
    }

    /// Render `document` to `<stem>.pdf` beside it, or `None` if every backend failed.
    pub fn convert(&self, document: &Path) -> Option<PathBuf> {
        for backend in &self.backends {
            match self.attempt(backend, document) {
                ConversionOutcome::Converted(pdf) => {
                    info!("Converted {:?} with {}", document, backend.name);
                    return Some(pdf);
                }
                ConversionOutcome::Unavailable => {
                    debug!("Converter {} not installed, skipping", backend.name);
                }
                ConversionOutcome::Failed(reason) => {
                    warn!("Converter {} failed: {}", backend.name, reason);
                }
            }
        }
        warn!("PDF conversion skipped for {:?}: no converter succeeded", document);
        None
    }

    /// Success flag plus the rendering path.
    pub fn convert_to_pdf(&self, document: &Path) -> (bool, Option<PathBuf>) {
        let pdf = self.convert(document);
        (pdf.is_some(), pdf)
    }

    /// Run a single backend against `document`.
    pub fn attempt(&self, backend: &Backend, document: &Path) -> ConversionOutcome {
        let Some(program) = backend.locator.resolve() else {
            return ConversionOutcome::Unavailable;
        };
        let output = document.with_extension("pdf");
        // A leftover file must not pass for a fresh rendering.
        let _ = std::fs::remove_file(&output);

        let mut cmd = backend.command(&program, document, &output);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        debug!("Running {:?}", cmd);

        match run_with_timeout(cmd, self.timeout) {
            Ok(()) if output.is_file() => ConversionOutcome::Converted(output),
            Ok(()) => ConversionOutcome::Failed(format!(
                "exited successfully but {:?} was not produced",
                output
            )),
            Err(reason) => ConversionOutcome::Failed(reason),
        }
    }
}

fn run_with_timeout(mut cmd: Command, timeout: Duration) -> Result<(), String> {
    let mut child = cmd.spawn().map_err(|e| format!("failed to start: {}", e))?;
    let started = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => return Err(format!("exited with {}", status)),
            Ok(None) if started.elapsed() > timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("timed out after {:?}", timeout));
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                return Err(format!("failed to wait: {}", e));
            }
        }
    }
}
