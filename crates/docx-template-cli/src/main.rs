//! Fill a DOCX template from a JSON placeholder map.
//!
//! Produces `<out>.docx` always and `<out>.pdf` when a converter is available.
//! Exits non-zero only when the document itself cannot be produced.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use docx_template_core::{build_files, ChainConfig, ConversionChain, PackageOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "docx-template")]
#[command(version)]
#[command(about = "Replace placeholders in a Word template, output DOCX + PDF", long_about = None)]
struct Args {
    /// The .docx template
    #[arg(long, value_name = "FILE")]
    template: PathBuf,

    /// JSON object mapping placeholders to values
    #[arg(long, value_name = "FILE")]
    json: PathBuf,

    /// Output stub without extension, e.g. /tmp/myresume
    #[arg(long, value_name = "STUB")]
    out: PathBuf,

    /// Seconds before a converter is abandoned
    #[arg(long, default_value = "60", env = "DOCX_TEMPLATE_CONVERT_TIMEOUT")]
    timeout_secs: u64,

    /// LibreOffice executable to use instead of the well-known install paths
    #[arg(long, env = "DOCX_TEMPLATE_SOFFICE")]
    soffice_path: Option<PathBuf>,

    /// Skip the docx2pdf converter
    #[arg(long)]
    no_docx2pdf: bool,

    /// Also replace placeholders in headers and footers
    #[arg(long)]
    headers_footers: bool,
}

impl Args {
    fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            docx2pdf: !self.no_docx2pdf,
            soffice_path: self.soffice_path.clone(),
        }
    }

    fn package_options(&self) -> PackageOptions {
        PackageOptions {
            include_headers_footers: self.headers_footers,
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let chain = ConversionChain::from_config(&args.chain_config());
    info!("Converters available: {:?}", chain.available());

    let artifacts = build_files(
        &args.template,
        &args.json,
        &args.out,
        &args.package_options(),
        &chain,
    )
    .with_context(|| format!("building from template {:?}", args.template))?;

    println!("DOCX: {}", artifacts.docx_path.display());
    match artifacts.pdf_path {
        Some(pdf) => println!("PDF : {}", pdf.display()),
        None => println!("PDF conversion skipped (docx2pdf/LibreOffice not found)"),
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Build failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
