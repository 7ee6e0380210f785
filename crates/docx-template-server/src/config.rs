use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use docx_template_core::{ChainConfig, PackageOptions};

/// Configuration for the docx-template server.
#[derive(Parser, Debug, Clone)]
#[command(name = "docx-template-server")]
#[command(about = "HTTP endpoint that fills DOCX templates and returns DOCX or PDF")]
pub struct Config {
    /// TCP host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "DOCX_TEMPLATE_HOST")]
    pub host: String,

    /// TCP port to bind to
    #[arg(long, default_value = "8000", env = "PORT")]
    pub port: u16,

    /// Directory served under /.well-known (plugin manifest, logo)
    #[arg(long, default_value = "plugin_static", env = "DOCX_TEMPLATE_STATIC_DIR")]
    pub static_dir: PathBuf,

    /// Largest accepted request body, in bytes
    #[arg(long, default_value = "20971520", env = "DOCX_TEMPLATE_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    /// Seconds before a converter is abandoned
    #[arg(long, default_value = "60", env = "DOCX_TEMPLATE_CONVERT_TIMEOUT")]
    pub convert_timeout_secs: u64,

    /// LibreOffice executable to use instead of the well-known install paths
    #[arg(long, env = "DOCX_TEMPLATE_SOFFICE")]
    pub soffice_path: Option<PathBuf>,

    /// Skip the docx2pdf converter
    #[arg(long, env = "DOCX_TEMPLATE_NO_DOCX2PDF")]
    pub no_docx2pdf: bool,

    /// Also replace placeholders in headers and footers
    #[arg(long, env = "DOCX_TEMPLATE_HEADERS_FOOTERS")]
    pub headers_footers: bool,
}

impl Config {
    pub fn chain_config(&self) -> ChainConfig {
        ChainConfig {
            timeout: Duration::from_secs(self.convert_timeout_secs),
            docx2pdf: !self.no_docx2pdf,
            soffice_path: self.soffice_path.clone(),
        }
    }

    pub fn package_options(&self) -> PackageOptions {
        PackageOptions {
            include_headers_footers: self.headers_footers,
        }
    }
}
