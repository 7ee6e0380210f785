use thiserror::Error;

/// Errors that make a build fail outright.
///
/// Conversion problems never appear here: the converter chain reports them
/// as an absent rendering instead.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid DOCX archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Part '{0}' not found in DOCX")]
    MissingPart(String),

    #[error("Malformed XML in '{part}': {source}")]
    Xml {
        part: String,
        #[source]
        source: roxmltree::Error,
    },

    #[error("Unexpected document structure in '{part}': {reason}")]
    Structure { part: String, reason: String },

    #[error("Invalid placeholder map: {0}")]
    PlaceholderMap(#[from] serde_json::Error),
}

impl TemplateError {
    /// True when the failure comes from the caller's input rather than the host.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            TemplateError::Archive(_)
                | TemplateError::MissingPart(_)
                | TemplateError::Xml { .. }
                | TemplateError::Structure { .. }
                | TemplateError::PlaceholderMap(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
