use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Broad failure class, used by the UI and CLI to word messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Source unreachable, unreadable, badly encoded or malformed.
    Load,
    /// A required column is absent from the source.
    Schema,
    /// Invalid configuration file or values.
    Config,
    /// Writing the filtered table failed.
    Export,
}

/// Error types for the library
#[derive(Error, Debug)]
pub enum Error {
    #[error("reading {location}: {err}")]
    Io {
        location: String,
        #[source]
        err: std::io::Error,
    },

    #[error("fetching {url}: {err}")]
    Fetch {
        url: String,
        #[source]
        err: reqwest::Error,
    },

    #[error("fetching {url}: server answered HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("decoding {location} as {encoding}: invalid byte 0x{byte:02X} at offset {offset}")]
    Decode {
        location: String,
        encoding: &'static str,
        offset: usize,
        byte: u8,
    },

    #[error("parsing CSV from {location}: {err}")]
    Csv {
        location: String,
        #[source]
        err: csv::Error,
    },

    #[error("{location} line {line}: {fields} fields, header has {expected}")]
    RaggedRow {
        location: String,
        line: u64,
        fields: usize,
        expected: usize,
    },

    #[error("{location} is missing required columns: {}", .columns.join(", "))]
    MissingColumns {
        location: String,
        columns: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("configuration syntax: {0}")]
    ConfigSyntax(#[from] toml::de::Error),

    #[error("writing CSV: {0}")]
    ExportCsv(#[from] csv::Error),

    #[error("writing JSON: {0}")]
    ExportJson(#[from] serde_json::Error),

    #[error("CSV output is not UTF-8: {0}")]
    ExportUtf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Map the error onto the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io { .. }
            | Error::Fetch { .. }
            | Error::HttpStatus { .. }
            | Error::Decode { .. }
            | Error::Csv { .. }
            | Error::RaggedRow { .. } => ErrorKind::Load,
            Error::MissingColumns { .. } => ErrorKind::Schema,
            Error::Config(_) | Error::ConfigSyntax(_) => ErrorKind::Config,
            Error::ExportCsv(_) | Error::ExportJson(_) | Error::ExportUtf8(_) => {
                ErrorKind::Export
            }
        }
    }
}
