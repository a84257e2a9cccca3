//! Error types for the PIXID core
//!
//! Provides error handling for:
//! - Document parsing (bytes → tree)
//! - Path expressions (mapping configuration)
//! - Configuration and order-book ingestion
//!
//! Missing fields, unmatched contracts and documents without contracts are
//! not errors; they are reported as data in the run output.

use std::path::PathBuf;

/// Errors while reading an XML document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Tokenizer could not recover from malformed input
    #[error("malformed xml near byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Input holds no element at all
    #[error("document has no root element")]
    NoRoot,

    /// Declared encoding is not a known label
    #[error("unsupported document encoding '{0}'")]
    UnsupportedEncoding(String),

    /// Bytes are not valid in the document encoding
    #[error("document is not valid {encoding}")]
    Encoding { encoding: String },
}

impl DocumentError {
    /// Create syntax error at byte position
    pub fn syntax(position: u64, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Errors in path expressions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Expression has no name test
    #[error("empty path expression")]
    Empty,

    /// Two separators with nothing between them
    #[error("path '{0}' contains an empty step")]
    EmptyStep(String),

    /// Single-rooted absolute paths would escape the contract
    #[error("absolute path '{0}' cannot be scoped to a contract")]
    Absolute(String),

    /// Namespace prefix not in the known prefix table
    #[error("unknown namespace prefix '{0}'")]
    UnknownPrefix(String),

    /// Predicates, axes, wildcards and functions are not supported
    #[error("unsupported step '{0}' (only name tests are allowed)")]
    UnsupportedStep(String),
}

/// Errors while loading or compiling a mapping configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error during config read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML syntax or shape error
    #[error("invalid yaml config: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// JSON syntax or shape error
    #[error("invalid json config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Mapping target is not a valid path expression
    #[error("invalid path for mapping '{field}': {source}")]
    InvalidPath {
        field: String,
        #[source]
        source: PathError,
    },

    /// Classification pattern does not compile
    #[error("invalid classification regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

impl ConfigError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors while ingesting order records
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// IO error during record file read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON syntax error
    #[error("invalid json orders: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// CSV syntax error
    #[error("invalid csv orders: {0}")]
    InvalidCsv(#[from] csv::Error),

    /// CSV has no order key column
    #[error("missing key column '{0}'")]
    MissingKeyColumn(String),

    /// JSON is neither a list of objects nor an object keyed by order id
    #[error("unexpected json shape: expected a list of objects or an object keyed by order id")]
    UnexpectedShape,

    /// File extension does not name a known record format
    #[error("unsupported order file extension: '{0}'")]
    UnsupportedFormat(String),
}

impl RecordError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Combined error for the public entry points
#[derive(Debug, thiserror::Error)]
pub enum PixidError {
    /// Document could not be parsed
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Path expression is malformed
    #[error("path error: {0}")]
    Path(#[from] PathError),

    /// Configuration could not be loaded or compiled
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Order records could not be loaded
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// Summary rows could not be written
    #[error("summary export error: {0}")]
    Export(#[from] csv::Error),
}

/// Result type alias for PIXID operations
pub type PixidResult<T> = Result<T, PixidError>;
