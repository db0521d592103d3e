use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("XML processing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Mapping file is missing required columns: {}", missing.join(", "))]
    MalformedMapping { missing: Vec<String> },

    #[error("Source document is malformed: {message}")]
    DocumentStructure { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for '{field}' ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn document(message: impl Into<String>) -> Self {
        Self::DocumentStructure {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::XmlError(_)
            | Self::CsvError(_)
            | Self::MalformedMapping { .. }
            | Self::DocumentStructure { .. } => ErrorCategory::Input,
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::ProcessingError { .. } => ErrorCategory::Processing,
            Self::ZipError(_) | Self::IoError(_) => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::IoError(_) | Self::ZipError(_) => ErrorSeverity::Critical,
            Self::ProcessingError { .. } => ErrorSeverity::Medium,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::MalformedMapping { .. } => {
                "Add the missing columns to the mapping CSV header: current_customer_id, new_customer_id, new_store_id, new_store_name, new_source_id, mandatory_reference, delivery_day"
            }
            Self::XmlError(_) | Self::DocumentStructure { .. } => {
                "Check that the customer export is a complete, well-formed XML file"
            }
            Self::CsvError(_) => "Check that the mapping file is valid comma-separated CSV",
            Self::TomlError(_) => "Check the TOML syntax of the configuration file",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => {
                "Review the command line arguments and configuration file"
            }
            Self::IoError(_) | Self::ZipError(_) => {
                "Check that the input files exist and the output directory is writable"
            }
            Self::ProcessingError { .. } => "Re-run the migration; the inputs were not modified",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::MalformedMapping { missing } => format!(
                "The mapping file cannot be used, it lacks the columns: {}",
                missing.join(", ")
            ),
            Self::IoError(e) => format!("Could not read or write a file: {}", e),
            Self::XmlError(e) => format!("The customer export could not be parsed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
