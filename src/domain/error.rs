//! Domain error types.
//!
//! Missing observations are not errors: they travel through the pipeline as
//! `None` cells. Asset sets that differ between tables are intersected, not
//! rejected. Everything here is a hard failure that stops a run.

/// Top-level error type for xsmom.
#[derive(Debug, thiserror::Error)]
pub enum XsmomError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("malformed table: {reason}")]
    Table { reason: String },

    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl XsmomError {
    pub fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        XsmomError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn table(reason: impl Into<String>) -> Self {
        XsmomError::Table {
            reason: reason.into(),
        }
    }

    pub fn data(reason: impl Into<String>) -> Self {
        XsmomError::Data {
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for XsmomError {
    fn from(err: csv::Error) -> Self {
        XsmomError::data(format!("CSV error: {err}"))
    }
}

impl From<&XsmomError> for std::process::ExitCode {
    fn from(err: &XsmomError) -> Self {
        let code: u8 = match err {
            XsmomError::Io(_) => 1,
            XsmomError::InvalidParameter { .. }
            | XsmomError::ConfigParse { .. }
            | XsmomError::ConfigMissing { .. }
            | XsmomError::ConfigInvalid { .. } => 2,
            XsmomError::NoData { .. } | XsmomError::Data { .. } => 3,
            XsmomError::Table { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
