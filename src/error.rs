use std::{error::Error as _, num::ParseFloatError};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum CumulusErr {
    #[error("Invalid input; {0}")]
    InvalidInput(String),

    #[error("Forbidden; {0}")]
    Forbidden(String),

    #[error("Does not exist; {0}")]
    DoesNotExist(String),

    #[error("Entity already exists; {0}")]
    AlreadyExists(String),

    #[error("Storage quota exceeded; {0}")]
    QuotaExceeded(String),

    #[error("Unsupported media type; {0}")]
    UnsupportedMediaType(String),

    #[error("Invalid media metadata; {0}")]
    InvalidMetadata(String),

    #[error("Media probe failed; {0}")]
    MediaProbe(String),

    #[error("parse configuration: {0}")]
    ParseConfig(String),

    #[error("IO; {0}")]
    IO(#[from] std::io::Error),

    #[error("SQL; {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("JSON error; {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Parse float; {0}")]
    ParseFloat(#[from] ParseFloatError),
}

#[derive(Debug, Error)]
#[error("{error}")]
pub struct CumulusError {
    file: &'static str,
    line: u32,
    column: u32,
    pub error: CumulusErr,
}

impl CumulusError {
    pub fn new(file: &'static str, line: u32, column: u32, error: CumulusErr) -> CumulusError {
        CumulusError {
            file,
            line,
            column,
            error,
        }
    }

    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }

    pub fn print(&self) {
        let location = self.location();

        error!("{location} | {self}");

        if self.error.source().is_some() {
            error!("Causes:");
        }

        let mut src = self.error.source();
        while let Some(source) = src {
            error!(" - {source}");
            src = source.source();
        }
    }
}

#[macro_export]
macro_rules! err {
    ($ty:ident $(, $l:literal $(,)? $($args:expr),* )?) => {
        Err($crate::error::CumulusError::new(
            file!(),
            line!(),
            column!(),
            $crate::error::CumulusErr::$ty $( (format!($l, $( $args, )*)) )?,
        ))
    };
}

#[macro_export]
macro_rules! map_err {
    ($ex:expr) => {
        $ex.map_err(|e| $crate::error::CumulusError::new(file!(), line!(), column!(), e.into()))?
    };
}
