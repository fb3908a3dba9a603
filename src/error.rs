//! Error types for the cmpc compiler

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Parse error in {file} at line {line}: {message}")]
    Parse { file: String, line: usize, message: String },

    #[error("Transform error in {file}: {message}")]
    Transform { file: String, message: String },

    #[error("Style optimization error in {file}: {message}")]
    Optimize { file: String, message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },
}

pub type Result<T> = std::result::Result<T, CompilerError>;

impl CompilerError {
    pub fn parse(file: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    pub fn transform(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transform {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn optimize(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Optimize {
            file: file.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }
}
