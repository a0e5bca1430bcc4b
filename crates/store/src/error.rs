use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid session key: {0:?}")]
    InvalidKey(String),
    #[error("Lock timeout: {}", .0.display())]
    LockTimeout(PathBuf),
    #[error("Invalid charge amount: {0}")]
    InvalidAmount(f64),
}
