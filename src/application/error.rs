use thiserror::Error;

use crate::{config::LoadError, infra::error::InfraError};

/// Failures that end the console session.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("console io error: {0}")]
    Io(#[from] std::io::Error),
}
