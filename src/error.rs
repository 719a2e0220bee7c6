use ehsebo_config::ConfigError;
use ehsebo_core::CoreError;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Errors surfaced by [`crate::BudgetApp`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Budget not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Returns `true` when the input was rejected before anything was stored.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::Core(CoreError::Validation(_)) | AppError::Config(ConfigError::Invalid(_))
        )
    }
}
