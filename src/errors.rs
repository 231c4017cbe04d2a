use flow_core::FlowError;
use thiserror::Error;

/// Errores de la aplicación (binario y configuración).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error(transparent)]
    Flow(#[from] FlowError),
}
