use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ControllerError;

/// Handle de control de una instancia ya arrancada.
///
/// Cada operación completa de forma independiente de las demás; el
/// orquestador las lanza en paralelo sobre muchas instancias y espera a todas.
/// Arrancar no forma parte del trait: un handle sólo existe una vez que el
/// `FlowletLauncher` devolvió la instancia en marcha.
#[async_trait]
pub trait ProgramController: Send + Sync {
    async fn suspend(&self) -> Result<(), ControllerError>;

    async fn resume(&self) -> Result<(), ControllerError>;

    async fn stop(&self) -> Result<(), ControllerError>;

    /// Comando genérico. El orquestador sólo emite `"instances"` con el nuevo
    /// total como número.
    async fn command(&self, name: &str, value: Value) -> Result<(), ControllerError>;
}

pub type SharedController = Arc<dyn ProgramController>;
