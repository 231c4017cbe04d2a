use async_trait::async_trait;

use crate::controller::SharedController;
use crate::errors::LaunchError;
use crate::model::{FlowletOptions, Program};

/// Arranca instancias de flowlet.
///
/// Devuelve el handle de una instancia ya en marcha. Las opciones llevan el
/// id de instancia, el total de instancias y el `RunId` de la ejecución.
#[async_trait]
pub trait FlowletLauncher: Send + Sync {
    async fn launch(&self, program: &Program, options: FlowletOptions) -> Result<SharedController, LaunchError>;
}
