use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identificador de una ejecución de flow. Compartido por todas las
/// instancias de esa ejecución; sólo sirve para correlacionar, no ordena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fuente de `RunId`. Se inyecta en el runner; no hay generador global.
pub trait RunIdGenerator: Send + Sync {
    fn generate(&self) -> RunId;
}

/// Generador por defecto: UUID v4 aleatorio.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidRunIdGenerator;

impl RunIdGenerator for UuidRunIdGenerator {
    fn generate(&self) -> RunId {
        RunId(Uuid::new_v4())
    }
}
