//! flow-adapters
//!
//! Implementaciones en proceso de los contratos externos del orquestador:
//! - `memory`: `InMemoryLauncher`, instancias como tareas tokio con inyección
//!   de fallos.
//! - `journal`: diario ordenado de las primitivas que aplicó cada instancia.

pub mod journal;
pub mod memory;

pub use journal::{ControlAction, ControlJournal, ControlRecord};
pub use memory::{InMemoryController, InMemoryLauncher, InstanceSnapshot, InstanceStatus};
