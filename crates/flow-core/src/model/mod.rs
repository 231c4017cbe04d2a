//! Modelo inmutable del programa a ejecutar: especificaciones, identificador
//! de ejecución y opciones de arranque de cada instancia.

mod options;
mod run_id;
mod spec;

pub use options::{Arguments, FlowletOptions, ProgramOptions};
pub use run_id::{RunId, RunIdGenerator, UuidRunIdGenerator};
pub use spec::{ApplicationSpecification, FlowSpecification, ProcessorKind, Program, WorkerDefinition};
