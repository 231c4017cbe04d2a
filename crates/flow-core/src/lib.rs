//! flow-core: orquestador de flows.
//!
//! Arranca, suspende, reanuda, detiene y reescala en caliente un conjunto de
//! instancias de flowlets que forman una única ejecución lógica. Las
//! instancias sólo se ven a través de `ProgramController`; cómo se arrancan
//! lo decide un `FlowletLauncher`.
pub mod broadcast;
pub mod constants;
pub mod controller;
pub mod errors;
pub mod flow;
pub mod launcher;
pub mod model;
pub mod runner;
pub mod table;

pub use broadcast::{broadcast, BroadcastPolicy, BroadcastReport, Signal};
pub use controller::{ControllerState, ProgramController, SharedController};
pub use errors::{ControllerError, FlowError, LaunchError};
pub use flow::{parse_instances_command, FlowController};
pub use launcher::FlowletLauncher;
pub use model::{ApplicationSpecification, Arguments, FlowSpecification, FlowletOptions, ProcessorKind, Program,
                ProgramOptions, RunId, RunIdGenerator, UuidRunIdGenerator, WorkerDefinition};
pub use runner::FlowProgramRunner;
pub use table::{InstanceKey, InstanceTable};
