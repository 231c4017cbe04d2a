//! Contrato de control de una instancia en ejecución y estados de ciclo de vida.

mod handle;
mod state;

pub use handle::{ProgramController, SharedController};
pub use state::ControllerState;
