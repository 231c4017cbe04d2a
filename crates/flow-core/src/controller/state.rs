use serde::{Deserialize, Serialize};

/// Estado observable de un controlador.
///
/// Transiciones del flow:
/// - `Alive` -> `Suspending` -> `Suspended`
/// - `Suspended` -> `Resuming` -> `Alive`
/// - `Alive` | `Suspended` -> `Stopping` -> `Stopped`
///
/// `Stopped` es terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerState {
    Alive,
    Suspending,
    Suspended,
    Resuming,
    Stopping,
    Stopped,
}
