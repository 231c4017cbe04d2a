//! Controlador agregado de un flow en ejecución.

mod controller;
mod rescale;

pub use controller::{parse_instances_command, FlowController};
