//! Constantes del protocolo de control.

/// Nombre del comando que cambia el número de instancias. A nivel de flow el
/// payload es un objeto flowlet -> total; a nivel de instancia, el total.
pub const INSTANCES_COMMAND: &str = "instances";
