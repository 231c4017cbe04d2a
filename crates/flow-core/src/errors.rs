//! Errores del orquestador de flows.
//!
//! Tres familias:
//! - `LaunchError`: no se pudo arrancar una instancia (o el programa no es
//!   ejecutable como flow). Es fatal para `run`.
//! - `ControllerError`: una instancia individual no confirmó una señal. Nunca
//!   sale del controlador agregado; sólo se registra.
//! - `FlowError`: lo que ve quien opera un `FlowController`.

use thiserror::Error;

use crate::controller::ControllerState;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LaunchError {
    #[error("invalid program: {0}")]
    InvalidProgram(String),
    #[error("missing flow specification for {0}")]
    MissingDefinition(String),
    #[error("flowlet {flowlet}[{instance_id}] failed to launch: {reason}")]
    Flowlet { flowlet: String, instance_id: u32, reason: String },
}

impl LaunchError {
    pub fn flowlet(flowlet: &str, instance_id: u32, reason: impl Into<String>) -> Self {
        Self::Flowlet { flowlet: flowlet.to_string(),
                        instance_id,
                        reason: reason.into() }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControllerError {
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("instance unavailable")]
    Unavailable,
    #[error("timed out after {0}ms")]
    Timeout(u64),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("cannot {op} flow in state {state:?}")]
    IllegalState { op: &'static str, state: ControllerState },
    #[error("unknown flowlet: {0}")]
    UnknownFlowlet(String),
    #[error("instance table invariant violated for {flowlet}: ids {ids:?}")]
    InvariantViolation { flowlet: String, ids: Vec<u32> },
    #[error("invalid command payload for {name}: {reason}")]
    InvalidCommand { name: String, reason: String },
    /// La tarea de la operación fue cancelada por el runtime (apagado).
    #[error("{op} aborted: {reason}")]
    Aborted { op: &'static str, reason: String },
}
