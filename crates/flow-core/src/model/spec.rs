//! Especificaciones estáticas de aplicación y flow.
//!
//! Se construyen una vez antes de cualquier ejecución y no se mutan. El orden
//! de declaración de los flowlets se conserva (`IndexMap`) porque el runner
//! arranca las instancias siguiendo ese orden.
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tipo de procesador de un programa. Sólo `Flow` lo ejecuta el runner de
/// flows; el resto pertenece a otros runners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorKind {
    Flow,
    Flowlet,
    Procedure,
    MapReduce,
}

/// Definición de un flowlet dentro del flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDefinition {
    /// Número de instancias solicitadas al arrancar.
    pub instances: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSpecification {
    pub name: String,
    pub flowlets: IndexMap<String, WorkerDefinition>,
}

impl FlowSpecification {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               flowlets: IndexMap::new() }
    }

    /// Añade (o reemplaza) un flowlet con su número de instancias.
    pub fn with_flowlet(mut self, name: impl Into<String>, instances: u32) -> Self {
        self.flowlets.insert(name.into(), WorkerDefinition { instances });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSpecification {
    pub name: String,
    pub flows: IndexMap<String, FlowSpecification>,
}

impl ApplicationSpecification {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               flows: IndexMap::new() }
    }

    pub fn with_flow(mut self, flow: FlowSpecification) -> Self {
        self.flows.insert(flow.name.clone(), flow);
        self
    }
}

/// Programa entregado al runner. Los campos opcionales reflejan que la
/// especificación llega de una capa externa que puede no haberla resuelto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub processor_kind: Option<ProcessorKind>,
    pub application: Option<ApplicationSpecification>,
}

impl Program {
    /// Programa de tipo flow cuya aplicación contiene únicamente `flow`.
    pub fn for_flow(app_name: impl Into<String>, flow: FlowSpecification) -> Self {
        let name = flow.name.clone();
        Self { name,
               processor_kind: Some(ProcessorKind::Flow),
               application: Some(ApplicationSpecification::new(app_name).with_flow(flow)) }
    }

    /// Especificación del flow con el mismo nombre que el programa.
    pub fn flow_specification(&self) -> Option<&FlowSpecification> {
        self.application.as_ref().and_then(|app| app.flows.get(&self.name))
    }
}
