//! Opciones de arranque de programas e instancias.
//!
//! Los argumentos de sistema de cada instancia (`instanceId`, `instances`,
//! `runId`) viajan como strings, igual que cualquier otro argumento; los
//! accesores tipados de `FlowletOptions` los vuelven a interpretar.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::RunId;

pub const ARG_INSTANCE_ID: &str = "instanceId";
pub const ARG_INSTANCES: &str = "instances";
pub const ARG_RUN_ID: &str = "runId";

/// Mapa ordenado de argumentos string -> string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arguments(BTreeMap<String, String>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Opciones con las que se ejecuta un programa completo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramOptions {
    pub name: String,
    pub arguments: Arguments,
    pub user_arguments: Arguments,
}

impl ProgramOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(),
               ..Self::default() }
    }

    pub fn with_user_argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_arguments = self.user_arguments.with(key, value);
        self
    }
}

/// Opciones de arranque de una instancia de flowlet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowletOptions {
    pub name: String,
    pub arguments: Arguments,
    pub user_arguments: Arguments,
}

impl FlowletOptions {
    pub fn new(name: impl Into<String>, instance_id: u32, instances: u32, run_id: RunId) -> Self {
        let arguments = Arguments::new().with(ARG_INSTANCE_ID, instance_id.to_string())
                                        .with(ARG_INSTANCES, instances.to_string())
                                        .with(ARG_RUN_ID, run_id.to_string());
        Self { name: name.into(),
               arguments,
               user_arguments: Arguments::new() }
    }

    pub fn with_user_arguments(mut self, user_arguments: Arguments) -> Self {
        self.user_arguments = user_arguments;
        self
    }

    pub fn instance_id(&self) -> Option<u32> {
        self.arguments.get(ARG_INSTANCE_ID).and_then(|v| v.parse().ok())
    }

    pub fn instances(&self) -> Option<u32> {
        self.arguments.get(ARG_INSTANCES).and_then(|v| v.parse().ok())
    }

    pub fn run_id(&self) -> Option<&str> {
        self.arguments.get(ARG_RUN_ID)
    }
}
