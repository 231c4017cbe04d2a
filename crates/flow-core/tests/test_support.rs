#![allow(dead_code)]

use std::sync::Arc;

use flow_adapters::{ControlAction, ControlJournal, InMemoryLauncher};
use flow_core::{FlowController, FlowProgramRunner, FlowSpecification, Program, ProgramOptions};
use serde_json::json;

pub fn program(flowlets: &[(&str, u32)]) -> Program {
    let spec = flowlets.iter()
                       .fold(FlowSpecification::new("wordcount"), |spec, (name, n)| spec.with_flowlet(*name, *n));
    Program::for_flow("app", spec)
}

pub async fn start(launcher: Arc<InMemoryLauncher>, flowlets: &[(&str, u32)]) -> FlowController {
    FlowProgramRunner::new(launcher).run(program(flowlets), ProgramOptions::new("wordcount"))
                                    .await
                                    .expect("flow should start")
}

/// Acciones de una instancia registradas desde `mark`.
pub fn actions_since(journal: &ControlJournal, mark: u64, flowlet: &str, instance_id: u32) -> Vec<ControlAction> {
    journal.since(mark)
           .into_iter()
           .filter(|r| r.flowlet == flowlet && r.instance_id == instance_id)
           .map(|r| r.action)
           .collect()
}

pub fn instances(total: u32) -> ControlAction {
    ControlAction::Command { name: "instances".into(),
                             value: json!(total) }
}

pub fn mark(journal: &ControlJournal) -> u64 {
    journal.len() as u64
}
