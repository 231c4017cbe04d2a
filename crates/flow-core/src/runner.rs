//! Runner de programas de tipo flow.
//!
//! Valida el programa, genera un `RunId`, arranca todas las instancias
//! iniciales y entrega la tabla resultante a un `FlowController` nuevo. Si
//! cualquier arranque falla no se devuelve controlador: se paran las
//! instancias ya arrancadas y se propaga el error original.
use std::sync::Arc;

use log::{debug, error, info};

use crate::broadcast::{broadcast, BroadcastPolicy, Signal};
use crate::errors::{FlowError, LaunchError};
use crate::flow::FlowController;
use crate::launcher::FlowletLauncher;
use crate::model::{Arguments, FlowSpecification, FlowletOptions, ProcessorKind, Program, ProgramOptions, RunId,
                   RunIdGenerator, UuidRunIdGenerator};
use crate::table::InstanceTable;

pub struct FlowProgramRunner {
    launcher: Arc<dyn FlowletLauncher>,
    run_ids: Arc<dyn RunIdGenerator>,
    policy: BroadcastPolicy,
}

impl FlowProgramRunner {
    pub fn new(launcher: Arc<dyn FlowletLauncher>) -> Self {
        Self { launcher,
               run_ids: Arc::new(UuidRunIdGenerator),
               policy: BroadcastPolicy::default() }
    }

    pub fn with_run_ids(mut self, run_ids: Arc<dyn RunIdGenerator>) -> Self {
        self.run_ids = run_ids;
        self
    }

    /// Política de espera para todos los broadcasts de los controladores que
    /// cree este runner.
    pub fn with_policy(mut self, policy: BroadcastPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn run(&self, program: Program, options: ProgramOptions) -> Result<FlowController, FlowError> {
        let spec = validate(&program)?.clone();
        let run_id = self.run_ids.generate();
        info!("Starting flow: {} run={}", spec.name, run_id);

        let table = self.create_flowlets(&program, &spec, run_id, &options.user_arguments).await?;
        info!("Flow started: {} with {} instances", spec.name, table.len());

        Ok(FlowController::new(Arc::new(program),
                               spec,
                               run_id,
                               options.user_arguments,
                               self.launcher.clone(),
                               self.policy,
                               table))
    }

    async fn create_flowlets(&self,
                             program: &Program,
                             spec: &FlowSpecification,
                             run_id: RunId,
                             user_arguments: &Arguments)
                             -> Result<InstanceTable, FlowError> {
        let mut table = InstanceTable::new();
        for (flowlet, definition) in &spec.flowlets {
            table.ensure_row(flowlet);
            for instance_id in 0..definition.instances {
                let options = FlowletOptions::new(flowlet.as_str(), instance_id, definition.instances, run_id)
                    .with_user_arguments(user_arguments.clone());
                match self.launcher.launch(program, options).await {
                    Ok(controller) => {
                        table.put(flowlet, instance_id, controller);
                        debug!("started {flowlet}[{instance_id}] of {}", definition.instances);
                    }
                    Err(e) => {
                        error!("launch of {flowlet}[{instance_id}] failed for flow {}: {e}", spec.name);
                        let report = broadcast(table.drain(), Signal::Stop, self.policy).await;
                        if !report.is_complete() {
                            error!("Fail to stop all flowlets on failure: {} of {} did not stop",
                                   report.failures.len(),
                                   report.attempted());
                        }
                        return Err(e.into());
                    }
                }
            }
        }
        Ok(table)
    }
}

fn validate(program: &Program) -> Result<&FlowSpecification, LaunchError> {
    let kind = program.processor_kind
                      .ok_or_else(|| LaunchError::InvalidProgram("missing processor type".into()))?;
    if kind != ProcessorKind::Flow {
        return Err(LaunchError::InvalidProgram(format!("only Flow processor type is supported, got {kind:?}")));
    }
    if program.application.is_none() {
        return Err(LaunchError::InvalidProgram("missing application specification".into()));
    }
    let spec = program.flow_specification()
                      .ok_or_else(|| LaunchError::MissingDefinition(program.name.clone()))?;
    if let Some((flowlet, _)) = spec.flowlets.iter().find(|(_, d)| d.instances == 0) {
        return Err(LaunchError::InvalidProgram(format!("flowlet {flowlet} declares zero instances")));
    }
    Ok(spec)
}
