//! Demo del orquestador: levanta un flow con el launcher en memoria, lo
//! reescala, lo suspende/reanuda, lo detiene y vuelca el diario de control
//! como JSON, un registro por línea.
use std::sync::Arc;

use flowrun::flow_adapters::InMemoryLauncher;
use flowrun::flow_core::{FlowController, FlowProgramRunner, FlowSpecification, Program, ProgramOptions};
use flowrun::{init_logging, AppError, OrchestratorConfig};
use log::{error, info};
use serde_json::json;

#[tokio::main]
async fn main() {
    let config = match OrchestratorConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("[flowrun] {e}");
            std::process::exit(2);
        }
    };
    init_logging(&config.log_filter);

    let launcher = Arc::new(InMemoryLauncher::new());
    let runner = FlowProgramRunner::new(launcher.clone()).with_policy(config.broadcast_policy());
    let spec = FlowSpecification::new("wordcount").with_flowlet("source", 2)
                                                  .with_flowlet("splitter", 2)
                                                  .with_flowlet("counter", 1);

    let flow = match runner.run(Program::for_flow("demo", spec), ProgramOptions::new("wordcount")).await {
        Ok(flow) => flow,
        Err(e) => {
            error!("flow failed to start: {e}");
            std::process::exit(3);
        }
    };

    if let Err(e) = drive(&flow).await {
        error!("demo aborted: {e}");
        std::process::exit(4);
    }

    for record in launcher.journal().records() {
        match serde_json::to_string(&record) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("cannot serialize record {}: {e}", record.seq),
        }
    }
}

async fn drive(flow: &FlowController) -> Result<(), AppError> {
    info!("run {} started: {:?}", flow.run_id(), flow.instance_counts().await);

    flow.command("instances", json!({"source": 4, "splitter": 3})).await?;
    info!("after grow: {:?}", flow.instance_counts().await);

    flow.suspend().await?;
    flow.resume().await?;

    flow.change_instances("source", 1).await?;
    info!("after shrink: {:?}", flow.instance_counts().await);

    flow.stop().await?;
    Ok(())
}
