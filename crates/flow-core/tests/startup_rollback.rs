mod test_support;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use flow_adapters::{ControlAction, InMemoryLauncher};
use flow_core::{FlowError, FlowProgramRunner, FlowletLauncher, FlowletOptions, LaunchError, ProcessorKind, Program,
                ProgramOptions, RunId, RunIdGenerator, SharedController};
use test_support::program;
use uuid::Uuid;

#[tokio::test]
async fn failed_launch_stops_everything_already_started() {
    let launcher = Arc::new(InMemoryLauncher::new());
    launcher.fail_launch("sink", 1, "no capacity");

    let result = FlowProgramRunner::new(launcher.clone()).run(program(&[("source", 3), ("sink", 2)]),
                                                              ProgramOptions::new("wordcount"))
                                                         .await;

    match result {
        Err(FlowError::Launch(LaunchError::Flowlet { flowlet, instance_id, reason })) => {
            assert_eq!((flowlet.as_str(), instance_id, reason.as_str()), ("sink", 1, "no capacity"));
        }
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("no controller may be returned for a failed run"),
    }

    let journal = launcher.journal();
    for (flowlet, id) in [("source", 0), ("source", 1), ("source", 2), ("sink", 0)] {
        assert_eq!(journal.actions_for(flowlet, id),
                   vec![ControlAction::Started { instances: if flowlet == "source" { 3 } else { 2 } },
                        ControlAction::Stopped],
                   "{flowlet}[{id}]");
    }
    assert!(journal.actions_for("sink", 1).is_empty());
    assert!(launcher.live_instances("source").is_empty());
    assert!(launcher.live_instances("sink").is_empty());
}

#[tokio::test]
async fn rollback_stop_failures_do_not_mask_launch_error() {
    let launcher = Arc::new(InMemoryLauncher::new());
    launcher.fail_launch("source", 2, "boom");
    launcher.reject_control("source", 0);

    let err = FlowProgramRunner::new(launcher.clone()).run(program(&[("source", 3)]), ProgramOptions::new("wordcount"))
                                                      .await
                                                      .err()
                                                      .expect("run must fail");

    assert_eq!(err, FlowError::Launch(LaunchError::flowlet("source", 2, "boom")));
    assert_eq!(launcher.live_instances("source"), vec![0]);
    assert_eq!(launcher.journal().actions_for("source", 1).last(), Some(&ControlAction::Stopped));
}

#[tokio::test]
async fn invalid_programs_launch_nothing() {
    let launcher = Arc::new(InMemoryLauncher::new());
    let runner = FlowProgramRunner::new(launcher.clone());

    let mut not_a_flow = program(&[("source", 1)]);
    not_a_flow.processor_kind = Some(ProcessorKind::MapReduce);
    let missing_flow = Program { name: "unknown".into(),
                                 ..program(&[("source", 1)]) };

    assert!(matches!(runner.run(not_a_flow, ProgramOptions::default()).await,
                     Err(FlowError::Launch(LaunchError::InvalidProgram(_)))));
    assert!(matches!(runner.run(missing_flow, ProgramOptions::default()).await,
                     Err(FlowError::Launch(LaunchError::MissingDefinition(name))) if name == "unknown"));
    assert!(launcher.journal().is_empty());
}

struct FixedRunIds(Uuid);

impl RunIdGenerator for FixedRunIds {
    fn generate(&self) -> RunId {
        RunId::from_uuid(self.0)
    }
}

/// Registra las opciones recibidas y delega en el launcher en memoria.
struct CapturingLauncher {
    inner: InMemoryLauncher,
    seen: Mutex<Vec<FlowletOptions>>,
}

#[async_trait]
impl FlowletLauncher for CapturingLauncher {
    async fn launch(&self, program: &Program, options: FlowletOptions) -> Result<SharedController, LaunchError> {
        self.seen.lock().expect("lock").push(options.clone());
        self.inner.launch(program, options).await
    }
}

#[tokio::test]
async fn launch_options_carry_run_id_totals_and_user_arguments() {
    let launcher = Arc::new(CapturingLauncher { inner: InMemoryLauncher::new(),
                                                seen: Mutex::new(Vec::new()) });
    let run_uuid = Uuid::new_v4();
    let runner = FlowProgramRunner::new(launcher.clone()).with_run_ids(Arc::new(FixedRunIds(run_uuid)));

    let flow = runner.run(program(&[("source", 2), ("sink", 1)]),
                          ProgramOptions::new("wordcount").with_user_argument("threshold", "7"))
                     .await
                     .expect("flow should start");
    assert_eq!(flow.run_id().as_uuid(), run_uuid);

    flow.change_instances("sink", 2).await.expect("grow");

    let seen = launcher.seen.lock().expect("lock").clone();
    let summary: Vec<(String, Option<u32>, Option<u32>)> =
        seen.iter().map(|o| (o.name.clone(), o.instance_id(), o.instances())).collect();
    assert_eq!(summary,
               vec![("source".to_string(), Some(0), Some(2)),
                    ("source".to_string(), Some(1), Some(2)),
                    ("sink".to_string(), Some(0), Some(1)),
                    ("sink".to_string(), Some(1), Some(2))]);
    let expected_run_id = run_uuid.to_string();
    assert!(seen.iter().all(|o| o.run_id() == Some(expected_run_id.as_str())));
    assert!(seen.iter().all(|o| o.user_arguments.get("threshold") == Some("7")));
}
