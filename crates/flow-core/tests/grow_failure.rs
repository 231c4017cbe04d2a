mod test_support;

use std::sync::Arc;

use flow_adapters::{ControlAction, InMemoryLauncher};
use flow_core::{FlowError, LaunchError};
use serde_json::json;
use test_support::{actions_since, instances, mark, start};

#[tokio::test]
async fn failed_grow_rolls_back_to_previous_count() {
    let launcher = Arc::new(InMemoryLauncher::new());
    let flow = start(launcher.clone(), &[("source", 2)]).await;
    launcher.fail_launch("source", 3, "quota exceeded");
    let journal = launcher.journal();

    let before = mark(journal);
    let err = flow.change_instances("source", 5).await.err().expect("grow must fail");
    assert_eq!(err, FlowError::Launch(LaunchError::flowlet("source", 3, "quota exceeded")));

    assert_eq!(flow.live_instances("source").await, vec![0, 1]);
    assert_eq!(launcher.live_instances("source"), vec![0, 1]);
    assert_eq!(actions_since(journal, before, "source", 2),
               vec![ControlAction::Started { instances: 5 }, ControlAction::Stopped]);
    for id in [0, 1] {
        assert_eq!(actions_since(journal, before, "source", id), vec![instances(5), instances(2)]);
        assert_eq!(launcher.snapshot("source", id).map(|s| s.instances), Some(2));
    }
}

#[tokio::test]
async fn failed_grow_through_command_is_swallowed() {
    let launcher = Arc::new(InMemoryLauncher::new());
    let flow = start(launcher.clone(), &[("source", 1), ("sink", 1)]).await;
    launcher.fail_launch("source", 1, "quota exceeded");

    flow.command("instances", json!({"source": 3, "sink": 2})).await.expect("command never fails on launch errors");

    assert_eq!(flow.live_instances("source").await, vec![0]);
    assert_eq!(flow.live_instances("sink").await, vec![0, 1]);

    launcher.clear_launch_failures();
    flow.change_instances("source", 3).await.expect("grow after clearing failure");
    assert_eq!(flow.live_instances("source").await, vec![0, 1, 2]);
}
