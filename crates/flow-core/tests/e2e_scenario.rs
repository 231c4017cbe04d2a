mod test_support;

use std::sync::Arc;

use flow_adapters::{ControlAction, InMemoryLauncher, InstanceStatus};
use flow_core::ControllerState;
use serde_json::json;
use test_support::{actions_since, instances, mark, start};

#[tokio::test]
async fn source_grows_to_four_then_shrinks_to_one() {
    let launcher = Arc::new(InMemoryLauncher::new());
    let flow = start(launcher.clone(), &[("source", 2)]).await;
    let journal = launcher.journal();

    assert_eq!(flow.state(), ControllerState::Alive);
    assert_eq!(flow.live_instances("source").await, vec![0, 1]);

    let before_grow = mark(journal);
    flow.command("instances", json!({"source": 4})).await.expect("command accepted");
    assert_eq!(flow.live_instances("source").await, vec![0, 1, 2, 3]);
    for id in [0, 1] {
        assert_eq!(actions_since(journal, before_grow, "source", id), vec![instances(4)]);
    }
    for id in [2, 3] {
        assert_eq!(actions_since(journal, before_grow, "source", id),
                   vec![ControlAction::Started { instances: 4 }]);
    }
    assert!((0..4).all(|id| launcher.snapshot("source", id).map(|s| s.instances) == Some(4)));

    let before_shrink = mark(journal);
    flow.change_instances("source", 1).await.expect("shrink");
    assert_eq!(flow.live_instances("source").await, vec![0]);
    for id in [1, 2, 3] {
        assert_eq!(actions_since(journal, before_shrink, "source", id), vec![ControlAction::Stopped]);
    }
    assert_eq!(actions_since(journal, before_shrink, "source", 0),
               vec![ControlAction::Suspended, instances(1), ControlAction::Resumed]);
    assert_eq!(launcher.live_instances("source"), vec![0]);

    flow.stop().await.expect("stop");
    assert_eq!(flow.state(), ControllerState::Stopped);
    assert_eq!(launcher.snapshot("source", 0).map(|s| s.status), Some(InstanceStatus::Stopped));
    assert!(flow.instance_counts().await.is_empty());
}

#[tokio::test]
async fn ids_stay_contiguous_across_rescale_sequence() {
    let launcher = Arc::new(InMemoryLauncher::new());
    let flow = start(launcher.clone(), &[("source", 2), ("counter", 1)]).await;

    for target in [3u32, 1, 5, 0, 2, 2, 4, 1] {
        flow.change_instances("source", target).await.expect("rescale");
        let expected: Vec<u32> = (0..target).collect();
        assert_eq!(flow.live_instances("source").await, expected, "after rescale to {target}");
        assert_eq!(launcher.live_instances("source"), expected, "launcher view after rescale to {target}");
        assert_eq!(flow.live_instances("counter").await, vec![0]);
    }

    let counts = flow.instance_counts().await;
    assert_eq!(counts.get("source"), Some(&1));
    assert_eq!(counts.get("counter"), Some(&1));
}

#[tokio::test]
async fn all_instances_share_the_run_id() {
    let launcher = Arc::new(InMemoryLauncher::new());
    let flow = start(launcher.clone(), &[("source", 2), ("sink", 1)]).await;
    flow.change_instances("sink", 3).await.expect("grow");

    let run_id = flow.run_id().to_string();
    let records = launcher.journal().records();
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r.run_id == run_id));
}
