mod test_support;

use std::sync::Arc;
use std::time::Duration;

use flow_adapters::{ControlAction, InMemoryLauncher};
use flow_core::ControllerState;
use test_support::{instances, mark, start};

#[tokio::test]
async fn suspend_waits_for_running_rescale() {
    let launcher = Arc::new(InMemoryLauncher::new().with_control_delay(Duration::from_millis(20)));
    let flow = Arc::new(start(launcher.clone(), &[("source", 3), ("sink", 1)]).await);
    let journal = launcher.journal();
    let before = mark(journal);

    let rescale = {
        let flow = flow.clone();
        tokio::spawn(async move { flow.change_instances("source", 1).await })
    };
    tokio::time::sleep(Duration::from_millis(5)).await;
    let suspend = {
        let flow = flow.clone();
        tokio::spawn(async move { flow.suspend().await })
    };

    rescale.await.expect("join").expect("rescale");
    suspend.await.expect("join").expect("suspend");

    let records = journal.since(before);
    let (rescale_part, suspend_part) = records.split_at(5);
    let rescale_actions: Vec<(u32, ControlAction)> =
        rescale_part.iter().map(|r| (r.instance_id, r.action.clone())).collect();
    assert_eq!(&rescale_actions[2..],
               &[(0, ControlAction::Suspended), (0, instances(1)), (0, ControlAction::Resumed)]);
    assert!(rescale_part[..2].iter().all(|r| r.action == ControlAction::Stopped && r.instance_id >= 1));

    assert_eq!(suspend_part.len(), 2);
    assert!(suspend_part.iter().all(|r| r.action == ControlAction::Suspended));
    assert_eq!(flow.state(), ControllerState::Suspended);
}

#[tokio::test]
async fn concurrent_rescales_leave_table_contiguous() {
    let launcher = Arc::new(InMemoryLauncher::new());
    let flow = Arc::new(start(launcher.clone(), &[("source", 2)]).await);

    let mut tasks = Vec::new();
    for target in [5u32, 1, 4, 0, 3, 2, 6] {
        let flow = flow.clone();
        tasks.push(tokio::spawn(async move { flow.change_instances("source", target).await }));
    }
    for task in tasks {
        task.await.expect("join").expect("rescale");
    }

    let live = flow.live_instances("source").await;
    let expected: Vec<u32> = (0..live.len() as u32).collect();
    assert_eq!(live, expected);
    assert_eq!(launcher.live_instances("source"), live);
}
