//! End-to-end flows through a single node: allocation, heartbeats, release.

use tally_node_state::{
    Container, ContainerState, HeartbeatReport, NodeId, NodeState, Resource,
};
use tally_testing::{application_id, init_tracing};

fn test_node() -> NodeState {
    init_tracing();
    NodeState::new(NodeId::new(), "worker-1", "/rack-a", Resource::memory(1000))
}

#[test]
fn test_allocate_heartbeat_release_scenario() {
    let node = test_node();
    let app1 = application_id(1);
    let c1 = Container::new(app1.container(1), Resource::memory(200));

    node.allocate(app1, &[c1.clone()]).unwrap();
    assert_eq!(node.available_resource(), Resource::memory(800));
    assert_eq!(node.used_resource(), Resource::memory(200));
    assert_eq!(node.num_containers(), 1);

    let response = node.reconcile(&[c1.with_state(ContainerState::Running)]);
    assert!(response.is_empty());
    assert_eq!(node.active_container_ids(), vec![c1.id]);
    assert_eq!(node.available_resource(), Resource::memory(800));
    assert_eq!(node.used_resource(), Resource::memory(200));

    assert!(node.release(&c1.id));
    assert_eq!(node.available_resource(), Resource::memory(1000));
    assert_eq!(node.used_resource(), Resource::ZERO);
    assert_eq!(node.num_containers(), 0);
    assert_eq!(node.pending_cleanup_count(), 1);

    let response = node.reconcile(&[]);
    assert_eq!(response.containers_to_clean_up.len(), 1);
    assert_eq!(response.containers_to_clean_up[0].id, c1.id);
    node.check_invariants().unwrap();
}

#[test]
fn test_allocation_round_trip() {
    let node = test_node();
    let app = application_id(1);
    let c = Container::new(app.container(1), Resource::new(300, 2));
    node.allocate(app, &[c.clone()]).unwrap();
    let ledger_after_allocate = (node.available_resource(), node.used_resource());

    node.reconcile(&[c.with_state(ContainerState::Running)]);
    assert_eq!(
        (node.available_resource(), node.used_resource()),
        ledger_after_allocate
    );
    assert!(node.allocated_container_ids().is_empty());
    assert_eq!(node.active_container_ids(), vec![c.id]);

    let done = c.with_state(ContainerState::Complete);
    let response = node.reconcile(&[done.clone()]);
    assert_eq!(response.completed_containers, vec![done]);
    assert!(node.active_container_ids().is_empty());
    assert_eq!(node.available_resource(), Resource::memory(1000));
    node.check_invariants().unwrap();
}

#[test]
fn test_unknown_container_detection() {
    let node = test_node();
    let stray = Container::new(application_id(9).container(4), Resource::memory(50))
        .with_state(ContainerState::Running);

    let response = node.reconcile(&[stray.clone()]);

    assert_eq!(response.containers_to_clean_up, vec![stray]);
    assert_eq!(node.available_resource(), Resource::memory(1000));
    assert_eq!(node.used_resource(), Resource::ZERO);
}

#[test]
fn test_unknown_complete_container_is_only_reported_complete() {
    let node = test_node();
    let stray = Container::new(application_id(9).container(4), Resource::memory(50))
        .with_state(ContainerState::Complete);

    let response = node.reconcile(&[stray.clone()]);

    assert_eq!(response.completed_containers, vec![stray]);
    assert!(response.containers_to_clean_up.is_empty());
    assert_eq!(node.available_resource(), Resource::memory(1000));
}

#[test]
fn test_consecutive_reconciles_drain_once() {
    let node = test_node();
    let app = application_id(1);
    let c1 = Container::new(app.container(1), Resource::memory(100));
    let c2 = Container::new(app.container(2), Resource::memory(100));
    node.allocate(app, &[c1.clone(), c2.clone()]).unwrap();
    assert!(node.release(&c1.id));
    assert!(node.release(&c2.id));
    node.notify_finished_application(app);

    let first = node.reconcile(&[]);
    let second = node.reconcile(&[]);

    assert_eq!(first.finished_applications, vec![app]);
    let cleaned: Vec<_> = first.containers_to_clean_up.iter().map(|c| c.id).collect();
    assert_eq!(cleaned, vec![c1.id, c2.id]);
    assert!(second.is_empty());
}

#[test]
fn test_cleanup_order_reports_unknown_before_queued() {
    let node = test_node();
    let app = application_id(1);
    let released = Container::new(app.container(1), Resource::memory(100));
    node.allocate(app, &[released.clone()]).unwrap();
    assert!(node.release(&released.id));

    let stray = Container::new(application_id(2).container(1), Resource::memory(10))
        .with_state(ContainerState::Running);
    let response = node.reconcile(&[stray.clone()]);

    let cleaned: Vec<_> = response.containers_to_clean_up.iter().map(|c| c.id).collect();
    assert_eq!(cleaned, vec![stray.id, released.id]);
}

#[test]
fn test_heartbeat_report_with_multiple_sources() {
    let node = test_node();
    let app1 = application_id(1);
    let app2 = application_id(2);
    let a = Container::new(app1.container(1), Resource::memory(100));
    let b = Container::new(app2.container(1), Resource::memory(100));
    node.allocate(app1, &[a.clone()]).unwrap();
    node.allocate(app2, &[b.clone()]).unwrap();

    let mut report = HeartbeatReport::new();
    report.insert(app1.to_string(), vec![a.with_state(ContainerState::Running)]);
    report.insert(app2.to_string(), vec![b.with_state(ContainerState::Complete)]);
    let response = node.status_update(Some(&report));

    assert_eq!(response.completed_containers.len(), 1);
    assert_eq!(response.completed_containers[0].id, b.id);
    assert_eq!(node.active_container_ids(), vec![a.id]);
    assert_eq!(node.num_containers(), 1);
    assert_eq!(node.available_resource(), Resource::memory(900));
    node.check_invariants().unwrap();
}

#[test]
fn test_missing_heartbeat_report_keeps_queues() {
    let node = test_node();
    let app = application_id(1);
    let c = Container::new(app.container(1), Resource::memory(100));
    node.allocate(app, &[c.clone()]).unwrap();
    node.release(&c.id);

    assert!(node.status_update(None).is_empty());
    assert_eq!(node.pending_cleanup_count(), 1);

    let response = node.status_update(Some(&HeartbeatReport::new()));
    assert_eq!(response.containers_to_clean_up.len(), 1);
}

#[test]
fn test_snapshot_tracks_membership() {
    let node = test_node();
    let app = application_id(1);
    let a = Container::new(app.container(1), Resource::memory(100));
    let b = Container::new(app.container(2), Resource::memory(100));
    node.allocate(app, &[a.clone(), b.clone()]).unwrap();
    node.reconcile(&[a.with_state(ContainerState::Running)]);
    node.notify_finished_application(app);

    let snapshot = node.snapshot();

    assert_eq!(snapshot.allocated_containers, vec![b.id]);
    assert_eq!(snapshot.active_containers, vec![a.id]);
    assert_eq!(snapshot.pending_finished_applications, vec![app]);
    assert_eq!(snapshot.num_containers, 2);
    assert_eq!(snapshot.network_location, "/rack-a");
    assert!(snapshot.last_reconciled_at.is_some());
}
