// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Integration tests for batch dispatch
//!
//! These tests run the real HTTP check client, dispatch pool, fan-out
//! coordinators and aggregator against mock agent nodes:
//! 1. Reachable nodes served by mockito
//! 2. Unreachable nodes pointed at a released local port
//! 3. Malformed checks that never leave the dispatcher

use fleetcheck_core::application::{BatchOrchestrator, CheckBatch, DispatchPool, StandardBatchOrchestrator};
use fleetcheck_core::domain::check::{Check, CheckId, OutcomeCategory};
use fleetcheck_core::domain::node_config::AgentNode;
use fleetcheck_core::domain::report::{BatchResponse, CheckReport};
use fleetcheck_core::infrastructure::HttpCheckClient;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;

fn closed_port_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

/// Agent node answering every endpoint with fixed results.
async fn agent_node(exists: bool, contains: bool, running: bool) -> ServerGuard {
    let mut server = Server::new_async().await;
    for (path, result) in [
        ("/does-exist", exists),
        ("/does-contain", contains),
        ("/is-running", running),
    ] {
        server
            .mock("POST", path)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "Result": result }).to_string())
            .create_async()
            .await;
    }
    server
}

fn node_for(label: &str, server: &ServerGuard) -> AgentNode {
    AgentNode::new(label, format!("{}/", server.url()))
}

async fn run(nodes: Vec<AgentNode>, workers: usize, checks: CheckBatch) -> BatchResponse {
    let client = Arc::new(HttpCheckClient::new().unwrap());
    let pool = DispatchPool::start(workers, 8, client);
    let orchestrator = StandardBatchOrchestrator::new(Arc::new(nodes), pool.submitter());

    let response = orchestrator.run_batch(checks).await;

    drop(orchestrator);
    pool.shutdown().await;
    response
}

fn batch(entries: Vec<(&str, Check)>) -> CheckBatch {
    entries
        .into_iter()
        .map(|(id, check)| (CheckId::new(id), check))
        .collect()
}

fn membership(report: &CheckReport) -> Vec<BTreeSet<String>> {
    OutcomeCategory::ALL
        .iter()
        .map(|c| report.nodes(*c).iter().cloned().collect())
        .collect()
}

#[tokio::test]
async fn test_one_node_down_is_unreachable() {
    let n0 = agent_node(true, false, false).await;
    let n1 = agent_node(true, false, false).await;
    let n3 = agent_node(true, false, false).await;
    let nodes = vec![
        node_for("Machine-9000", &n0),
        node_for("Machine-9001", &n1),
        AgentNode::new("Machine-9002", closed_port_address()),
        node_for("Machine-9003", &n3),
    ];

    let response = run(nodes, 2, batch(vec![("c1", Check::file_exists("/etc/hosts"))])).await;

    let report = &response[&CheckId::new("c1")];
    assert!(!report.malformed);
    assert_eq!(report.passed.len(), 3);
    assert_eq!(report.unreachable, vec!["Machine-9002".to_string()]);
    assert!(report.failed.is_empty());
    assert!(report.errored.is_empty());
}

#[tokio::test]
async fn test_unknown_kind_is_malformed_and_contacts_nobody() {
    let mut server = Server::new_async().await;
    let never = server
        .mock("POST", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let nodes = vec![node_for("Machine-9000", &server)];
    let response = run(
        nodes,
        2,
        batch(vec![("c1", Check::new("bogus_kind", "/etc/hosts", ""))]),
    )
    .await;

    let report = &response[&CheckId::new("c1")];
    assert!(report.malformed);
    assert!(!report.error_message.is_empty());
    assert_eq!(report.total_nodes(), 0);
    never.assert_async().await;
}

#[tokio::test]
async fn test_independent_checks_in_one_batch() {
    let servers = vec![
        agent_node(false, true, false).await,
        agent_node(false, true, false).await,
        agent_node(false, true, false).await,
    ];
    let nodes: Vec<_> = servers
        .iter()
        .enumerate()
        .map(|(i, s)| node_for(&format!("node-{}", i), s))
        .collect();

    let response = run(
        nodes,
        2,
        batch(vec![
            ("hosts_has_4488", Check::file_contains("/etc/hosts", "4488")),
            ("virus_running", Check::is_running("virus")),
        ]),
    )
    .await;

    assert_eq!(response.len(), 2);

    let contains = &response[&CheckId::new("hosts_has_4488")];
    assert_eq!(contains.passed.len(), 3);
    assert_eq!(contains.total_nodes(), 3);

    let running = &response[&CheckId::new("virus_running")];
    assert_eq!(running.failed.len(), 3);
    assert_eq!(running.total_nodes(), 3);
}

#[tokio::test]
async fn test_request_bodies_follow_wire_contract() {
    let mut server = Server::new_async().await;
    let contains = server
        .mock("POST", "/does-contain")
        .match_body(Matcher::Json(json!({"Path": "/etc/hosts", "Check": "4488"})))
        .with_status(200)
        .with_body(r#"{"Result":true}"#)
        .create_async()
        .await;
    let running = server
        .mock("POST", "/is-running")
        .match_body(Matcher::Json(json!({"ProcessName": "nginx"})))
        .with_status(200)
        .with_body(r#"{"Result":true}"#)
        .create_async()
        .await;

    let response = run(
        vec![node_for("web-1", &server)],
        1,
        batch(vec![
            ("c1", Check::file_contains("/etc/hosts", "4488")),
            ("c2", Check::is_running("nginx")),
        ]),
    )
    .await;

    assert_eq!(response[&CheckId::new("c1")].passed, vec!["web-1".to_string()]);
    assert_eq!(response[&CheckId::new("c2")].passed, vec!["web-1".to_string()]);
    contains.assert_async().await;
    running.assert_async().await;
}

#[tokio::test]
async fn test_error_statuses_and_bad_bodies_are_errored() {
    let mut failing = Server::new_async().await;
    failing
        .mock("POST", "/does-exist")
        .with_status(500)
        .create_async()
        .await;

    let mut garbled = Server::new_async().await;
    garbled
        .mock("POST", "/does-exist")
        .with_status(200)
        .with_body("{\"Result\": \"maybe\"}")
        .create_async()
        .await;

    let response = run(
        vec![node_for("failing", &failing), node_for("garbled", &garbled)],
        2,
        batch(vec![("c1", Check::file_exists("/etc/hosts"))]),
    )
    .await;

    let report = &response[&CheckId::new("c1")];
    let errored: BTreeSet<_> = report.errored.iter().cloned().collect();
    assert_eq!(errored, BTreeSet::from(["failing".to_string(), "garbled".to_string()]));
    assert_eq!(report.total_nodes(), 2);
}

#[tokio::test]
async fn test_every_key_reported_exactly_once() {
    let servers = vec![
        agent_node(true, false, true).await,
        agent_node(false, true, true).await,
    ];
    let mut nodes: Vec<_> = servers
        .iter()
        .enumerate()
        .map(|(i, s)| node_for(&format!("node-{}", i), s))
        .collect();
    nodes.push(AgentNode::new("node-down", closed_port_address()));

    let mut checks = CheckBatch::new();
    for i in 0..30 {
        let check = match i % 4 {
            0 => Check::file_exists(format!("/srv/{}", i)),
            1 => Check::file_contains("/etc/hosts", format!("{}", i)),
            2 => Check::is_running(format!("worker-{}", i)),
            _ => Check::new("unsupported", "/", ""),
        };
        checks.insert(CheckId::new(format!("check-{}", i)), check);
    }
    let expected: BTreeSet<_> = checks.keys().cloned().collect();

    let response = run(nodes, 3, checks).await;

    let keys: BTreeSet<_> = response.keys().cloned().collect();
    assert_eq!(keys, expected);

    for (id, report) in &response {
        assert_eq!(&report.id, id);
        if report.malformed {
            assert_eq!(report.total_nodes(), 0);
            continue;
        }
        assert_eq!(report.total_nodes(), 3, "check {} lost or duplicated a node", id);
        for label in ["node-0", "node-1", "node-down"] {
            assert!(report.category_of(label).is_some());
        }
        assert_eq!(report.unreachable, vec!["node-down".to_string()]);
    }
}

#[tokio::test]
async fn test_same_batch_twice_has_same_membership() {
    let servers = vec![
        agent_node(true, false, false).await,
        agent_node(false, false, true).await,
        agent_node(true, true, false).await,
    ];
    let mut nodes: Vec<_> = servers
        .iter()
        .enumerate()
        .map(|(i, s)| node_for(&format!("node-{}", i), s))
        .collect();
    nodes.push(AgentNode::new("node-down", closed_port_address()));

    let checks = batch(vec![
        ("exists", Check::file_exists("/etc/hosts")),
        ("contains", Check::file_contains("/etc/hosts", "4488")),
        ("running", Check::is_running("sshd")),
    ]);

    let first = run(nodes.clone(), 2, checks.clone()).await;
    let second = run(nodes, 2, checks).await;

    for (id, report) in &first {
        assert_eq!(membership(report), membership(&second[id]));
    }
}

#[tokio::test]
async fn test_empty_batch() {
    let response = run(vec![AgentNode::new("n", closed_port_address())], 1, CheckBatch::new()).await;
    assert!(response.is_empty());
}
