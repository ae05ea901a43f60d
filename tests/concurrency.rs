#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Concurrent access to a live master: many registrations and queries in
//! flight at once must not corrupt the registry or stall the listener.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use masterlist::config::MasterConfig;
use masterlist::service::client::{query_servers, register_server};
use masterlist::service::MasterServer;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_registrations_and_queries() {
    let config = MasterConfig::default_with_overrides(|c| {
        c.server.address = "127.0.0.1:0".to_string();
    });
    let server = MasterServer::bind(&config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let registry = server.registry();

    let (shutdown, shutdown_rx) = mpsc::channel(1);
    let handle = tokio::spawn(server.run_with_shutdown(shutdown_rx));

    let mut tasks = JoinSet::new();

    // 64 distinct servers across two versions, each registering twice
    for i in 0..64u16 {
        tasks.spawn(async move {
            let version = if i % 2 == 0 { 100 } else { 200 };
            register_server(addr, version, 7000 + i).await.unwrap();
            register_server(addr, version, 7000 + i).await.unwrap();
        });
    }

    // Queries interleaved with the registrations
    for _ in 0..16 {
        tasks.spawn(async move {
            let servers = query_servers(addr, 100).await.unwrap();
            // Never more than the version-100 population
            assert!(servers.len() <= 32);
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    // Every distinct identity landed exactly once
    for _ in 0..100 {
        if registry.len() == 64 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(registry.len(), 64);
    assert_eq!(registry.snapshot_for_version(100).len(), 32);
    assert_eq!(registry.snapshot_for_version(200).len(), 32);

    shutdown.send(()).await.unwrap();
    handle.await.unwrap().unwrap();
}
