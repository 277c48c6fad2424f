// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server unit tests

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use tokio::net::TcpListener;

const ADDR: &str = "10.0.0.1";

fn context(force_token: &str) -> ServerContext {
    let manager = LockManager::with_locker(Arc::new(TracedLocker::new(InMemoryLocker::new())));
    ServerContext::new(manager, force_token)
}

async fn request(ctx: &ServerContext, request: Request, addr: &str) -> Response {
    handle_request(ctx, request, addr, pending())
        .await
        .expect("caller never disconnects")
}

fn acquire(name: &str, pid: i32, timeout_secs: i32) -> Request {
    Request::Acquire {
        name: name.to_string(),
        pid,
        timeout_secs,
    }
}

fn release(name: &str, pid: i32, force_token: Option<&str>) -> Request {
    Request::Release {
        name: name.to_string(),
        pid,
        force_token: force_token.map(str::to_string),
    }
}

#[tokio::test]
async fn ping_and_hello() {
    let ctx = context("");

    assert_eq!(request(&ctx, Request::Ping, ADDR).await, Response::Pong);
    assert_eq!(
        request(
            &ctx,
            Request::Hello {
                version: "0.0.0".to_string()
            },
            ADDR
        )
        .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn acquire_free_lock_reports_acquired() {
    let ctx = context("");

    let response = request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    assert_eq!(
        response,
        Response::Lock {
            success: true,
            message: "Lock acquired".to_string()
        }
    );
}

#[tokio::test]
async fn acquire_taken_lock_with_zero_timeout_still_succeeds() {
    let ctx = context("");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response = request(&ctx, acquire("deploy", 8, 0), "10.0.0.2").await;

    assert_eq!(
        response,
        Response::Lock {
            success: true,
            message: "Lock not acquired: already held".to_string()
        }
    );
}

#[tokio::test]
async fn acquire_with_negative_timeout_is_error() {
    let ctx = context("");

    let response = request(&ctx, acquire("deploy", 7, -1), ADDR).await;

    assert!(matches!(response, Response::Error { ref message } if message.contains("-1")));
    assert!(ctx.manager.list_locks().is_empty());
}

#[tokio::test]
async fn acquire_dropped_when_caller_disconnects() {
    let ctx = context("");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response =
        handle_request(&ctx, acquire("deploy", 8, 30), ADDR, std::future::ready(())).await;

    assert!(response.is_none());
}

#[tokio::test]
async fn release_by_owner_succeeds() {
    let ctx = context("");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response = request(&ctx, release("deploy", 7, None), ADDR).await;

    assert_eq!(
        response,
        Response::Release {
            success: true,
            message: "Lock released".to_string()
        }
    );
    assert!(ctx.manager.list_locks().is_empty());
}

#[tokio::test]
async fn release_by_other_address_fails() {
    let ctx = context("");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response = request(&ctx, release("deploy", 7, None), "10.0.0.2").await;

    assert!(matches!(
        response,
        Response::Release { success: false, ref message } if message.contains("not held")
    ));
    assert_eq!(ctx.manager.list_locks().len(), 1);
}

#[tokio::test]
async fn empty_force_token_takes_normal_release_path() {
    let ctx = context("secret");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response = request(&ctx, release("deploy", 7, Some("")), ADDR).await;

    assert!(matches!(response, Response::Release { success: true, .. }));
}

#[tokio::test]
async fn force_release_with_configured_token() {
    let ctx = context("secret");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response = request(&ctx, release("deploy", 99, Some("secret")), "10.9.9.9").await;

    assert!(matches!(response, Response::Release { success: true, .. }));
    assert!(ctx.manager.list_locks().is_empty());
}

#[tokio::test]
async fn force_release_with_wrong_token_fails() {
    let ctx = context("secret");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response = request(&ctx, release("deploy", 7, Some("guess")), ADDR).await;

    assert_eq!(
        response,
        Response::Release {
            success: false,
            message: LockError::InvalidForceToken.to_string()
        }
    );
    assert_eq!(ctx.manager.list_locks().len(), 1);
}

#[tokio::test]
async fn force_release_disabled_without_server_token() {
    let ctx = context("");
    request(&ctx, acquire("deploy", 7, 0), ADDR).await;

    let response = request(&ctx, release("deploy", 7, Some("secret")), ADDR).await;

    assert_eq!(
        response,
        Response::Release {
            success: false,
            message: LockError::ForceReleaseDisabled.to_string()
        }
    );
}

#[tokio::test]
async fn list_reports_locks_sorted_by_name() {
    let ctx = context("");
    request(&ctx, acquire("zeta", 2, 0), "10.0.0.2").await;
    request(&ctx, acquire("alpha", 1, 0), ADDR).await;

    let response = request(&ctx, Request::List, ADDR).await;

    assert_eq!(
        response,
        Response::Locks {
            locks: vec![
                LockSummary {
                    name: "alpha".to_string(),
                    pid: 1,
                    addr: ADDR.to_string(),
                    locked: true,
                },
                LockSummary {
                    name: "zeta".to_string(),
                    pid: 2,
                    addr: "10.0.0.2".to_string(),
                    locked: true,
                },
            ]
        }
    );
}

#[tokio::test]
async fn status_counts_held_locks() {
    let ctx = context("");
    request(&ctx, acquire("a", 1, 0), ADDR).await;
    request(&ctx, acquire("b", 1, 0), ADDR).await;

    let response = request(&ctx, Request::Status, ADDR).await;

    assert!(matches!(response, Response::Status { locks_held: 2, .. }));
}

#[test]
fn caller_addr_strips_port() {
    let v4: SocketAddr = "10.0.0.1:50051".parse().unwrap();
    let v6: SocketAddr = "[::1]:50051".parse().unwrap();
    let mapped: SocketAddr = "[::ffff:10.0.0.1]:50051".parse().unwrap();

    assert_eq!(caller_addr(&v4), "10.0.0.1");
    assert_eq!(caller_addr(&v6), "::1");
    assert_eq!(caller_addr(&mapped), "10.0.0.1");
}

// =============================================================================
// Over TCP
// =============================================================================

async fn serve_one(
    ctx: Arc<ServerContext>,
) -> (SocketAddr, tokio::task::JoinHandle<Result<(), ServerError>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, peer) = listener.accept().await.unwrap();
        handle_connection(&ctx, stream, peer).await
    });
    (local, handle)
}

#[tokio::test]
async fn acquire_over_tcp_records_peer_address() {
    let ctx = Arc::new(context(""));
    let (local, handle) = serve_one(Arc::clone(&ctx)).await;

    let mut stream = TcpStream::connect(local).await.unwrap();
    let data = protocol::encode(&acquire("deploy", 7, 0)).unwrap();
    protocol::write_message(&mut stream, &data).await.unwrap();
    let bytes = protocol::read_message(&mut stream).await.unwrap();
    let response: Response = protocol::decode(&bytes).unwrap();

    assert!(matches!(response, Response::Lock { success: true, .. }));
    handle.await.unwrap().unwrap();

    let locks = ctx.manager.list_locks();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].addr, "127.0.0.1");
    assert_eq!(locks[0].pid, 7);
}

#[tokio::test]
async fn waiting_acquire_stops_when_client_hangs_up() {
    let ctx = Arc::new(context(""));
    request(&ctx, acquire("deploy", 1, 0), ADDR).await;
    let (local, handle) = serve_one(Arc::clone(&ctx)).await;

    let mut stream = TcpStream::connect(local).await.unwrap();
    let data = protocol::encode(&acquire("deploy", 2, 60)).unwrap();
    protocol::write_message(&mut stream, &data).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    drop(stream);

    let finished = tokio::time::timeout(Duration::from_secs(5), handle).await;
    assert!(finished.is_ok(), "server kept polling after disconnect");
    finished.unwrap().unwrap().unwrap();

    let locks = ctx.manager.list_locks();
    assert_eq!(locks.len(), 1);
    assert_eq!(locks[0].pid, 1);
}

#[tokio::test]
async fn garbage_request_gets_error_response() {
    let ctx = Arc::new(context(""));
    let (local, handle) = serve_one(ctx).await;

    let mut stream = TcpStream::connect(local).await.unwrap();
    protocol::write_message(&mut stream, b"not json").await.unwrap();
    let bytes = protocol::read_message(&mut stream).await.unwrap();
    let response: Response = protocol::decode(&bytes).unwrap();

    assert!(matches!(response, Response::Error { .. }));
    assert!(matches!(handle.await.unwrap(), Err(ServerError::Protocol(_))));
}

#[tokio::test]
async fn waiting_client_that_keeps_write_half_open_gets_grant() {
    let ctx = Arc::new(context(""));
    request(&ctx, acquire("deploy", 1, 0), ADDR).await;
    let (local, handle) = serve_one(Arc::clone(&ctx)).await;

    let mut stream = TcpStream::connect(local).await.unwrap();
    let data = protocol::encode(&acquire("deploy", 2, 5)).unwrap();
    protocol::write_message(&mut stream, &data).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    ctx.manager.release_lock("deploy", 1, ADDR).unwrap();

    let bytes = protocol::read_message(&mut stream).await.unwrap();
    let response: Response = protocol::decode(&bytes).unwrap();

    assert_eq!(
        response,
        Response::Lock {
            success: true,
            message: "Lock acquired".to_string()
        }
    );
    handle.await.unwrap().unwrap();
    assert_eq!(ctx.manager.list_locks()[0].pid, 2);
}

#[tokio::test]
async fn write_shutdown_while_waiting_counts_as_hang_up() {
    use tokio::io::AsyncWriteExt;

    let ctx = Arc::new(context(""));
    request(&ctx, acquire("deploy", 1, 0), ADDR).await;
    let (local, handle) = serve_one(Arc::clone(&ctx)).await;

    let mut stream = TcpStream::connect(local).await.unwrap();
    let data = protocol::encode(&acquire("deploy", 2, 5)).unwrap();
    protocol::write_message(&mut stream, &data).await.unwrap();
    stream.shutdown().await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    ctx.manager.release_lock("deploy", 1, ADDR).unwrap();

    let reply = protocol::read_message(&mut stream).await;

    assert!(matches!(reply, Err(protocol::ProtocolError::ConnectionClosed)));
    handle.await.unwrap().unwrap();
    assert!(ctx.manager.list_locks().is_empty());
}
