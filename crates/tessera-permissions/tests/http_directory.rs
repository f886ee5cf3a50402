//! `HttpRoleDirectory` against a local one-shot HTTP responder.

#![cfg(feature = "http")]

use std::sync::Arc;
use std::time::Duration;

use tessera_permissions::{
    Capabilities, DirectoryError, HttpRoleDirectory, PermissionEvaluator, RoleDirectory,
};
use tessera_test::test_principal;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one request with `status` and `body`, reporting the request head.
async fn serve_once(
    status: &'static str,
    body: &'static str,
    delay: Duration,
) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let mut head = Vec::new();
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let _ = tx.send(String::from_utf8_lossy(&head).into_owned());

        tokio::time::sleep(delay).await;
        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });

    (format!("http://{addr}/api"), rx)
}

#[tokio::test]
async fn test_fetches_roles_with_bearer_token() {
    let (base, head) = serve_once(
        "200 OK",
        r#"[{"id":"r1","name":"Reader","permissions":1},{"id":"r2","name":"Pinner","permissions":"34359738368"}]"#,
        Duration::ZERO,
    )
    .await;
    let directory = HttpRoleDirectory::new(&base, Duration::from_secs(5))
        .unwrap()
        .with_bearer_token("dir-token");

    let roles = directory.roles_for(&test_principal("alice")).await.unwrap();
    assert_eq!(roles.len(), 2);
    assert_eq!(roles[1].permissions, Capabilities::ANNOUNCEMENT_PIN);

    let head = head.await.unwrap();
    assert!(head.starts_with("GET /api/principals/alice/roles HTTP/1.1"));
    assert!(head.to_ascii_lowercase().contains("authorization: bearer dir-token"));
}

#[tokio::test]
async fn test_wrapped_body() {
    let (base, _head) = serve_once(
        "200 OK",
        r#"{"roles":[{"id":"r1","name":"Editor","permissions":4}]}"#,
        Duration::ZERO,
    )
    .await;
    let directory = HttpRoleDirectory::new(&base, Duration::from_secs(5)).unwrap();
    let roles = directory.roles_for(&test_principal("bob")).await.unwrap();
    assert_eq!(roles[0].permissions, Capabilities::USER_UPDATE);
}

#[tokio::test]
async fn test_forbidden_maps_to_access_denied() {
    let (base, _head) = serve_once("403 Forbidden", "{}", Duration::ZERO).await;
    let directory = HttpRoleDirectory::new(&base, Duration::from_secs(5)).unwrap();
    let err = directory.roles_for(&test_principal("carol")).await.unwrap_err();
    assert_eq!(err, DirectoryError::AccessDenied);
}

#[tokio::test]
async fn test_server_error_maps_to_status() {
    let (base, _head) =
        serve_once("500 Internal Server Error", r#"{"error":"db down"}"#, Duration::ZERO).await;
    let directory = HttpRoleDirectory::new(&base, Duration::from_secs(5)).unwrap();
    let err = directory.roles_for(&test_principal("dave")).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Status { status: 500, ref body } if body.contains("db down")));
}

#[tokio::test]
async fn test_bad_json_maps_to_decode() {
    let (base, _head) = serve_once("200 OK", r#"{"nope":true}"#, Duration::ZERO).await;
    let directory = HttpRoleDirectory::new(&base, Duration::from_secs(5)).unwrap();
    let err = directory.roles_for(&test_principal("erin")).await.unwrap_err();
    assert!(matches!(err, DirectoryError::Decode(_)));
}

#[tokio::test]
async fn test_slow_directory_times_out_closed() {
    let (base, _head) = serve_once(
        "200 OK",
        r#"[{"id":"r","name":"Admin","permissions":"68719476735"}]"#,
        Duration::from_secs(5),
    )
    .await;
    let directory: Arc<dyn RoleDirectory> =
        Arc::new(HttpRoleDirectory::new(&base, Duration::from_millis(200)).unwrap());
    let eval: PermissionEvaluator = PermissionEvaluator::new(directory)
        .with_lookup_timeout(Duration::from_secs(2));

    let frank = test_principal("frank");
    assert!(eval.effective_mask(Some(&frank)).await.unwrap().is_empty());
}
