//! Sessioned client tests
//!
//! Tests login, the expired-session retry and option updates against a
//! scripted transport.

mod common;

use common::{client, ScriptedTransport, HOST, LOGIN_FAIL, VACATIONS_TABLE};
use walldisplay_core::{HttpResponse, ItemKind, WallDisplayError, NOT_LOGGED_IN};

#[tokio::test]
async fn test_connect_success() {
    let transport = ScriptedTransport::new();
    transport.login_ok();
    let client = client(&transport);

    assert!(!client.is_connected());
    client.connect().await.unwrap();
    assert!(client.is_connected());

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    let login = &requests[0];
    assert_eq!(login.url, format!("{}/ws.php", HOST));
    assert_eq!(login.query_value("format"), Some("json"));
    assert_eq!(login.query_value("method"), Some("pwg.session.login"));
    assert!(login.form.contains(&("username".to_string(), "display".to_string())));
    assert!(login.form.contains(&("password".to_string(), "secret".to_string())));
}

#[tokio::test]
async fn test_connect_rejected() {
    let transport = ScriptedTransport::new();
    transport.push_login(Ok(HttpResponse::ok(LOGIN_FAIL)));
    let client = client(&transport);

    let result = client.connect().await;
    assert!(matches!(result, Err(WallDisplayError::Auth(_))));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_connect_unreachable_is_auth_error() {
    let transport = ScriptedTransport::new();
    transport.push_login(Err(WallDisplayError::Connection("refused".to_string())));
    let client = client(&transport);

    let result = client.connect().await;
    assert!(matches!(result, Err(WallDisplayError::Auth(msg)) if msg.contains("refused")));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_connect_non_json_is_auth_error() {
    let transport = ScriptedTransport::new();
    transport.push_login(Ok(HttpResponse::new(500, "<html>error</html>")));
    let client = client(&transport);

    assert!(matches!(
        client.connect().await,
        Err(WallDisplayError::Auth(_))
    ));
}

#[tokio::test]
async fn test_disconnect_clears_flag() {
    let transport = ScriptedTransport::new();
    transport.login_ok();
    let client = client(&transport);

    client.connect().await.unwrap();
    client.disconnect();
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_fetch_tree_without_expiry() {
    let transport = ScriptedTransport::new();
    transport.get_ok(VACATIONS_TABLE);
    let client = client(&transport);

    let tree = client.fetch_tree().await.unwrap();
    assert_eq!(tree.cats.len(), 1);
    assert_eq!(tree.mode, "cat");
    assert_eq!(transport.login_count(), 0);

    let fetch = &transport.requests()[0];
    assert_eq!(
        fetch.url,
        format!("{}/plugins/WallDisplay/api_wall_display.inc.php", HOST)
    );
    assert_eq!(fetch.query_value("api"), Some("full_table"));
}

#[tokio::test]
async fn test_fetch_relogs_once_after_sentinel() {
    let transport = ScriptedTransport::new();
    transport.get_ok(NOT_LOGGED_IN);
    transport.login_ok();
    transport.get_ok(VACATIONS_TABLE);
    let client = client(&transport);

    let items = client.fetch_items().await.unwrap();
    assert_eq!(items.len(), 4);
    assert_eq!(transport.login_count(), 1);
    assert!(client.is_connected());

    let methods: Vec<&str> = transport.requests().iter().map(|r| r.method).collect();
    assert_eq!(methods, ["GET", "POST", "GET"]);
}

#[tokio::test]
async fn test_fetch_still_expired_is_malformed() {
    let transport = ScriptedTransport::new();
    transport.get_ok(NOT_LOGGED_IN);
    transport.login_ok();
    transport.get_ok(NOT_LOGGED_IN);
    let client = client(&transport);

    let result = client.fetch_tree().await;
    assert!(matches!(result, Err(WallDisplayError::MalformedResponse(_))));
    assert_eq!(transport.login_count(), 1);
}

#[tokio::test]
async fn test_fetch_relogin_rejected() {
    let transport = ScriptedTransport::new();
    transport.get_ok(NOT_LOGGED_IN);
    transport.push_login(Ok(HttpResponse::ok(LOGIN_FAIL)));
    let client = client(&transport);

    let result = client.fetch_tree().await;
    assert!(matches!(result, Err(WallDisplayError::Auth(_))));
    assert!(!client.is_connected());
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_fetch_malformed_json_not_retried() {
    let transport = ScriptedTransport::new();
    transport.get_ok("{\"cats\": ");
    let client = client(&transport);

    let result = client.fetch_tree().await;
    assert!(matches!(result, Err(WallDisplayError::MalformedResponse(_))));
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn test_fetch_transport_failure() {
    let transport = ScriptedTransport::new();
    transport.push_get(Err(WallDisplayError::Connection("timed out".to_string())));
    let client = client(&transport);

    let err = client.fetch_tree().await.unwrap_err();
    assert!(err.is_unavailable());
    assert!(matches!(err, WallDisplayError::Connection(_)));
}

#[tokio::test]
async fn test_fetch_http_error_status() {
    let transport = ScriptedTransport::new();
    transport.push_get(Ok(HttpResponse::new(503, "maintenance")));
    let client = client(&transport);

    assert!(matches!(
        client.fetch_tree().await,
        Err(WallDisplayError::Connection(msg)) if msg.contains("503")
    ));
}

async fn vacations_items() -> Vec<walldisplay_core::ToggleableItem> {
    let transport = ScriptedTransport::new();
    transport.get_ok(VACATIONS_TABLE);
    client(&transport).fetch_items().await.unwrap()
}

#[tokio::test]
async fn test_set_item_query() {
    let items = vacations_items().await;
    let album = items.iter().find(|i| i.server_id == 9 && i.kind == ItemKind::Album).unwrap();

    let transport = ScriptedTransport::new();
    transport.get_ok("");
    let client = client(&transport);

    client.set_item(album, "true").await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.query_value("api"), Some("edit_options"));
    assert_eq!(request.query_value("type"), Some("cat"));
    assert_eq!(request.query_value("id"), Some("9"));
    assert_eq!(request.query_value("enabled"), Some("true"));
}

#[tokio::test]
async fn test_set_item_tag_uses_tag_id() {
    let items = vacations_items().await;
    let tag = items.iter().find(|i| i.kind == ItemKind::Tag).unwrap();

    let transport = ScriptedTransport::new();
    transport.get_ok("");
    client(&transport).set_item(tag, "false").await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.query_value("type"), Some("tag"));
    assert_eq!(request.query_value("id"), Some("3"));
}

#[tokio::test]
async fn test_set_item_reports_retried_outcome() {
    let items = vacations_items().await;
    let mode = items.last().unwrap();

    let transport = ScriptedTransport::new();
    transport.get_ok(NOT_LOGGED_IN);
    transport.login_ok();
    transport.get_ok("");
    let client = client(&transport);

    client.set_item(mode, "false").await.unwrap();
    assert_eq!(transport.login_count(), 1);

    let gets: Vec<_> = transport
        .requests()
        .into_iter()
        .filter(|r| r.method == "GET")
        .collect();
    assert_eq!(gets.len(), 2);
    assert_eq!(gets[0], gets[1]);
}

#[tokio::test]
async fn test_set_item_still_expired() {
    let items = vacations_items().await;

    let transport = ScriptedTransport::new();
    transport.get_ok(NOT_LOGGED_IN);
    transport.login_ok();
    transport.get_ok(NOT_LOGGED_IN);
    let client = client(&transport);

    let result = client.set_item(&items[0], "false").await;
    assert!(matches!(result, Err(WallDisplayError::SessionExpired)));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_fetch_items_deeply_nested_albums() {
    const DEPTH: u32 = 500;
    let mut body = String::from(r#"{"cats": {"#);
    for id in 1..=DEPTH {
        body.push_str(&format!(
            r#""{id}": {{"id": "{id}", "name": "a{id}", "id_uppercat": "{parent}", "children": {{"#,
            parent = id - 1
        ));
    }
    body.push_str(&"}}".repeat(DEPTH as usize));
    body.push_str(r#"}, "tags": {"1": {"id": "1", "name": "t"}}, "mode": "cat"}"#);

    let transport = ScriptedTransport::new();
    transport.get_ok(&body);
    let items = client(&transport).fetch_items().await.unwrap();

    assert_eq!(items.len(), DEPTH as usize + 2);
    let deepest = &items[DEPTH as usize - 1];
    assert_eq!(deepest.server_id, i64::from(DEPTH));
    assert_eq!(deepest.server_parent_id, i64::from(DEPTH - 1));
    assert_eq!(deepest.display_name.matches(" / ").count(), DEPTH as usize - 1);
    assert_eq!(items[DEPTH as usize].kind, ItemKind::Tag);
    assert_eq!(items[DEPTH as usize + 1].kind, ItemKind::Mode);
}
