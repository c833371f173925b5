//! Integration tests for the observer websocket surface.

use roostlight::WsMessage;
use serde_json::json;

use crate::common::{
    KillOnDrop, get_free_port, read_json, service_config, spawn_service_with_config,
    wait_for_listening,
};

#[tokio::test]
async fn test_observer_gets_a_bootstrap_frame() {
    let http_port = get_free_port();
    let dead_port = get_free_port();
    let child = spawn_service_with_config(http_port, &service_config(http_port, dead_port, 1));
    let _guard = KillOnDrop(child);
    wait_for_listening(http_port, 5).await;

    let (mut observer, _) =
        tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{http_port}/ws"))
            .await
            .expect("observer failed to connect");
    let initial = read_json(&mut observer).await;
    assert_eq!(initial, json!({"event": "update_timer", "remaining_time": 0}));

    // The frame parses as the typed message the crate exports.
    let typed: WsMessage = serde_json::from_value(initial).unwrap();
    assert_eq!(typed, WsMessage::UpdateTimer { remaining_time: 0 });
}

#[tokio::test]
async fn test_index_page_renders_idle_state() {
    let http_port = get_free_port();
    let dead_port = get_free_port();
    let child = spawn_service_with_config(http_port, &service_config(http_port, dead_port, 1));
    let _guard = KillOnDrop(child);
    wait_for_listening(http_port, 5).await;

    let page = reqwest::get(format!("http://127.0.0.1:{http_port}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains(r#"data-remaining="0""#));
    assert!(page.contains("Last fired: never"));
}
