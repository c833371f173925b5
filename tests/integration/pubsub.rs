//! End-to-end tests of the subscription flow against a mock pub/sub edge.

use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;

use crate::common::{
    KillOnDrop, accept_session, get_free_port, read_json, send_json, service_config,
    spawn_service_with_config, wait_for_listening,
};

/// Query the pull accessor.
async fn remaining(http_port: u16) -> u64 {
    let resp: serde_json::Value =
        reqwest::get(format!("http://127.0.0.1:{http_port}/api/remaining"))
            .await
            .expect("failed to query pull accessor")
            .json()
            .await
            .expect("pull accessor returned invalid JSON");
    resp["remaining_time"].as_u64().expect("remaining_time missing")
}

fn bits_message(bits_used: u64) -> serde_json::Value {
    let message = json!({
        "data": {
            "user_name": "viewer",
            "bits_used": bits_used,
            "time": "2026-01-01T00:00:00Z",
        }
    })
    .to_string();
    json!({
        "type": "MESSAGE",
        "data": {
            "topic": "channel-bits-events-v2.itchan",
            "message": message,
        }
    })
}

#[tokio::test]
async fn test_listen_handshake_and_bits_trigger() {
    let pubsub_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let pubsub_port = pubsub_listener.local_addr().unwrap().port();
    let http_port = get_free_port();

    let child = spawn_service_with_config(http_port, &service_config(http_port, pubsub_port, 1));
    let _guard = KillOnDrop(child);

    let mut session = accept_session(&pubsub_listener).await;
    let listen = read_json(&mut session).await;
    assert_eq!(listen["type"], "LISTEN");
    assert_eq!(
        listen["data"]["topics"],
        json!(["channel-bits-events-v2.itchan"])
    );
    assert_eq!(
        listen["data"]["auth_token"], "sekrit",
        "the oauth: prefix must be stripped"
    );
    let nonce = listen["nonce"].as_str().expect("LISTEN must carry a nonce");
    assert!(!nonce.is_empty());

    send_json(
        &mut session,
        &json!({"type": "RESPONSE", "nonce": nonce, "error": ""}),
    )
    .await;

    wait_for_listening(http_port, 5).await;

    // Observer connects and gets the bootstrap frame.
    let (mut observer, _) =
        tokio_tungstenite::connect_async(format!("ws://127.0.0.1:{http_port}/ws"))
            .await
            .expect("observer failed to connect");
    let initial = read_json(&mut observer).await;
    assert_eq!(initial, json!({"event": "update_timer", "remaining_time": 0}));

    // One single-bit event fires the trigger and pushes the countdown.
    send_json(&mut session, &bits_message(1)).await;
    let update = read_json(&mut observer).await;
    assert_eq!(update, json!({"event": "update_timer", "remaining_time": 60}));

    // The pull accessor agrees.
    let secs = remaining(http_port).await;
    assert!(
        secs > 0 && secs <= 60,
        "remaining should be inside the window, got {secs}"
    );

    // The countdown page renders with the service name on it.
    let page = reqwest::get(format!("http://127.0.0.1:{http_port}/"))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(page.contains("Roostlight"), "index page should render");
}

#[tokio::test]
async fn test_reconnect_uses_a_fresh_nonce() {
    let pubsub_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let pubsub_port = pubsub_listener.local_addr().unwrap().port();
    let http_port = get_free_port();

    let child = spawn_service_with_config(http_port, &service_config(http_port, pubsub_port, 1));
    let _guard = KillOnDrop(child);

    let mut first = accept_session(&pubsub_listener).await;
    let listen_first = read_json(&mut first).await;
    assert_eq!(listen_first["type"], "LISTEN");
    // Kill the session; the service should back off and resubscribe.
    drop(first);

    let mut second = accept_session(&pubsub_listener).await;
    let listen_second = read_json(&mut second).await;
    assert_eq!(listen_second["type"], "LISTEN");
    assert_eq!(
        listen_second["data"]["topics"],
        json!(["channel-bits-events-v2.itchan"])
    );
    assert_ne!(
        listen_first["nonce"], listen_second["nonce"],
        "a reconnect must carry a fresh nonce"
    );
}

#[tokio::test]
async fn test_malformed_frames_do_not_end_the_session() {
    let pubsub_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let pubsub_port = pubsub_listener.local_addr().unwrap().port();
    let http_port = get_free_port();

    let child = spawn_service_with_config(http_port, &service_config(http_port, pubsub_port, 1));
    let _guard = KillOnDrop(child);

    let mut session = accept_session(&pubsub_listener).await;
    let _listen = read_json(&mut session).await;
    wait_for_listening(http_port, 5).await;

    // Garbage at both decoding layers.
    send_json(&mut session, &json!({"type": "MESSAGE"})).await;
    send_json(
        &mut session,
        &json!({
            "type": "MESSAGE",
            "data": {"topic": "channel-bits-events-v2.itchan", "message": "{not json"}
        }),
    )
    .await;

    // A valid event on the same session proves nothing fell over.
    send_json(&mut session, &bits_message(1)).await;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if remaining(http_port).await > 0 {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "trigger never fired after malformed frames"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test]
async fn test_non_triggering_counts_leave_state_untouched() {
    let pubsub_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let pubsub_port = pubsub_listener.local_addr().unwrap().port();
    let http_port = get_free_port();

    let child = spawn_service_with_config(http_port, &service_config(http_port, pubsub_port, 1));
    let _guard = KillOnDrop(child);

    let mut session = accept_session(&pubsub_listener).await;
    let _listen = read_json(&mut session).await;
    wait_for_listening(http_port, 5).await;

    send_json(&mut session, &bits_message(2)).await;
    send_json(&mut session, &bits_message(7)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(
        remaining(http_port).await,
        0,
        "neither a 2-bit nor a 7-bit event may arm the cooldown"
    );

    // Ordering sanity: a single-bit event after those still fires.
    send_json(&mut session, &bits_message(1)).await;
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if remaining(http_port).await > 0 {
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "single-bit event never fired"
        );
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
