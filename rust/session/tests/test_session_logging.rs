use buzz7_session::{
    init_test_logging, CommentaryClient, EventBus, MatchEvent, MatchSession, Settings,
};
use std::time::Duration;
use tracing::Level;

#[tokio::test(start_paused = true)]
async fn conclusion_logs_outcome_and_match_record() {
    let logs = init_test_logging();

    let bus = EventBus::new();
    let settings = Settings {
        player_count: 2,
        seed: Some(4),
        ..Settings::default()
    };
    let (session, handle) =
        MatchSession::from_settings(&settings, CommentaryClient::unconfigured(), bus.clone())
            .expect("session");
    let mut events = bus.subscribe(handle.match_id().clone());
    let _task = session.spawn();

    handle.start().await.expect("start");
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            if let MatchEvent::TurnStarted { .. } = events.receiver.recv().await.expect("bus open") {
                break;
            }
        }
    })
    .await
    .expect("first turn");

    // input outside the human's turn is logged, not fatal
    let _ = handle.declare_number().await;
    handle.forfeit().await.expect("forfeit");

    let match_id = handle.match_id().clone();
    let entries = logs.entries();
    let ours: Vec<_> = entries
        .iter()
        .filter(|e| e.field("match_id") == Some(match_id.as_str()))
        .collect();

    let concluded = ours
        .iter()
        .find(|e| e.message == "match concluded")
        .expect("conclusion logged");
    assert_eq!(concluded.level, Level::INFO);
    assert_eq!(concluded.field("reason"), Some("forfeit"));
    assert_eq!(concluded.field("human_won"), Some("false"));

    let record = ours
        .iter()
        .find(|e| e.message == "match record")
        .and_then(|e| e.field("record"))
        .expect("record logged");
    let json: serde_json::Value = serde_json::from_str(record).expect("record is json");
    assert_eq!(json["match_id"], match_id.as_str());
    assert_eq!(json["seed"], 4);
    assert_eq!(json["outcome"]["reason"]["reason"], "forfeit");
    assert!(json["ts"].is_string());
}
