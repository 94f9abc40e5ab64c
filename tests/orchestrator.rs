mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use likeburst::{
    ActionSender, BatchDispatcher, Classification, Credential, CredentialError, CredentialPool,
    DispatchOutcome, DispatchPolicy, LikeClient, LikeError, ProbePhase, RegionError,
};
use url::Url;

use common::{FakeGameServer, client_for, player_state, write_store};

struct EvenAttempts {
    seen: Mutex<Vec<usize>>,
}

#[async_trait]
impl ActionSender for EvenAttempts {
    async fn send_attempt(
        &self,
        attempt: usize,
        _payload: Bytes,
        _credential: &Credential,
        _url: &Url,
    ) -> bool {
        self.seen.lock().unwrap().push(attempt);
        attempt % 2 == 0
    }
}

#[tokio::test]
async fn dispatch_counts_partial_success() {
    let pool = CredentialPool::from_credentials(
        "IND",
        vec![
            Credential::new("1", "a"),
            Credential::new("2", "b"),
            Credential::new("3", "c"),
        ],
    )
    .unwrap();
    let sender = Arc::new(EvenAttempts {
        seen: Mutex::new(Vec::new()),
    });
    let dispatcher = BatchDispatcher::new(
        sender.clone(),
        DispatchPolicy {
            max_attempts: 5,
            batch_pause: Duration::ZERO,
            per_credential_cap: None,
            ..Default::default()
        },
    );

    let outcome = dispatcher
        .dispatch(
            Bytes::from_static(b"payload"),
            Arc::new(pool),
            &Url::parse("https://game.example/LikeProfile").unwrap(),
        )
        .await;

    assert_eq!(outcome, DispatchOutcome { attempted: 5, succeeded: 3 });
    let seen: HashSet<_> = sender.seen.lock().unwrap().iter().copied().collect();
    assert_eq!(seen, (0..5).collect::<HashSet<_>>());
}

#[tokio::test]
async fn unknown_region_fails_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeGameServer::default());
    let client = client_for(dir.path(), server.clone());

    let err = client.send_likes("123", "ZZ").await.unwrap_err();
    assert!(matches!(err, LikeError::Config(RegionError::Unsupported { .. })));
    assert_eq!(err.http_status(), 400);
    assert_eq!(server.total_calls(), 0);
}

#[tokio::test]
async fn unchanged_counter_is_no_change() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_ind.json", &["a", "b", "c"]);
    let server = Arc::new(FakeGameServer::with_query_bodies(vec![
        player_state(100, 42, "Ghost"),
        player_state(100, 42, "Ghost"),
    ]));
    let client = client_for(dir.path(), server.clone());

    let result = client.send_likes("42", "ind").await.unwrap();
    assert_eq!(result.delta, 0);
    assert_eq!(result.classification, Classification::NoChange);
    assert_eq!(result.classification.status_code(), 2);
    assert_eq!(result.region, "IND");
}

#[tokio::test]
async fn increased_counter_is_success() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_ind.json", &["a", "b", "c"]);
    let server = Arc::new(
        FakeGameServer::with_query_bodies(vec![
            player_state(100, 42, "Ghost"),
            player_state(107, 42, "Ghost"),
        ])
        .rejecting(&["b"]),
    );
    let client = client_for(dir.path(), server.clone());

    let result = client.send_likes("42", "IND").await.unwrap();
    assert_eq!(result.delta, 7);
    assert_eq!(result.classification.status_code(), 1);
    assert_eq!(result.before.likes, 100);
    assert_eq!(result.after.nickname, "Ghost");
    // three credentials, two attempts each; "b" is rejected twice
    assert_eq!(result.dispatch, DispatchOutcome { attempted: 6, succeeded: 4 });
}

#[tokio::test]
async fn ciphertexts_are_computed_once_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_sg.json", &["a", "b"]);
    let server = Arc::new(FakeGameServer::with_query_bodies(vec![
        player_state(1, 9, "n"),
        player_state(2, 9, "n"),
    ]));
    let client = client_for(dir.path(), server.clone());

    client.send_likes("9", "SG").await.unwrap();

    let queries = server.queries.lock().unwrap();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[0], queries[1]);

    let actions = server.actions.lock().unwrap();
    assert_eq!(actions.len(), 4);
    assert!(actions.iter().all(|(body, _)| *body == actions[0].0));
    assert_ne!(actions[0].0, queries[0]);
}

#[tokio::test]
async fn both_queries_use_the_first_credential() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_ind.json", &["first", "second", "third"]);
    let server = Arc::new(FakeGameServer::with_query_bodies(vec![
        player_state(10, 42, "Ghost"),
        player_state(12, 42, "Ghost"),
    ]));
    let client = client_for(dir.path(), server.clone());

    client.send_likes("42", "IND").await.unwrap();

    let log = server.query_log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].0, "Bearer first");
    assert_eq!(log[0].0, log[1].0);
}

#[tokio::test(start_paused = true)]
async fn after_query_waits_for_settle_delay() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_ind.json", &["a", "b"]);
    let server = Arc::new(FakeGameServer::with_query_bodies(vec![
        player_state(10, 42, "Ghost"),
        player_state(14, 42, "Ghost"),
    ]));
    let settle = Duration::from_millis(750);
    let client = LikeClient::builder()
        .with_credential_dir(dir.path())
        .with_http_client(server.clone())
        .with_settle_delay(settle)
        .with_dispatch_policy(DispatchPolicy {
            batch_pause: Duration::ZERO,
            ..Default::default()
        })
        .build()
        .unwrap();

    client.send_likes("42", "IND").await.unwrap();

    let log = server.query_log.lock().unwrap();
    let action_times = server.action_times.lock().unwrap();
    let first_action = *action_times.iter().min().unwrap();
    let last_action = *action_times.iter().max().unwrap();
    assert_eq!(action_times.len(), 4);
    assert!(log[0].1 <= first_action);
    assert!(log[1].1 >= last_action + settle);
}

#[tokio::test]
async fn malformed_after_probe_is_state_error() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_ind.json", &["a"]);
    let server = Arc::new(FakeGameServer::with_query_bodies(vec![
        player_state(100, 42, "Ghost"),
        vec![0x0A, 0x05, 0x01],
    ]));
    let client = client_for(dir.path(), server.clone());

    let err = client.send_likes("42", "IND").await.unwrap_err();
    assert!(matches!(
        err,
        LikeError::State {
            phase: ProbePhase::After
        }
    ));
    assert_eq!(err.http_status(), 500);
}

#[tokio::test]
async fn failed_before_probe_skips_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_ind.json", &["a", "b"]);
    let server = Arc::new(FakeGameServer::default());
    let client = client_for(dir.path(), server.clone());

    let err = client.send_likes("42", "IND").await.unwrap_err();
    assert!(matches!(
        err,
        LikeError::State {
            phase: ProbePhase::Before
        }
    ));
    assert!(server.actions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_store_is_credential_error() {
    let dir = tempfile::tempdir().unwrap();
    let server = Arc::new(FakeGameServer::default());
    let client = client_for(dir.path(), server.clone());

    let err = client.send_likes("42", "TW").await.unwrap_err();
    assert!(matches!(err, LikeError::Credential(CredentialError::Missing { .. })));
    assert_eq!(err.http_status(), 500);
    assert_eq!(server.total_calls(), 0);
}

#[tokio::test]
async fn metrics_track_invocations() {
    let dir = tempfile::tempdir().unwrap();
    write_store(dir.path(), "token_pk.json", &["a", "b"]);
    let server = Arc::new(
        FakeGameServer::with_query_bodies(vec![player_state(5, 1, "p"), player_state(8, 1, "p")])
            .rejecting(&["a"]),
    );
    let client = client_for(dir.path(), server);

    client.send_likes("1", "PK").await.unwrap();
    let snapshot = client.metrics().unwrap().snapshot();
    assert_eq!(snapshot.global.invocations, 1);
    assert_eq!(snapshot.global.total_attempts, 4);
    assert_eq!(snapshot.global.successes, 2);
    assert_eq!(snapshot.regions[0].likes_given, 3);
}
