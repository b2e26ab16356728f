use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use t3watch::catalog::{Catalog, CatalogClient, CatalogError, Category, RetryPolicy};
use t3watch::controller::{Controller, ControllerSettings};
use t3watch::notify::{NoticeKind, Notifier};
use t3watch::player::{PlaybackOptions, Player, PlayerError};
use t3watch::session::StageStatus;

fn client(server: &MockServer) -> CatalogClient {
    CatalogClient::with_base_url(
        &server.uri(),
        Duration::from_secs(5),
        RetryPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
        },
    )
    .unwrap()
}

fn envelope(payload: serde_json::Value) -> serde_json::Value {
    json!({ "result": { "data": { "data": payload } } })
}

#[tokio::test]
async fn test_search_returns_shows() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.search"))
        .and(body_json(json!({ "text": "naruto", "type": "anime" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            { "name": "Naruto", "path": "/naruto", "img": "https://img/naruto.jpg" },
            { "name": "Naruto Shippuden", "path": "/shippuden" }
        ]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let shows = client(&mock_server)
        .search("naruto", Category::Anime)
        .await
        .unwrap();

    assert_eq!(shows.len(), 2);
    assert_eq!(shows[0].name, "Naruto");
    assert_eq!(shows[0].img.as_deref(), Some("https://img/naruto.jpg"));
    assert_eq!(shows[1].path, "/shippuden");
    assert_eq!(shows[1].img, None);
}

#[tokio::test]
async fn test_search_empty_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([]))))
        .mount(&mock_server)
        .await;

    let shows = client(&mock_server)
        .search("nonexistent", Category::Drama)
        .await
        .unwrap();
    assert!(shows.is_empty());
}

#[tokio::test]
async fn test_list_episodes_sends_path_and_category() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.episodes"))
        .and(body_json(json!({ "path": "/show-x", "type": "drama" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            { "name": "S1E1 finale", "path": "/s1e1" }
        ]))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let episodes = client(&mock_server)
        .list_episodes("/show-x", Category::Drama)
        .await
        .unwrap();

    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].name, "S1E1 finale");
}

#[tokio::test]
async fn test_resolve_episode_url_and_missing_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.episode"))
        .and(body_json(json!({ "path": "/e1", "type": "anime" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!("https://cdn.example/e1.m3u8"))),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.episode"))
        .and(body_json(json!({ "path": "/missing", "type": "anime" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": { "data": {} } })))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);

    let stream = client.resolve_episode("/e1", Category::Anime).await.unwrap();
    assert_eq!(stream.playable(), Some("https://cdn.example/e1.m3u8"));

    let stream = client
        .resolve_episode("/missing", Category::Anime)
        .await
        .unwrap();
    assert_eq!(stream.playable(), None);
}

#[tokio::test]
async fn test_retries_then_gives_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.search"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).search("naruto", Category::Anime).await;
    assert!(matches!(result, Err(CatalogError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.episodes"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.episodes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            { "name": "Episode 1", "path": "/e1" }
        ]))))
        .mount(&mock_server)
        .await;

    let episodes = client(&mock_server)
        .list_episodes("/naruto", Category::Anime)
        .await
        .unwrap();
    assert_eq!(episodes.len(), 1);
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.search"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&mock_server)
        .await;

    let result = client(&mock_server).search("naruto", Category::Anime).await;
    assert!(matches!(result, Err(CatalogError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_missing_list_payload_is_not_an_empty_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": { "data": {} } })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.episodes"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "data": { "data": null } } })),
        )
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let shows = client.search("naruto", Category::Anime).await;
    assert!(matches!(shows, Err(CatalogError::InvalidResponse(_))));

    let episodes = client.list_episodes("/naruto", Category::Anime).await;
    assert!(matches!(episodes, Err(CatalogError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!([])))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = CatalogClient::with_base_url(
        &mock_server.uri(),
        Duration::from_millis(100),
        RetryPolicy::none(),
    )
    .unwrap();

    let result = client.search("naruto", Category::Anime).await;
    assert!(matches!(result, Err(CatalogError::Timeout)));
}

#[derive(Default)]
struct RecordingNotifier(Vec<(NoticeKind, String)>);

impl Notifier for RecordingNotifier {
    fn notify(&mut self, kind: NoticeKind, message: &str) {
        self.0.push((kind, message.to_string()));
    }
}

struct NoPlayer;

impl Player for NoPlayer {
    fn render(&mut self, _url: &str, _options: &PlaybackOptions) -> Result<(), PlayerError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

#[tokio::test]
async fn test_exhausted_search_surfaces_one_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/trpc/fetcher.search"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut controller = Controller::new(
        client(&mock_server),
        RecordingNotifier::default(),
        NoPlayer,
        ControllerSettings {
            debounce: Duration::from_millis(10),
            ..ControllerSettings::default()
        },
    );

    controller.input("naruto");
    controller.run_until_idle().await;

    let session = controller.session();
    assert_eq!(session.search_status(), StageStatus::Error);
    assert!(session.shows().is_empty());
    assert_eq!(controller.notifier().0.len(), 1);
    assert_eq!(controller.notifier().0[0].0, NoticeKind::Error);
}
