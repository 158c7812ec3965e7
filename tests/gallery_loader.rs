use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use project_gallery::gallery::{
    self, EmptyState, GalleryContainer, GalleryLoader, HtmlGallery, ImageResolver, LoadOutcome,
};
use project_gallery::observer::{Bounds, ObserverOptions, RevealObserver, Viewport};
use project_gallery::source::{FileSource, HttpSource, RetryPolicy};
use project_gallery::LoadError;

// Counts error events emitted by this crate
struct ErrorCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if *meta.level() == Level::ERROR && meta.target().starts_with("project_gallery") {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn no_retry() -> RetryPolicy {
    RetryPolicy {
        timeout: Duration::from_secs(5),
        retries: 0,
    }
}

fn container() -> HtmlGallery {
    HtmlGallery::new().with_empty_state(EmptyState::new("<p>No projects yet.</p>"))
}

async fn serve(body: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/projects.json"))
        .respond_with(body)
        .mount(&server)
        .await;
    server
}

fn loader_for(server: &MockServer) -> GalleryLoader {
    let url = format!("{}/data/projects.json", server.uri());
    GalleryLoader::new(Box::new(HttpSource::new(url).unwrap())).with_policy(no_retry())
}

async fn load(loader: &GalleryLoader) -> (HtmlGallery, RevealObserver, LoadOutcome) {
    let mut gallery = container();
    let (mut observer, _rx) = RevealObserver::new(ObserverOptions::default());
    let outcome = loader.load_and_render(&mut gallery, &mut observer).await;
    (gallery, observer, outcome)
}

fn project(id: &str, date: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Project {}", id),
        "description": "Panels on a roof",
        "category": "Residential",
        "image": format!("assets/images/{}.jpg", id),
        "date": date,
    })
}

#[tokio::test]
async fn renders_one_card_per_project_newest_first() {
    let body = json!({ "projects": [
        project("a", "2023-02-01"),
        project("b", "2024-08-15"),
        project("c", "2021-12-31"),
        project("d", "2024-01-20"),
    ]});
    let server = serve(ResponseTemplate::new(200).set_body_json(body)).await;

    let (gallery, observer, outcome) = load(&loader_for(&server)).await;

    assert!(matches!(outcome, LoadOutcome::Rendered(4)));
    assert_eq!(gallery.card_ids(), vec!["b", "d", "a", "c"]);
    assert!(!gallery.is_hidden());
    assert!(!gallery.is_empty_state_visible());
    assert_eq!(observer.watched_count(), 4);

    let delays: Vec<String> = gallery.cards().iter().map(|c| c.transition_delay_css()).collect();
    assert_eq!(delays, vec!["0s", "0.1s", "0.2s", "0.3s"]);

    let html = gallery.render();
    assert!(html.find("id=\"b\"").unwrap() < html.find("id=\"c\"").unwrap());
}

#[tokio::test]
async fn equal_dates_keep_document_order() {
    let body = json!({ "projects": [
        project("first", "2024-03-01"),
        project("second", "2024-03-01"),
        project("newest", "2024-04-01"),
        project("third", "2024-03-01"),
    ]});
    let server = serve(ResponseTemplate::new(200).set_body_json(body)).await;

    let (gallery, _, _) = load(&loader_for(&server)).await;

    assert_eq!(gallery.card_ids(), vec!["newest", "first", "second", "third"]);
}

#[tokio::test]
async fn zero_projects_shows_empty_state_without_logging_an_error() {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = serve(ResponseTemplate::new(200).set_body_json(json!({ "projects": [] }))).await;
    let (gallery, observer, outcome) = load(&loader_for(&server)).await;

    assert!(matches!(outcome, LoadOutcome::Empty));
    assert!(gallery.cards().is_empty());
    assert!(gallery.is_hidden());
    assert!(gallery.is_empty_state_visible());
    assert_eq!(observer.watched_count(), 0);
    assert_eq!(errors.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_error_matches_empty_state_and_logs_once() {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = serve(ResponseTemplate::new(500)).await;
    let (gallery, _, outcome) = load(&loader_for(&server)).await;

    assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Status { status: 500, .. })));
    assert!(outcome.is_empty_state());
    assert!(gallery.cards().is_empty());
    assert!(gallery.is_empty_state_visible());
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    let empty_server = serve(ResponseTemplate::new(200).set_body_json(json!({ "projects": [] }))).await;
    let (empty, _, _) = load(&loader_for(&empty_server)).await;
    assert_eq!(gallery.render(), empty.render());
}

#[tokio::test]
async fn malformed_json_matches_empty_state_and_logs_once() {
    let errors = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(ErrorCounter(Arc::clone(&errors)));
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = serve(ResponseTemplate::new(200).set_body_string("{ \"projects\": [")).await;
    let (gallery, _, outcome) = load(&loader_for(&server)).await;

    assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Malformed(_))));
    assert!(gallery.cards().is_empty());
    assert!(gallery.is_empty_state_visible());
    assert_eq!(errors.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn null_display_fields_still_render() {
    let body = r#"{ "projects": [
        { "id": "a", "title": null, "description": null, "category": null, "image": null, "date": "2024-01-01" },
        { "id": 7, "title": "Barn", "date": null }
    ]}"#;
    let server = serve(ResponseTemplate::new(200).set_body_string(body)).await;
    let (gallery, _, outcome) = load(&loader_for(&server)).await;

    assert!(matches!(outcome, LoadOutcome::Rendered(2)));
    assert_eq!(gallery.card_ids(), vec!["a", "7"]);
    assert_eq!(gallery.cards()[0].title, "");
    assert!(gallery.cards()[0].image.fallback);
}

#[tokio::test]
async fn reload_after_a_failure_renders_fresh_cards() {
    let body = json!({ "projects": [project("a", "2024-01-01")] });
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/projects.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/projects.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/projects.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let loader = loader_for(&server);
    let mut gallery = container();
    let (mut observer, mut rx) = RevealObserver::new(ObserverOptions::default());
    let layout = |id: &str| (id == "a").then(|| Bounds::new(0.0, 100.0));

    assert!(matches!(
        loader.load_and_render(&mut gallery, &mut observer).await,
        LoadOutcome::Rendered(1)
    ));
    observer.evaluate(Viewport::new(0.0, 800.0), &layout);
    assert_eq!(gallery::apply_reveals(&mut gallery, &mut rx), 1);

    let failed = loader.load_and_render(&mut gallery, &mut observer).await;
    assert!(matches!(failed, LoadOutcome::Failed(LoadError::Status { status: 500, .. })));
    assert!(gallery.is_hidden());

    let outcome = loader.load_and_render(&mut gallery, &mut observer).await;
    assert!(matches!(outcome, LoadOutcome::Rendered(1)));
    assert!(!gallery.is_hidden());
    assert!(!gallery.is_empty_state_visible());
    assert!(!gallery.cards()[0].is_revealed());
    assert!(observer.is_watching("a"));

    observer.evaluate(Viewport::new(0.0, 800.0), &layout);
    assert_eq!(gallery::apply_reveals(&mut gallery, &mut rx), 1);
    assert!(gallery.cards()[0].is_revealed());
}

#[tokio::test]
async fn server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/projects.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/data/projects.json", server.uri());
    let loader = GalleryLoader::new(Box::new(HttpSource::new(url).unwrap()))
        .with_policy(RetryPolicy { timeout: Duration::from_secs(5), retries: 1 });
    let (_, _, outcome) = load(&loader).await;

    assert!(outcome.is_empty_state());
    server.verify().await;
}

#[tokio::test]
async fn slow_server_times_out_into_empty_state() {
    let server = serve(
        ResponseTemplate::new(200)
            .set_body_json(json!({ "projects": [project("late", "2024-01-01")] }))
            .set_delay(Duration::from_secs(2)),
    )
    .await;
    let url = format!("{}/data/projects.json", server.uri());
    let loader = GalleryLoader::new(Box::new(HttpSource::new(url).unwrap())).with_policy(RetryPolicy {
        timeout: Duration::from_millis(100),
        retries: 0,
    });

    let (gallery, _, outcome) = load(&loader).await;

    assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Timeout(_))));
    assert!(gallery.is_empty_state_visible());
}

#[tokio::test]
async fn broken_images_fall_back() {
    let site = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(site.path().join("assets/images")).unwrap();
    std::fs::write(site.path().join("assets/images/ok.jpg"), b"jpeg").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/remote/good.png"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/remote/page.html"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(&server)
        .await;

    let document = json!({ "projects": [
        { "id": "ok", "image": "assets/images/ok.jpg", "date": "2024-05-01" },
        { "id": "missing", "image": "assets/images/missing.jpg", "date": "2024-04-01" },
        { "id": "remote", "image": format!("{}/remote/good.png", server.uri()), "date": "2024-03-01" },
        { "id": "not-image", "image": format!("{}/remote/page.html", server.uri()), "date": "2024-02-01" },
        { "id": "gone", "image": format!("{}/remote/404.png", server.uri()), "date": "2024-01-01" },
        { "id": "none", "date": "2023-01-01" },
    ]});
    let data = site.path().join("projects.json");
    std::fs::write(&data, serde_json::to_vec(&document).unwrap()).unwrap();

    let loader = GalleryLoader::new(Box::new(FileSource::new(&data)))
        .with_fallback_image("assets/images/logo.png")
        .with_image_resolver(ImageResolver::new(reqwest::Client::new(), site.path()));
    let (gallery, _, outcome) = load(&loader).await;

    assert!(matches!(outcome, LoadOutcome::Rendered(6)));
    let fallback: Vec<(&str, bool)> = gallery
        .cards()
        .iter()
        .map(|card| (card.id.as_str(), card.image.fallback))
        .collect();
    assert_eq!(
        fallback,
        vec![
            ("ok", false),
            ("missing", true),
            ("remote", false),
            ("not-image", true),
            ("gone", true),
            ("none", true),
        ]
    );
    let missing = &gallery.cards()[1];
    assert_eq!(missing.image.src, "assets/images/logo.png");
    assert!(gallery.render().contains("class=\"fallback-image\""));
}

#[tokio::test]
async fn missing_file_source_shows_empty_state() {
    let site = tempfile::tempdir().unwrap();
    let loader = GalleryLoader::new(Box::new(FileSource::new(site.path().join("nope.json"))))
        .with_policy(no_retry());
    let (gallery, _, outcome) = load(&loader).await;

    assert!(matches!(outcome, LoadOutcome::Failed(LoadError::Io { .. })));
    assert!(gallery.is_empty_state_visible());
}

#[tokio::test]
async fn rendered_cards_reveal_through_the_observer() {
    let body = json!({ "projects": [project("a", "2024-01-01"), project("b", "2023-01-01")] });
    let server = serve(ResponseTemplate::new(200).set_body_json(body)).await;
    let loader = loader_for(&server);

    let mut gallery = container();
    let (mut observer, mut rx) = RevealObserver::new(ObserverOptions::default());
    loader.load_and_render(&mut gallery, &mut observer).await;

    // a sits at 0..400, b at 400..800
    let layout = |id: &str| match id {
        "a" => Some(Bounds::new(0.0, 400.0)),
        "b" => Some(Bounds::new(400.0, 400.0)),
        _ => None,
    };

    // bottom edge pulled up to 350
    observer.evaluate(Viewport::new(0.0, 400.0), &layout);
    assert_eq!(gallery::apply_reveals(&mut gallery, &mut rx), 1);
    assert!(gallery.cards()[0].is_revealed());
    assert!(!gallery.cards()[1].is_revealed());

    observer.evaluate(Viewport::new(400.0, 500.0), &layout);
    observer.evaluate(Viewport::new(0.0, 100.0), &layout);
    gallery::apply_reveals(&mut gallery, &mut rx);

    assert!(gallery.cards().iter().all(|card| card.is_revealed()));
    assert!(gallery.render().contains("class=\"project-card reveal revealed\" id=\"b\""));
}
