use crate::Error;
use crate::config::PublishConfig;
use crate::publish::{HttpPublisher, HttpPublisherFactory, PublisherFactory};
use crate::types::{AuthorId, Book, BookId, Credential};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> PublishConfig {
    PublishConfig {
        endpoint: format!("{}/admin/create-book", server.uri()),
        origin: Some("https://bookspointer.test".to_string()),
        timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn book(category: &str) -> Book {
    Book {
        id: BookId(11),
        author_id: AuthorId(2),
        title: "দেবী".to_string(),
        author_name: Some("Jane Doe".to_string()),
        remote_author_id: Some("248".to_string()),
        category: Some(category.to_string()),
        category_id: Some(3),
        book_link: "https://catalog.test/books/debi".to_string(),
        content: "<p>body</p>".to_string(),
        is_posted: false,
        created_at: chrono::Utc::now(),
    }
}

#[test]
fn test_payload_shape() {
    let publisher = HttpPublisher::new(&PublishConfig::default(), Credential::new("t")).unwrap();
    let book = book("উপন্যাস");

    let json = serde_json::to_value(publisher.payload(&book).unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "title": "দেবী",
            "category": {"id": 3},
            "author": {"id": 248},
            "content": "<p>body</p>",
            "tags": [],
            "seriesName": ""
        })
    );
}

#[test]
fn test_incomplete_books_carry_series_name() {
    let publisher = HttpPublisher::new(&PublishConfig::default(), Credential::new("t")).unwrap();
    let book = book("অসম্পূর্ণ বই");

    let json = serde_json::to_value(publisher.payload(&book).unwrap()).unwrap();
    assert_eq!(json["seriesName"], "অসম্পূর্ণ বই");
}

#[test]
fn test_book_without_author_id_is_rejected_locally() {
    let publisher = HttpPublisher::new(&PublishConfig::default(), Credential::new("t")).unwrap();
    let mut book = book("উপন্যাস");
    book.remote_author_id = None;

    assert!(matches!(
        publisher.payload(&book),
        Err(Error::Rejected { status: None, .. })
    ));
}

#[tokio::test]
async fn test_accepted_post_returns_remote_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/create-book"))
        .and(header("authorization", "Bearer token-a"))
        .and(header("origin", "https://bookspointer.test"))
        .and(header("referer", "https://bookspointer.test/"))
        .and(body_string_contains("name=\"data\""))
        .and(body_string_contains("\"seriesName\":\"\""))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "last_book": {"id": 9001}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let factory = HttpPublisherFactory::new(config(&server));
    let publisher = factory.client(&Credential::new("token-a")).unwrap();
    let receipt = publisher.post(&book("উপন্যাস")).await.unwrap();

    assert_eq!(receipt.remote_id, "9001");
}

#[tokio::test]
async fn test_success_status_without_book_id_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/create-book"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Book already exists"
        })))
        .mount(&server)
        .await;

    let publisher = HttpPublisherFactory::new(config(&server))
        .client(&Credential::new("token-a"))
        .unwrap();
    match publisher.post(&book("উপন্যাস")).await {
        Err(Error::Rejected { status, message }) => {
            assert_eq!(status, Some(200));
            assert_eq!(message, "Book already exists");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_is_rejection_even_with_book_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/create-book"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"last_book": {"id": 1}, "message": "expired"})),
        )
        .mount(&server)
        .await;

    let publisher = HttpPublisherFactory::new(config(&server))
        .client(&Credential::new("token-a"))
        .unwrap();
    let result = publisher.post(&book("উপন্যাস")).await;
    assert!(matches!(
        result,
        Err(Error::Rejected {
            status: Some(401),
            ..
        })
    ));
}

#[tokio::test]
async fn test_non_json_body_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/create-book"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let publisher = HttpPublisherFactory::new(config(&server))
        .client(&Credential::new("token-a"))
        .unwrap();
    match publisher.post(&book("উপন্যাস")).await {
        Err(Error::Rejected { message, .. }) => assert_eq!(message, "HTTP 502 without book id"),
        other => panic!("expected rejection, got {other:?}"),
    }
}
