mod common;

use std::time::Duration;

use common::fast_fetch;
use monitor_engine::{FailureKind, FetchSettings, ListingFetcher, Session};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_for(server: &MockServer, settings: &FetchSettings) -> (Session, Url) {
    let site = Url::parse(&server.uri()).unwrap();
    let session = Session::new(settings, &site).unwrap();
    (session, site.join("/browse.php?c=M").unwrap())
}

#[tokio::test]
async fn body_is_read_as_utf8_whatever_the_header_says() {
    let server = MockServer::start().await;
    let body = "<html><body><a href=\"/details.php?id=1\">千与千寻</a></body></html>";
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.as_bytes().to_vec(), "text/html; charset=ISO-8859-1"),
        )
        .mount(&server)
        .await;

    let (session, url) = session_for(&server, &fast_fetch());
    let page = ListingFetcher::default().fetch(&session, &url).await.unwrap();
    assert!(page.html.contains("千与千寻"));
    assert!(!page.had_errors);
}

#[tokio::test]
async fn invalid_utf8_is_replaced_and_flagged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"<p>caf\xe9</p>".to_vec(), "text/html"),
        )
        .mount(&server)
        .await;

    let (session, url) = session_for(&server, &fast_fetch());
    let page = ListingFetcher::default().fetch(&session, &url).await.unwrap();
    assert_eq!(page.html, "<p>caf\u{FFFD}</p>");
    assert!(page.had_errors);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (session, url) = session_for(&server, &fast_fetch());
    let err = ListingFetcher::default()
        .fetch(&session, &url)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn non_html_content_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let (session, url) = session_for(&server, &fast_fetch());
    let err = ListingFetcher::default()
        .fetch(&session, &url)
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::UnsupportedContentType { .. }
    ));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(200),
        ..fast_fetch()
    };
    let (session, url) = session_for(&server, &settings);
    let err = ListingFetcher::default()
        .fetch(&session, &url)
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/browse.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![b'a'; 2048], "text/html"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 1024,
        ..fast_fetch()
    };
    let (session, url) = session_for(&server, &settings);
    let err = ListingFetcher::default()
        .fetch(&session, &url)
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 1024, .. }));
}
