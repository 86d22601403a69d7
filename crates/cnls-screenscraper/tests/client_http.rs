//! Client tests against a local mock of the cNLS Mapper form endpoint.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cnls_screenscraper::{
    BatchOutcome, BatchRunner, CnlsError, NlsVariant, Screenscraper, ScreenscraperConfig,
};
use futures::StreamExt;

const FORM_PATH: &str = "/cgi-bin/NLS_Mapper_y.cgi";
const SEQ: &str = "MPKKKRKVEDPRRKRSEDPNLAAKKRRLSEE";

fn page(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/data/{name}",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn config_for(server: &MockServer) -> ScreenscraperConfig {
    ScreenscraperConfig {
        endpoint: format!("{}{FORM_PATH}", server.uri()),
        timeout_ms: 5_000,
        pause: Duration::ZERO,
        ..ScreenscraperConfig::default()
    }
}

#[tokio::test]
async fn submit_posts_form_and_parses_page() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(FORM_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("cut_off=5.0"))
        .and(body_string_contains(format!("typedseq={SEQ}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("monopartite_hit.html")))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = Screenscraper::new(&config);
    let prediction = client.submit(SEQ, "5.0", config.pause).await.unwrap();

    assert_eq!(prediction.len(), 1);
    assert_eq!(prediction.max_score(NlsVariant::Monopartite), 10.0);
}

#[tokio::test]
async fn fetch_raw_returns_body_verbatim() {
    let server = MockServer::start().await;
    let body = page("nohits.html");
    Mock::given(method("POST"))
        .and(path(FORM_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let raw = Screenscraper::new(&config)
        .fetch_raw(SEQ, "3.0", Duration::ZERO)
        .await
        .unwrap();
    assert_eq!(raw, body);
}

#[tokio::test]
async fn invalid_cutoff_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = Screenscraper::new(&config)
        .submit(SEQ, "7.0", Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, CnlsError::InvalidParameter(_)));
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = Screenscraper::new(&config)
        .fetch_raw(SEQ, "3.0", Duration::ZERO)
        .await
        .unwrap_err();
    match err {
        CnlsError::Network {
            cut_off, reason, ..
        } => {
            assert_eq!(cut_off, "3.0");
            assert!(reason.contains("502"), "{reason}");
        }
        other => panic!("expected network error, got {other:?}"),
    }
}

#[tokio::test]
async fn too_long_page_surfaces_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("too_long.html")))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let err = Screenscraper::new(&config)
        .submit(SEQ, "3.0", Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, CnlsError::QueryTooLong));
}

#[tokio::test]
async fn batch_run_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("multiple_hits.html")))
        .expect(2)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let runner = BatchRunner::new(Screenscraper::new(&config), &config);
    let entries = vec![
        ("p53_fragment".to_string(), SEQ.to_string()),
        ("too_short".to_string(), "MKR".to_string()),
        ("sv40".to_string(), SEQ.to_string()),
    ];
    let items: Vec<_> = runner.predict(entries).collect().await;

    assert_eq!(items.len(), 3);
    assert!(matches!(&items[0].outcome, BatchOutcome::Done(p) if p.len() == 4));
    assert!(matches!(items[1].outcome, BatchOutcome::Skipped(_)));
    assert!(matches!(&items[2].outcome, BatchOutcome::Done(p) if p.has_variant(NlsVariant::Bipartite, Some(7.0))));
}
