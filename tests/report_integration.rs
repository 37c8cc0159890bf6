//! End-to-end report tests against a mock storefront.

use iap_scout::config::{Config, OutputFormat};
use iap_scout::report::ExclusionReason;
use iap_scout::storefront::{HttpStorefront, StoreSource};
use iap_scout::{ReportCommand, ReportError};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LISTING_FIXTURE: &str = include_str!("fixtures/play_listing.html");

const NOT_FOUND_PAGE: &str =
    "<html><body><p>We're sorry, the requested URL was not found on this server.</p></body></html>";

fn listing(price_text: &str) -> String {
    LISTING_FIXTURE.replace("{{PRICE}}", price_text)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn make_config(regions: &[&str]) -> Config {
    let mut config = Config {
        regions: regions.iter().map(|r| r.to_string()).collect(),
        timeout_secs: 2,
        ..Config::default()
    };
    for (code, rate) in [("JPY", "155.85"), ("IDR", "16149.39"), ("TRY", "34.2"), ("KRW", "1380")] {
        config.rates.insert(code.to_string(), dec(rate));
    }
    config
}

async fn mount_region(server: &MockServer, region: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/store/apps/details"))
        .and(query_param("id", "com.example.quest"))
        .and(query_param("gl", region))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn play_report(server: &MockServer, config: Config) -> Result<iap_scout::Report, ReportError> {
    let client = HttpStorefront::with_base_url(&config, Some(server.uri())).unwrap();
    let cmd = ReportCommand::new(config);
    cmd.get_report_with_client(
        Arc::new(client),
        "https://play.google.com/store/apps/details?id=com.example.quest&hl=en",
    )
    .await
}

#[tokio::test]
async fn test_report_over_http() {
    let server = MockServer::start().await;

    mount_region(&server, "JP", ResponseTemplate::new(200).set_body_string(listing("¥160 - ¥12,000 per item"))).await;
    mount_region(&server, "ID", ResponseTemplate::new(200).set_body_string(listing("Rp 10.000 per item"))).await;
    mount_region(&server, "TR", ResponseTemplate::new(200).set_body_string(listing("₺34,20 - ₺3.420,00 per item"))).await;
    mount_region(&server, "US", ResponseTemplate::new(200).set_body_string(listing("$1.99 - $4.99 per item"))).await;
    mount_region(&server, "FR", ResponseTemplate::new(404)).await;
    mount_region(&server, "DE", ResponseTemplate::new(200).set_body_string(NOT_FOUND_PAGE)).await;
    mount_region(&server, "KR", ResponseTemplate::new(200).set_body_string("<html><h1>Example Quest</h1></html>")).await;

    let config = make_config(&["JP", "ID", "TR", "US", "FR", "DE", "KR"]);
    let report = play_report(&server, config).await.unwrap();

    assert_eq!(report.app_id, "com.example.quest");
    assert_eq!(report.app_title.as_deref(), Some("Example Quest"));

    let order: Vec<_> = report.quotes.iter().map(|q| q.region_code.as_str()).collect();
    assert_eq!(order, vec!["ID", "TR", "JP", "US"]);

    let id = &report.quotes[0];
    assert_eq!((id.min_usd, id.max_usd), (dec("0.62"), dec("0.62")));
    assert_eq!(id.raw_text, "Rp 10.000 per item");

    let tr = &report.quotes[1];
    assert_eq!((tr.min_usd, tr.max_usd), (dec("1.00"), dec("100.00")));

    let jp = &report.quotes[2];
    assert_eq!((jp.min_usd, jp.max_usd), (dec("1.03"), dec("77.00")));

    let us = &report.quotes[3];
    assert_eq!((us.min_usd, us.max_usd), (dec("1.99"), dec("4.99")));

    let excluded: Vec<_> = report.excluded.iter().map(|e| (e.region_code.as_str(), e.reason.clone())).collect();
    assert_eq!(
        excluded,
        vec![
            ("FR", ExclusionReason::NotFound),
            ("DE", ExclusionReason::NotFound),
            ("KR", ExclusionReason::NoOffer),
        ]
    );
}

#[tokio::test]
async fn test_slow_and_failing_regions_do_not_affect_others() {
    let server = MockServer::start().await;

    mount_region(&server, "JP", ResponseTemplate::new(200).set_body_string(listing("¥500 per item"))).await;
    mount_region(
        &server,
        "ID",
        ResponseTemplate::new(200)
            .set_body_string(listing("Rp 10.000 per item"))
            .set_delay(Duration::from_secs(5)),
    )
    .await;
    mount_region(&server, "US", ResponseTemplate::new(500)).await;

    let mut config = make_config(&["JP", "ID", "US"]);
    config.timeout_secs = 1;
    let report = play_report(&server, config).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.quotes[0].region_code, "JP");
    assert_eq!(report.quotes[0].min_usd, dec("3.21"));

    assert_eq!(report.excluded[0].region_code, "ID");
    assert_eq!(report.excluded[0].reason, ExclusionReason::Timeout);
    assert_eq!(report.excluded[1].region_code, "US");
    assert!(matches!(report.excluded[1].reason, ExclusionReason::TransportError(_)));
}

#[tokio::test]
async fn test_twelve_regions_in_three_batches() {
    let server = MockServer::start().await;

    // Every region answers with the same dollar listing
    Mock::given(method("GET"))
        .and(path("/store/apps/details"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing("$0.99 per item")))
        .expect(12)
        .mount(&server)
        .await;

    let regions = ["AU", "CA", "HK", "NZ", "SG", "TW", "US", "ZA", "IN", "IL", "JO", "PA"];
    let mut config = make_config(&regions);
    config.batch_size = 5;

    let report = play_report(&server, config).await.unwrap();
    assert_eq!(report.len() + report.excluded.len(), 12);

    for quote in &report.quotes {
        assert!(quote.min_usd >= dec("0.01"));
        assert!(quote.min_usd <= quote.max_usd);
    }
    for pair in report.quotes.windows(2) {
        assert!(pair[0].min_usd <= pair[1].min_usd);
    }
}

#[tokio::test]
async fn test_invalid_identifier_is_rejected_before_any_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = make_config(&["US"]);
    let client = HttpStorefront::with_base_url(&config, Some(server.uri())).unwrap();
    let cmd = ReportCommand::new(config);

    let result = cmd.get_report_with_client(Arc::new(client), "definitely not an app").await;
    assert!(matches!(result, Err(ReportError::InvalidAppIdentifier(_))));
}

#[tokio::test]
async fn test_app_store_json_source() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/jp/apps/284882215/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": "Example Quest",
            "offers": [
                {"name": "Small Pack", "price": "¥160", "duration": null},
                {"name": "Monthly Pass", "price": "¥1,500", "duration": "1 month"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/kr/apps/284882215/offers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"error": "App not found"})))
        .mount(&server)
        .await;

    let mut config = make_config(&["JP", "KR"]);
    config.source = StoreSource::AppStore;
    config.app_store_api_url = format!("{}/{{region}}/apps/{{app_id}}/offers", server.uri());

    let client = HttpStorefront::new(&config).unwrap();
    let cmd = ReportCommand::new(config);
    let report = cmd
        .get_report_with_client(Arc::new(client), "https://apps.apple.com/jp/app/example/id284882215")
        .await
        .unwrap();

    assert_eq!(report.app_title.as_deref(), Some("Example Quest"));
    assert_eq!(report.len(), 1);
    let quote = &report.quotes[0];
    assert_eq!(quote.offer_name.as_deref(), Some("Small Pack"));
    assert_eq!(quote.min_usd, dec("1.03"));
    assert_eq!(report.excluded[0].reason, ExclusionReason::NotFound);
}

#[tokio::test]
async fn test_csv_output_with_reference_currency() {
    let server = MockServer::start().await;

    mount_region(&server, "US", ResponseTemplate::new(200).set_body_string(listing("$1.00 - $10.00 per item"))).await;

    let mut config = make_config(&["US"]);
    config.format = OutputFormat::Csv;
    config.reference_currency = Some("RUB".to_string());
    config.rates.insert("RUB".to_string(), dec("90"));

    let client = HttpStorefront::with_base_url(&config, Some(server.uri())).unwrap();
    let cmd = ReportCommand::new(config);
    let output = cmd.execute_with_client(Arc::new(client), "com.example.quest").await.unwrap();

    assert_eq!(
        output,
        "Min Price (USD),Max Price (USD),Max Price (RUB),Country,Currency,Original Price\n\
         1.00,10.00,900.00,US,USD,$1.00 - $10.00 per item"
    );
}
