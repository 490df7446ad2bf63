//! Full request sequence against a mocked provider: search, token exchange,
//! component fetch with fallback, x-ray page.

use morningstar_api::{Client, ComponentOutcome, Error};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn search_token_component_sequence() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/en/util/SecuritySearch.ashx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"Fund|{"i":"0P0000ABCD","n":"Fund"}|FUND|more"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/es/funds/snapshot/snapshot.aspx"))
        .and(query_param("id", "0P0000ABCD"))
        .respond_with(ResponseTemplate::new(200).set_body_string("var FC =  'F00000XYZ';"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Common/funds/snapshot/PortfolioSAL.aspx"))
        .and(query_param("FC", "F00000XYZ"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"const maasToken = "tok-seq""#),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sal-service/v1/fund/portfolio/v2/sector/F00000XYZ/data"))
        .and(header("Authorization", "Bearer tok-seq"))
        .and(query_param("component", "sal-components-mip-sector-exposure"))
        .and(query_param("languageId", "de-DE"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"EQUITY": {"fundPortfolio": {}}})),
        )
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri()).unwrap();

    let hit = client
        .search_security("LU0000000001", "es")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.secid, "0P0000ABCD");
    assert_eq!(hit.kind, "fund");

    let token = client.bearer_token(&hit.secid, "es").await.unwrap();
    assert_eq!(token.secid, "F00000XYZ");

    let outcome = client
        .component_data(
            &token.secid,
            &hit.kind,
            "/sal-service/v1/{type}/portfolio/v2/sector/",
            "sal-components-mip-sector-exposure",
            &token.token,
        )
        .await
        .unwrap();
    assert!(matches!(outcome, ComponentOutcome::Data(_)));
}

#[tokio::test]
async fn unauthorized_component_then_xray() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sal-service/v1/etf/process/asset/v2/0P0000ABCD/data"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/j2uwuwirpv/xray/default.aspx"))
        .and(query_param("PortfolioType", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<table class="ms_data"><tr><th>Stocks</th></tr></table>"#),
        )
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri()).unwrap();
    let outcome = client
        .component_data(
            "0P0000ABCD",
            "etf",
            "/sal-service/v1/{type}/process/asset/v2/",
            "sal-components-mip-asset-allocation",
            "tok",
        )
        .await
        .unwrap();
    assert!(matches!(outcome, ComponentOutcome::Fallback));

    let page = client.xray_page("0P0000ABCD").await.unwrap();
    assert!(page.contains("ms_data"));
}

#[tokio::test]
async fn server_error_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/j2uwuwirpv/xray/default.aspx"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = Client::with_base_url(&server.uri()).unwrap();
    let err = client.xray_page("0P0000ABCD").await.unwrap_err();
    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}
