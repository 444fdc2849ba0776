// src/providers/tests/blockscout_tests.rs

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::super::blockscout::{
    parse_quote, token_quote, Blockscout, PriceSource, DEFAULT_TOKEN_ADDRESS,
};
use crate::error::Error;
use crate::models::TokenQuote;

/// Answer exactly one HTTP request with `status` and `body`; yields the raw request.
async fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 8192];
        let n = socket.read(&mut buf).await.unwrap();
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&buf[..n]).to_string()
    });

    (format!("http://{}/api/v2", addr), handle)
}

/// An address nothing listens on.
async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/v2", addr)
}

#[test]
fn test_parse_string_exchange_rate() {
    let quote = parse_quote(r#"{"exchange_rate": "3500.12", "decimals": 18}"#).unwrap();
    assert_eq!(
        quote,
        TokenQuote {
            price: 3500.12,
            decimals: 18
        }
    );
}

#[test]
fn test_parse_mixed_field_types() {
    let body = r#"{
        "address": "0x4200000000000000000000000000000000000006",
        "symbol": "WETH",
        "exchange_rate": 2999.5,
        "decimals": "18",
        "holders": "1234"
    }"#;
    let quote = parse_quote(body).unwrap();
    assert_eq!(quote.price, 2999.5);
    assert_eq!(quote.decimals, 18);
}

#[test]
fn test_parse_missing_or_invalid_fields() {
    assert!(matches!(
        parse_quote(r#"{"exchange_rate": null, "decimals": "18"}"#),
        Err(Error::MissingField("exchange_rate"))
    ));
    assert!(matches!(
        parse_quote(r#"{"exchange_rate": "1.0"}"#),
        Err(Error::MissingField("decimals"))
    ));
    assert!(matches!(
        parse_quote(r#"{"exchange_rate": "a lot", "decimals": 18}"#),
        Err(Error::InvalidField {
            field: "exchange_rate",
            ..
        })
    ));
    assert!(matches!(
        parse_quote(r#"{"exchange_rate": "1.0", "decimals": "-2"}"#),
        Err(Error::InvalidField {
            field: "decimals",
            ..
        })
    ));
    assert!(matches!(parse_quote("<html>"), Err(Error::Json(_))));
}

#[test]
fn test_token_url() {
    let blockscout = Blockscout::new("https://base.blockscout.com/api/v2/");
    assert_eq!(
        blockscout.token_url(DEFAULT_TOKEN_ADDRESS),
        "https://base.blockscout.com/api/v2/tokens/0x4200000000000000000000000000000000000006"
    );
}

#[tokio::test]
async fn test_fetch_quote_over_http() {
    let (base_url, request) =
        serve_once("200 OK", r#"{"exchange_rate": "3500.12", "decimals": 18}"#).await;
    let blockscout = Blockscout::new(&base_url);

    let quote = blockscout.fetch_quote(DEFAULT_TOKEN_ADDRESS).await.unwrap();
    assert_eq!(quote.price, 3500.12);
    assert_eq!(quote.decimals, 18);

    let request = request.await.unwrap();
    assert!(
        request.starts_with(
            "GET /api/v2/tokens/0x4200000000000000000000000000000000000006 HTTP/1.1"
        ),
        "unexpected request: {}",
        request
    );
}

#[tokio::test]
async fn test_error_status_falls_back() {
    let (base_url, _request) = serve_once("404 Not Found", r#"{"message": "Not found"}"#).await;
    let blockscout = Blockscout::new(&base_url);

    let err = blockscout.fetch_quote("0xdead").await.unwrap_err();
    assert!(matches!(err, Error::Api { status: 404, .. }));
}

#[tokio::test]
async fn test_network_failure_returns_fallback() {
    let blockscout = Blockscout::new(&closed_port_url().await);

    assert!(blockscout.fetch_quote(DEFAULT_TOKEN_ADDRESS).await.is_err());

    let quote = token_quote(&blockscout, DEFAULT_TOKEN_ADDRESS).await;
    assert_eq!(
        quote,
        TokenQuote {
            price: 0.0,
            decimals: 18
        }
    );
}

#[tokio::test]
async fn test_unparseable_body_returns_fallback() {
    let (base_url, _request) = serve_once("200 OK", r#"{"exchange_rate": null}"#).await;
    let blockscout = Blockscout::new(&base_url);

    let quote = token_quote(&blockscout, DEFAULT_TOKEN_ADDRESS).await;
    assert_eq!(quote, TokenQuote::FALLBACK);
}
