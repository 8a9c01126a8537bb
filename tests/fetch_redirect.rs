//! The real HTTP client against a loopback server.

mod common;

use common::Route;
use github520::fetch::{ContentFetcher, HttpGet, HyperClient};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn plain_get_returns_body() {
    let base = common::serve_http(vec![Route::ok("/hosts", "1.1.1.1 a")]);
    let client = HyperClient::new().unwrap();

    let res = client.get(&format!("{base}/hosts"), TIMEOUT).unwrap();

    assert_eq!(res.status, 200);
    assert_eq!(res.body, "1.1.1.1 a");
}

#[test]
fn redirects_are_followed() {
    let base = common::serve_http(vec![
        Route::redirect("/old", 302, "/hosts"),
        Route::ok("/hosts", "1.1.1.1 a"),
    ]);
    let client = HyperClient::new().unwrap();

    let res = client.get(&format!("{base}/old"), TIMEOUT).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.body, "1.1.1.1 a");

    let fetcher = ContentFetcher::new(&client, TIMEOUT);
    assert_eq!(
        fetcher.fetch(&[format!("{base}/old")]).as_deref(),
        Some("1.1.1.1 a")
    );
}

#[test]
fn redirect_chain_with_absolute_location() {
    let base = common::serve_http(vec![
        Route::redirect("/a", 301, "/b"),
        Route::redirect("/b", 308, "/c"),
        Route::ok("/c", "2.2.2.2 b"),
    ]);
    let client = HyperClient::new().unwrap();

    let res = client.get(&format!("{base}/a"), TIMEOUT).unwrap();

    assert_eq!(res.body, "2.2.2.2 b");
}

#[test]
fn redirect_loop_is_a_network_error() {
    let base = common::serve_http(vec![Route::redirect("/loop", 302, "/loop")]);
    let client = HyperClient::new().unwrap();

    let err = client.get(&format!("{base}/loop"), TIMEOUT).unwrap_err();

    assert!(matches!(err, github520::Error::Network { .. }));
    assert!(err.to_string().contains("redirects"));
}

#[test]
fn not_found_is_returned_as_status() {
    let base = common::serve_http(vec![]);
    let client = HyperClient::new().unwrap();

    let res = client.get(&format!("{base}/missing"), TIMEOUT).unwrap();

    assert_eq!(res.status, 404);
}
