mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn default_page_size_is_ten() {
    let app = TestApp::new().await;
    app.seed(15).await;
    let (status, page) = app.get("/todo").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 15);
    assert_eq!(page["limit"], 10);
    assert_eq!(page["skip"], 0);
    assert_eq!(page["data"].as_array().unwrap().len(), 10);
    assert_eq!(page["data"][0]["id"], 1);
}

#[tokio::test]
async fn limit_is_clamped_to_maximum() {
    let app = TestApp::new().await;
    app.seed(60).await;
    let (_, page) = app.get("/todo?$limit=100").await;
    assert_eq!(page["total"], 60);
    assert_eq!(page["limit"], 50);
    assert_eq!(page["data"].as_array().unwrap().len(), 50);
}

#[tokio::test]
async fn zero_limit_counts_only() {
    let app = TestApp::new().await;
    app.seed(3).await;
    let (_, page) = app.get("/todo?$limit=0").await;
    assert_eq!(page["total"], 3);
    assert_eq!(page["limit"], 0);
    assert_eq!(page["data"], json!([]));
}

#[tokio::test]
async fn skip_walks_pages() {
    let app = TestApp::new().await;
    app.seed(25).await;
    let (_, page) = app.get("/todo?$skip=10").await;
    assert_eq!(page["skip"], 10);
    assert_eq!(page["data"].as_array().unwrap().len(), 10);
    assert_eq!(page["data"][0]["id"], 11);

    let (_, page) = app.get("/todo?$skip=20").await;
    assert_eq!(page["data"].as_array().unwrap().len(), 5);

    let (_, page) = app.get("/todo?$skip=100").await;
    assert_eq!(page["total"], 25);
    assert_eq!(page["data"], json!([]));
}

#[tokio::test]
async fn skip_past_signed_range_is_an_empty_page() {
    let app = TestApp::new().await;
    app.seed(3).await;
    let (status, page) = app.get("/todo?$skip=9223372036854775808").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 3);
    assert_eq!(page["data"], json!([]));
}

#[tokio::test]
async fn filters_and_sort() {
    let app = TestApp::new().await;
    app.seed(6).await;

    let (_, page) = app.get("/todo?isDone=true").await;
    assert_eq!(page["total"], 3);
    assert!(page["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["isDone"] == true));

    let (_, page) = app.get("/todo?%24sort%5Bid%5D=-1&$limit=2").await;
    assert_eq!(page["data"][0]["id"], 6);
    assert_eq!(page["data"][1]["id"], 5);

    let (_, page) = app.get("/todo?id%5B%24gt%5D=4").await;
    assert_eq!(page["total"], 2);

    let (_, page) = app.get("/todo?id%5B%24in%5D%5B%5D=1&id%5B%24in%5D%5B%5D=3").await;
    assert_eq!(page["total"], 2);
    assert_eq!(page["data"][1]["id"], 3);
}
