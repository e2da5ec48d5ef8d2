//! End-to-end tests of system query options.

use reqwest::StatusCode;
use serde_json::Value;

mod common;

async fn query(url: &str, options: &[(&str, &str)]) -> (StatusCode, Value) {
    let res = reqwest::Client::new()
        .get(url)
        .query(options)
        .send()
        .await
        .unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

fn ids(body: &Value) -> Vec<i64> {
    body["value"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["ID"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_filter() {
    let server = common::spawn_default().await;
    let books = server.url("Books");

    let (status, body) = query(&books, &[("$filter", "ForKids eq true")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 3, 5]);

    let (_, body) = query(&books, &[("$filter", "ID gt 2 and ForKids eq false")]).await;
    assert_eq!(ids(&body), vec![4]);

    let (_, body) = query(&books, &[("$filter", "contains(Title,'Prince')")]).await;
    assert_eq!(ids(&body), vec![1]);

    let (status, body) = query(&books, &[("$filter", "Publisher eq 'x'")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidQueryOption");

    let (status, _) = query(&books, &[("$filter", "ID eq 'one'")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orderby_and_paging() {
    let server = common::spawn_default().await;
    let books = server.url("Books");

    let (status, body) = query(&books, &[("$orderby", "ID desc"), ("$top", "1")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![5]);

    let (_, body) = query(&books, &[("$orderby", "Title"), ("$skip", "3")]).await;
    // Crime and Punishment, Finn Family Moomintroll, Good Omens, Pippi.., The Little Prince
    assert_eq!(ids(&body), vec![3, 1]);

    let (status, _) = query(&books, &[("$orderby", "Nope")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_top_limit() {
    let server = common::spawn_default().await;
    let books = server.url("Books");

    let (status, _) = query(&books, &[("$top", "1")]).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = query(&books, &[("$top", "2")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("$top"));

    let (status, _) = query(&books, &[("$top", "-1")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_count() {
    let server = common::spawn_default().await;

    let (status, body) = query(
        &server.url("Books"),
        &[("$filter", "ForKids eq true"), ("$count", "true"), ("$top", "1")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["@odata.count"], 3);
    assert_eq!(ids(&body), vec![1]);

    let res = reqwest::Client::new()
        .get(server.url("Books/$count"))
        .query(&[("$filter", "ForKids eq false")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "2");
}

#[tokio::test]
async fn test_select_and_expand() {
    let server = common::spawn_default().await;

    let (status, body) = query(
        &server.url("Books(1)"),
        &[("$select", "Title"), ("$expand", "MainAuthor")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Title"], "The Little Prince");
    assert!(body.get("ForKids").is_none());
    assert_eq!(body["MainAuthor"]["Name"], "Antoine de Saint-Exupery");
    assert!(body["@odata.context"]
        .as_str()
        .unwrap()
        .ends_with("$metadata#Books(Title)/$entity"));

    let (status, body) = query(&server.url("Books"), &[("$expand", "*"), ("$top", "1")]).await;
    assert_eq!(status, StatusCode::OK);
    let first = &body["value"][0];
    assert!(first.get("MainAuthor").is_some());
    assert!(first.get("Authors").is_some());
    assert!(first.get("Translators").is_some());

    let (status, _) = query(&server.url("Books"), &[("$expand", "Publisher")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_count_uses_configured_limits() {
    let server = common::spawn_with_toml(
        r#"
        [odata]
        max_filter_length = 10
        "#,
    )
    .await;

    let (status, body) = query(
        &server.url("Books/$count"),
        &[("$filter", "ForKids eq false")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidQueryOption");

    let res = reqwest::Client::new()
        .get(server.url("Books/$count"))
        .query(&[("$filter", "ID gt 3")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "2");
}

#[tokio::test]
async fn test_select_navigation_without_expand() {
    let server = common::spawn_default().await;

    let (status, body) = query(&server.url("Books(1)"), &[("$select", "MainAuthor")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "InvalidQueryOption");

    let (status, body) = query(
        &server.url("Books(1)"),
        &[("$select", "MainAuthor"), ("$expand", "MainAuthor")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["MainAuthor"]["Name"], "Antoine de Saint-Exupery");
    assert!(body.get("Title").is_none());
}

#[tokio::test]
async fn test_expansion_depth_limit() {
    let server = common::spawn_with_toml(
        r#"
        [odata]
        max_expansion_depth = 0
        "#,
    )
    .await;

    let (status, body) = query(&server.url("Books"), &[("$expand", "MainAuthor")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("expansion depth"));
}

#[tokio::test]
async fn test_server_driven_paging() {
    let server = common::spawn_with_toml(
        r#"
        [odata]
        max_page_size = 2
        max_top = 10
        "#,
    )
    .await;

    let (status, body) = query(&server.url("Books"), &[("$filter", "ID ge 1")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2]);

    let next = body["@odata.nextLink"].as_str().unwrap().to_string();
    assert!(next.contains("skip=2"));

    let res = reqwest::get(&next).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(ids(&body), vec![3, 4]);

    let next = body["@odata.nextLink"].as_str().unwrap().to_string();
    let body: Value = reqwest::get(&next).await.unwrap().json().await.unwrap();
    assert_eq!(ids(&body), vec![5]);
    assert!(body.get("@odata.nextLink").is_none());
}

#[tokio::test]
async fn test_option_validation() {
    let server = common::spawn_default().await;
    let books = server.url("Books");

    let (status, body) = query(&books, &[("$search", "prince")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("$search"));

    let (status, _) = query(&books, &[("$skip", "1"), ("$skip", "2")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = query(&books, &[("custom", "ignored")]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body).len(), 5);

    let (status, _) = query(&server.url("Books(1)"), &[("$top", "1")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
