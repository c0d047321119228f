/*!
 * Census client tests against a local mock of the Census API.
 */
use httpmock::prelude::*;
use serde_json::json;

use ps2stats::census::{load_data_file, CensusClient, CensusItem, DataFile};
use ps2stats::Error;

const SERVICE_ID: &str = "example";

fn item(id: u32) -> serde_json::Value {
    json!({
        "item_id": id.to_string(),
        "item_category_id": "7",
        "is_vehicle_weapon": "0",
        "name": {"en": format!("Rifle {id}")},
        "faction_id": "2"
    })
}

#[test_log::test(tokio::test)]
async fn test_fetch_all_pages() {
    let server = MockServer::start_async().await;

    let first_page = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/s:example/get/ps2:v2/item")
                .query_param("c:start", "0")
                .query_param("c:limit", "2")
                .query_param("item_type_id", "26");
            then.status(200)
                .json_body(json!({"item_list": [item(1), item(2)], "returned": 2}));
        })
        .await;
    let second_page = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/s:example/get/ps2:v2/item")
                .query_param("c:start", "2");
            then.status(200)
                .json_body(json!({"item_list": [item(3)], "returned": 1}));
        })
        .await;

    let client = CensusClient::new(SERVICE_ID)
        .with_base_url(&server.base_url())
        .with_page_size(2);
    let records = client.fetch_all(DataFile::Weapons).await.unwrap();

    first_page.assert_async().await;
    second_page.assert_async().await;
    assert_eq!(records.len(), 3);
    assert_eq!(records[2]["item_id"], "3");
}

#[test_log::test(tokio::test)]
async fn test_error_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/s:example/get/ps2:v2/fire_group");
            then.status(200)
                .json_body(json!({"error": "No data found."}));
        })
        .await;

    let client = CensusClient::new(SERVICE_ID).with_base_url(&server.base_url());
    let err = client.fetch_all(DataFile::FireGroups).await.unwrap_err();

    match err {
        Error::CensusResponse {
            collection,
            message,
        } => {
            assert_eq!(collection, "fire_group");
            assert_eq!(message, "No data found.");
        }
        other => panic!("Unexpected error {other:?}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_failure_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(503);
        })
        .await;

    let client = CensusClient::new(SERVICE_ID).with_base_url(&server.base_url());
    let err = client.fetch_all(DataFile::Weapons).await.unwrap_err();
    assert!(matches!(err, Error::Census(_)));
}

#[test_log::test(tokio::test)]
async fn test_update_data_file() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/s:example/get/ps2:v2/item");
            then.status(200)
                .json_body(json!({"item_list": [item(80)], "returned": 1}));
        })
        .await;

    let directory = tempfile::tempdir().unwrap();
    let client = CensusClient::new(SERVICE_ID).with_base_url(&server.base_url());
    let count = client
        .update_data_file(DataFile::Weapons, directory.path())
        .await
        .unwrap();
    assert_eq!(count, 1);

    let items: Vec<CensusItem> = load_data_file(directory.path(), DataFile::Weapons).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].item_id, 80);
    assert_eq!(items[0].name.as_ref().unwrap().en, "Rifle 80");
}
