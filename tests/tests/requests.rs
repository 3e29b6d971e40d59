//! Full request bodies in, status code and response body out.

use canopy_tests::prelude::*;

// ========== TEST: successful request ==========
#[test]
fn test_successful_request_response_shape() {
    // GIVEN a request creating a text
    let site = Site::new();
    let body = json!({
        "workspace": "live",
        "dimensions": {},
        "dryRun": false,
        "patches": [
            {"operation": "createNode", "parentNodeId": site.id("home/main"),
             "nodeType": "Site:Text", "nodeName": "welcome",
             "properties": {"title": "Welcome"}}
        ]
    });

    // WHEN handling it
    let response = site.handle(&body);

    // THEN 200 with the created node reported
    assert_eq!(response.status, 200);
    assert_eq!(response.body["success"], json!(true));
    assert_eq!(response.body["dryRun"], json!(false));
    assert!(response.body.get("error").is_none());
    let result = &response.body["results"][0];
    assert_eq!(result["index"], json!(0));
    assert_eq!(result["operation"], json!("createNode"));
    let created = &result["createdNodes"][0];
    assert_eq!(created["nodeName"], json!("welcome"));
    assert_eq!(created["nodeType"], json!("Site:Text"));
    assert_eq!(created["depth"], json!(0));
    assert_eq!(created["properties"], json!({"title": "Welcome"}));
    assert_eq!(result["nodeId"], created["id"]);
}

// ========== TEST: failed request ==========
#[test]
fn test_failed_request_is_422() {
    let site = Site::new();
    let body = json!({
        "patches": [
            {"operation": "updateNode", "nodeId": "missing-id", "properties": {"title": "x"}}
        ]
    });

    let response = site.handle(&body);

    assert_eq!(response.status, 422);
    assert_eq!(
        response.body,
        json!({
            "success": false,
            "dryRun": false,
            "results": [],
            "error": {
                "message": "node missing-id not found",
                "patchIndex": 0,
                "operation": "updateNode",
                "nodeId": "missing-id"
            },
            "rolledBack": false
        })
    );
}

// ========== TEST: parse error ==========
#[test]
fn test_unknown_operation_is_422() {
    let site = Site::new();
    let body = json!({"patches": [{"operation": "copyNode", "nodeId": "x"}]});

    let response = site.handle(&body);

    assert_eq!(response.status, 422);
    assert_eq!(response.body["error"]["operation"], json!("copyNode"));
    assert_eq!(response.body["error"]["message"], json!("unknown operation 'copyNode'"));
}

// ========== TEST: malformed request ==========
#[test]
fn test_malformed_request_is_400() {
    let site = Site::new();

    for body in [json!("patches"), json!({}), json!({"patches": "all"})] {
        let response = site.handle(&body);
        assert_eq!(response.status, 400, "body {}", body);
        assert_eq!(response.body["success"], json!(false));
    }
}

// ========== TEST: dry run request ==========
#[test]
fn test_dry_run_request_is_200_and_not_persisted() {
    let site = Site::new();
    let before = site.dump("live");
    let body = json!({
        "dryRun": true,
        "patches": [{"operation": "deleteNode", "nodeId": site.id("hello")}]
    });

    let response = site.handle(&body);

    assert_eq!(response.status, 200);
    assert_eq!(response.body["dryRun"], json!(true));
    assert_eq!(response.body["rolledBack"], json!(true));
    assert_eq!(site.dump("live"), before);
}

// ========== TEST: workspace from request ==========
#[test]
fn test_request_targets_named_workspace() {
    let site = Site::new();
    let live_before = site.dump("live");
    let body = json!({
        "workspace": "user-admin",
        "patches": [{"operation": "deleteNode", "nodeId": site.id("hello")}]
    });

    let response = site.handle(&body);

    assert_eq!(response.status, 200);
    assert_eq!(site.dump("live"), live_before);
    assert_ne!(site.dump("user-admin"), live_before);
}

// ========== TEST: asset properties in created nodes ==========
#[test]
fn test_created_asset_reported_as_descriptor() {
    let site = Site::new();
    let body = json!({
        "patches": [
            {"operation": "createNode", "parentNodeId": site.id("home/main"),
             "nodeType": "Site:Gallery",
             "properties": {"images": [
                 {"identifier": "abc"},
                 {"identifier": "def", "filename": "ignored"}
             ]}}
        ]
    });

    let response = site.handle(&body);

    assert_eq!(response.status, 200);
    assert_eq!(
        response.body["results"][0]["createdNodes"][0]["properties"]["images"],
        json!([
            {"id": "abc", "filename": "x.jpg", "mediaType": "image/jpeg"},
            {"id": "def", "filename": "y.png", "mediaType": "image/png"}
        ])
    );
}
