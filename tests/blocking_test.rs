//! Blocking client parity tests
//!
//! The same scripted responses are replayed through the async and the
//! blocking client; results and request sequences must match.

mod support;

use serde_json::{json, Value};
use support::{blocking_client, client, prediction, streaming_prediction, version, MockTransport, Reply};
use vaikerai::{EventType, VaikerError};

fn mock_run(transport: &MockTransport, last: Value) {
    transport
        .on(
            "GET",
            "/v1/models/test/example/versions/v1",
            vec![Reply::Json(
                200,
                version("v1", "0.9.10", json!({"type": "string", "title": "Output"})),
            )],
        )
        .on(
            "POST",
            "/v1/predictions",
            vec![Reply::Json(201, prediction("p1", "starting", Value::Null, Value::Null))],
        )
        .on(
            "GET",
            "/v1/predictions/p1",
            vec![
                Reply::Json(200, prediction("p1", "processing", Value::Null, Value::Null)),
                Reply::Json(200, last),
            ],
        );
}

#[test]
fn test_run_parity() {
    let succeeded = prediction("p1", "succeeded", json!("Hello, world!"), Value::Null);

    let async_transport = MockTransport::new();
    mock_run(&async_transport, succeeded.clone());
    let async_output = tokio_test::block_on(
        client(&async_transport).run("test/example:v1", json!({"text": "world"})),
    )
    .unwrap();

    let blocking_transport = MockTransport::new();
    mock_run(&blocking_transport, succeeded);
    let blocking_output = blocking_client(&blocking_transport)
        .run("test/example:v1", json!({"text": "world"}))
        .unwrap();

    assert_eq!(async_output, blocking_output);
    assert_eq!(async_transport.trace(), blocking_transport.trace());
}

#[test]
fn test_run_failure_parity() {
    let failed = prediction("p1", "failed", Value::Null, json!("OOM"));

    let async_transport = MockTransport::new();
    mock_run(&async_transport, failed.clone());
    let async_err =
        tokio_test::block_on(client(&async_transport).run("test/example:v1", json!({})))
            .unwrap_err();

    let blocking_transport = MockTransport::new();
    mock_run(&blocking_transport, failed);
    let blocking_err = blocking_client(&blocking_transport)
        .run("test/example:v1", json!({}))
        .unwrap_err();

    assert_eq!(async_err.to_string(), "OOM");
    assert_eq!(blocking_err.to_string(), "OOM");
    assert_eq!(async_err.prediction(), blocking_err.prediction());
    assert_eq!(async_transport.trace(), blocking_transport.trace());
}

#[test]
fn test_invalid_identifier_makes_no_calls() {
    let transport = MockTransport::new();

    let err = blocking_client(&transport).run("invalid", json!({})).unwrap_err();

    assert!(matches!(err, VaikerError::Validation(_)));
    assert!(transport.calls().is_empty());
}

#[test]
fn test_blocking_stream() {
    let transport = MockTransport::new();
    transport
        .on("POST", "/v1/predictions", vec![Reply::Json(201, streaming_prediction("p1"))])
        .on(
            "GET",
            "/v1/streams/p1",
            vec![Reply::Chunks(vec![
                Ok("event: output\ndata: Hel"),
                Ok("lo\n\nevent: done\ndata: {}\n\n"),
            ])],
        );

    let mut events = blocking_client(&transport)
        .stream("vaikerai/canary:v1", json!({"text": "Hello"}))
        .unwrap();

    let first = events.next().unwrap().unwrap();
    assert_eq!(first.event, EventType::Output);
    assert_eq!(first.data, "Hello");

    assert!(events.next().unwrap().unwrap().is_done());
    assert!(!events.is_open());
    assert!(events.next().is_none());
}

fn mock_prediction_pages(transport: &MockTransport) {
    transport
        .on(
            "GET",
            "/v1/predictions",
            vec![Reply::Json(
                200,
                json!({
                    "next": "https://api.vaikerai.com/v1/predictions?cursor=b",
                    "results": [prediction("p1", "succeeded", json!("a"), Value::Null)]
                }),
            )],
        )
        .on(
            "GET",
            "/v1/predictions?cursor=b",
            vec![Reply::Json(
                200,
                json!({
                    "next": null,
                    "results": [prediction("p2", "failed", Value::Null, json!("boom"))]
                }),
            )],
        );
}

#[test]
fn test_blocking_paginate_parity() {
    let blocking_transport = MockTransport::new();
    mock_prediction_pages(&blocking_transport);
    let client = blocking_client(&blocking_transport);
    let blocking_ids: Vec<String> =
        vaikerai::blocking::paginate(|cursor| client.predictions().list(cursor.as_deref()))
            .map(|page| page.unwrap())
            .flat_map(|page| page.results)
            .map(|p| p.id)
            .collect();

    let async_transport = MockTransport::new();
    mock_prediction_pages(&async_transport);
    let async_client = support::client(&async_transport);
    let async_ids: Vec<String> = tokio_test::block_on(async {
        use futures_util::TryStreamExt;
        let pages: Vec<_> = vaikerai::paginate(|cursor| {
            let client = async_client.clone();
            async move { client.predictions().list(cursor.as_deref()).await }
        })
        .try_collect()
        .await
        .unwrap();
        pages
            .into_iter()
            .flat_map(|page| page.results)
            .map(|p| p.id)
            .collect()
    });

    assert_eq!(blocking_ids, vec!["p1", "p2"]);
    assert_eq!(blocking_ids, async_ids);
    assert_eq!(blocking_transport.trace(), async_transport.trace());
}

#[test]
fn test_blocking_namespaces() {
    let transport = MockTransport::new();
    transport
        .on(
            "GET",
            "/v1/hardware",
            vec![Reply::Json(200, json!([{"sku": "cpu", "name": "CPU"}]))],
        )
        .on(
            "GET",
            "/v1/account",
            vec![Reply::Json(
                200,
                json!({"type": "user", "username": "zeke", "name": null, "github_url": null}),
            )],
        );
    let client = blocking_client(&transport);

    assert_eq!(client.hardware().list().unwrap()[0].sku, "cpu");
    assert_eq!(client.account().current().unwrap().username, "zeke");
    assert_eq!(
        transport.trace(),
        vec!["GET /v1/hardware", "GET /v1/account"]
    );
}
