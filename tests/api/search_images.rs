use fake::{faker::lorem::en::Word, Fake};
use serde_json::{json, Value as JsonValue};
use visual_search_service::domain::entities::vector_record::VectorRecord;

use crate::helpers::{spawn_app, TestApp, DIMENSION, INDEX_REQUEST_ID};

/// Five images, keys "1" to "5", the closest first
fn given_five_indexed_images(app: &TestApp) {
    for key in 1..=5 {
        app.add_image(&key.to_string());
    }
    app.set_vectors(json!([
        { "key": "1", "distance": 0.02, "metadata": { "city": "hangzhou", "height": "1024" } },
        { "key": "2", "distance": 0.07, "metadata": { "city": "beijing", "height": "683" } },
        { "key": "3", "distance": 0.12 },
        { "key": "4", "distance": 0.2, "metadata": { "city": "shanghai", "height": "768" } },
        { "key": "5", "distance": 0.31, "metadata": { "city": "shenzhen", "height": "576" } }
    ]));
}

#[tokio::test]
async fn search_returns_the_hydrated_images_in_index_order() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);

    let response = app.post_search(&json!({ "text": "dog", "top_k": 5 })).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: JsonValue = response.json().await.unwrap();
    let results = body["results"].as_array().unwrap();

    let keys: Vec<&str> = results.iter().filter_map(|r| r["key"].as_str()).collect();
    assert_eq!(keys, vec!["1", "2", "3", "4", "5"]);
    for result in results {
        assert!(result["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
    }

    let caption: JsonValue = serde_json::from_str(results[2]["caption"].as_str().unwrap()).unwrap();
    assert_eq!(caption, json!({ "key": "3", "distance": 0.12 }));
    let record = VectorRecord::try_parsing_caption(results[0]["caption"].as_str().unwrap()).unwrap();
    assert_eq!(record.key, "1");
    assert_eq!(record.distance, Some(0.02));
}

#[tokio::test]
async fn search_embeds_the_text_and_queries_the_index_without_filter() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);

    app.post_search(&json!({ "text": "dog", "top_k": 5 })).await;

    let state = app.upstream.state.lock().unwrap();
    assert_eq!(state.embedding_requests.len(), 1);
    assert_eq!(
        state.embedding_requests[0]["input"]["contents"],
        json!([{ "text": "dog", "factor": 1.0 }])
    );

    assert_eq!(state.query_requests.len(), 1);
    let query = &state.query_requests[0];
    assert!(query.get("filter").is_none());
    assert_eq!(query["topK"], json!(5));
    assert_eq!(query["returnDistance"], json!(true));
    assert_eq!(query["returnMetadata"], json!(true));
    assert_eq!(
        query["queryVector"]["float32"].as_array().unwrap().len(),
        DIMENSION
    );
}

#[tokio::test]
async fn search_sends_selected_facets_as_a_filter() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);

    let response = app
        .post_search(&json!({
            "text": "dog",
            "top_k": 5,
            "facets": { "city": ["hangzhou", "beijing"], "height": [] },
            "return_metadata": false
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let state = app.upstream.state.lock().unwrap();
    let query = &state.query_requests[0];
    assert_eq!(
        query["filter"],
        json!({ "$and": [{ "city": { "$in": ["beijing", "hangzhou"] } }] })
    );
    assert_eq!(query["returnMetadata"], json!(false));
}

#[tokio::test]
async fn search_drops_the_fields_that_were_not_requested() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);

    let response = app
        .post_search(&json!({
            "text": "dog",
            "top_k": 5,
            "return_metadata": false,
            "return_distance": false
        }))
        .await;

    let body: JsonValue = response.json().await.unwrap();
    for result in body["results"].as_array().unwrap() {
        let caption: JsonValue = serde_json::from_str(result["caption"].as_str().unwrap()).unwrap();
        assert_eq!(caption, json!({ "key": result["key"] }));
    }
}

#[tokio::test]
async fn search_returns_400_for_invalid_requests_without_calling_any_service() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({ "text": "", "top_k": 5 }), "empty text"),
        (json!({ "text": "   ", "top_k": 5 }), "blank text"),
        (json!({ "text": "dog", "top_k": 0 }), "top_k of 0"),
        (json!({ "text": "dog", "top_k": 31 }), "top_k above the bound"),
    ];

    for (body, description) in test_cases {
        let response = app.post_search(&body).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request when the payload had {}",
            description
        );
    }

    let state = app.upstream.state.lock().unwrap();
    assert!(state.embedding_requests.is_empty());
    assert!(state.query_requests.is_empty());
}

#[tokio::test]
async fn search_returns_502_and_skips_the_index_when_the_provider_fails() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);
    app.upstream.state.lock().unwrap().embedding_status = 401;
    let text: String = Word().fake();

    let response = app.post_search(&json!({ "text": text, "top_k": 5 })).await;

    assert_eq!(response.status().as_u16(), 502);
    let state = app.upstream.state.lock().unwrap();
    assert_eq!(state.embedding_requests.len(), 1);
    assert!(state.query_requests.is_empty());
}

#[tokio::test]
async fn search_returns_500_and_skips_the_index_on_dimension_mismatch() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);
    app.upstream.state.lock().unwrap().embeddings = vec![vec![0.25; DIMENSION + 1]];

    let response = app.post_search(&json!({ "text": "dog", "top_k": 5 })).await;

    assert_eq!(response.status().as_u16(), 500);
    assert!(app.upstream.state.lock().unwrap().query_requests.is_empty());
}

#[tokio::test]
async fn search_returns_502_when_an_image_is_missing() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);
    app.set_vectors(json!([
        { "key": "1", "distance": 0.02 },
        { "key": "deleted.jpg", "distance": 0.05 }
    ]));

    let response = app.post_search(&json!({ "text": "dog", "top_k": 2 })).await;

    assert_eq!(response.status().as_u16(), 502);
    assert!(response.text().await.unwrap().contains("deleted.jpg"));
}

#[tokio::test]
async fn search_returns_502_with_the_index_error_when_the_index_fails() {
    let app = spawn_app().await;
    // No image is written: loading any of them would fail with another error
    app.set_vectors(json!([{ "key": "1", "distance": 0.02 }]));
    app.upstream.state.lock().unwrap().index_status = 404;

    let response = app.post_search(&json!({ "text": "dog", "top_k": 5 })).await;

    assert_eq!(response.status().as_u16(), 502);
    let body = response.text().await.unwrap();
    assert!(body.contains("status 404"), "{}", body);
    assert!(
        body.contains("NoSuchVectorIndex: The specified vector index does not exist."),
        "{}",
        body
    );
    assert!(body.contains(INDEX_REQUEST_ID), "{}", body);
    assert!(!body.contains("unavailable"), "{}", body);
    assert_eq!(app.upstream.state.lock().unwrap().query_requests.len(), 1);
}

#[tokio::test]
async fn search_returns_502_and_skips_the_index_when_the_provider_sends_no_embedding() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);
    app.upstream.state.lock().unwrap().embeddings = vec![];

    let response = app.post_search(&json!({ "text": "dog", "top_k": 5 })).await;

    assert_eq!(response.status().as_u16(), 502);
    assert!(response
        .text()
        .await
        .unwrap()
        .contains("responded without any embedding"));
    assert!(app.upstream.state.lock().unwrap().query_requests.is_empty());
}

#[tokio::test]
async fn search_queries_the_index_with_the_first_embedding_of_the_provider() {
    let app = spawn_app().await;
    given_five_indexed_images(&app);
    app.upstream.state.lock().unwrap().embeddings =
        vec![vec![0.25; DIMENSION], vec![0.75; DIMENSION]];

    let response = app.post_search(&json!({ "text": "dog", "top_k": 5 })).await;

    assert_eq!(response.status().as_u16(), 200);
    let state = app.upstream.state.lock().unwrap();
    assert_eq!(
        state.query_requests[0]["queryVector"]["float32"],
        json!(vec![0.25; DIMENSION])
    );
}
