use serde_json::{json, Value as JsonValue};

use crate::helpers::spawn_app;

#[tokio::test]
async fn detail_renders_one_line_per_caption_field() {
    let app = spawn_app().await;
    let caption = json!({
        "key": "3",
        "distance": 0.12,
        "metadata": { "city": "hangzhou", "note": "first\nsecond" }
    })
    .to_string();

    let response = app.post_detail(&json!({ "caption": caption })).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: JsonValue = response.json().await.unwrap();
    assert_eq!(
        body["detail"],
        "- **key**: 3\n- **distance**: 0.12\n- **city**: hangzhou\n- **note**: first\\nsecond"
    );
}

#[tokio::test]
async fn detail_returns_400_for_an_invalid_caption() {
    let app = spawn_app().await;

    for caption in ["not json", "[1, 2]", "\"a string\""] {
        let response = app.post_detail(&json!({ "caption": caption })).await;

        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request for caption {}",
            caption
        );
    }
}
