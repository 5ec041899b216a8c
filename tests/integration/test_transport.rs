use super::helpers::{closed_port, local_client, png_of_width, serve_canned};
use http::{HeaderMap, HeaderValue, header};
use reqwest::Url;
use serde_json::json;
use std::sync::Arc;
use vision_batch::{
    AnnotationOrchestrator, VisionError,
    domain::{feature::entity::FeatureKind, image::entity::ImageAsset, image::value_objects::ImageId},
    infrastructure::transport::{reqwest_transport::ReqwestTransport, traits::Transport},
};

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

#[tokio::test]
async fn successful_post_returns_the_body() {
    let addr = serve_canned("200 OK", "application/json", br#"{"responses":[]}"#.to_vec()).await;
    let transport = ReqwestTransport::from_client(local_client());

    let url = Url::parse(&format!("http://{}/v1/images:annotate?key=k", addr)).unwrap();
    let body = transport
        .post_json(url, json_headers(), b"{}".to_vec())
        .await
        .expect("2xx response");
    assert_eq!(&body[..], br#"{"responses":[]}"#);
}

#[tokio::test]
async fn non_success_status_carries_status_and_body_preview() {
    let mut body = b"quota exhausted for project ".to_vec();
    body.extend(std::iter::repeat_n(b'x', 2000));
    let addr = serve_canned("503 Service Unavailable", "text/plain", body).await;
    let transport = ReqwestTransport::from_client(local_client());

    let url = Url::parse(&format!("http://{}/v1/images:annotate", addr)).unwrap();
    let err = transport
        .post_json(url, json_headers(), b"{}".to_vec())
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("503"), "{}", message);
    assert!(message.contains("quota exhausted"), "{}", message);
    assert!(!message.contains(&"x".repeat(600)), "body is truncated");
}

#[tokio::test]
async fn submission_over_http_routes_results() {
    let body = json!({"responses": [{"labelAnnotations": [{"description": "storefront", "score": 0.8}]}]});
    let addr = serve_canned("200 OK", "application/json", body.to_string().into_bytes()).await;

    let transport = Arc::new(ReqwestTransport::from_client(local_client()));
    let mut orchestrator =
        AnnotationOrchestrator::new(transport, "test-key").with_endpoint(format!("http://{}/v1", addr));
    orchestrator.add_feature(FeatureKind::LabelDetection, 3);
    orchestrator.add_raw_image(&png_of_width(3), "shop.png").unwrap();

    let (_, asset) = orchestrator.submit(4).await.unwrap().next().unwrap().unwrap();
    assert_eq!(asset.result().unwrap().label_annotations()[0].description, "storefront");
}

#[tokio::test]
async fn http_error_status_aborts_the_submission() {
    let body = json!({"error": {"code": 403, "message": "API key not valid."}});
    let addr = serve_canned("403 Forbidden", "application/json", body.to_string().into_bytes()).await;

    let transport = Arc::new(ReqwestTransport::from_client(local_client()));
    let mut orchestrator =
        AnnotationOrchestrator::new(transport, "bad-key").with_endpoint(format!("http://{}/v1", addr));
    orchestrator.add_feature(FeatureKind::LabelDetection, 3);
    orchestrator.add_raw_image(&png_of_width(3), "shop.png").unwrap();

    let err = orchestrator.submit(4).await.err().expect("transport error");
    assert!(matches!(err, VisionError::Transport(_)));
    let message = err.to_string();
    assert!(message.contains("403"), "{}", message);
    assert!(message.contains("API key not valid."), "{}", message);
}

#[tokio::test]
async fn url_source_is_fetched_and_decoded() {
    let addr = serve_canned("200 OK", "image/png", png_of_width(6)).await;
    let url = format!("http://{}/photos/door.png", addr);

    let asset = ImageAsset::from_url(&local_client(), &url).await.unwrap();
    assert_eq!(asset.name(), "door.png");
    assert_eq!(asset.id(), &ImageId::derive(&url));
    assert_eq!(asset.resource().width(), 6);
}

#[tokio::test]
async fn unreachable_url_source_is_a_source_error() {
    let url = format!("http://{}/door.png", closed_port().await);

    let err = ImageAsset::from_url(&local_client(), &url).await.unwrap_err();
    assert!(matches!(err, VisionError::Source { ref origin, .. } if *origin == url));
}

#[tokio::test]
async fn missing_url_source_is_a_source_error() {
    let addr = serve_canned("404 Not Found", "text/plain", b"no such image".to_vec()).await;
    let url = format!("http://{}/door.png", addr);

    let err = ImageAsset::from_url(&local_client(), &url).await.unwrap_err();
    assert!(matches!(err, VisionError::Source { ref reason, .. } if reason.contains("404")));
}

#[tokio::test]
async fn undecodable_url_source_is_a_source_error() {
    let addr = serve_canned("200 OK", "text/html", b"<html>not a picture</html>".to_vec()).await;
    let url = format!("http://{}/door.png", addr);

    let err = ImageAsset::from_url(&local_client(), &url).await.unwrap_err();
    assert!(matches!(err, VisionError::Source { ref origin, .. } if *origin == url));
}
