use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::json;
use vision_batch::{
    VisionError,
    application::batching::{
        codec::BatchCodec, request_builder::RequestBuilder, response_router::ResponseRouter,
    },
    domain::{
        feature::entity::{FeatureKind, FeatureRequest},
        image::{entity::ImageAsset, value_objects::ImageId},
    },
    infrastructure::imaging::codec::encode_png,
};

fn ids(n: usize) -> Vec<ImageId> {
    (0..n).map(|i| ImageId::derive(&format!("photos/{}.jpg", i))).collect()
}

fn images(n: usize) -> Vec<ImageAsset> {
    let png = encode_png(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        2,
        2,
        Rgba([255, 255, 255, 255]),
    )))
    .unwrap();
    (0..n)
        .map(|i| ImageAsset::from_raw(&png, format!("sign-{}.png", i)).unwrap())
        .collect()
}

#[test]
fn codec_round_trips_sequences_of_every_length() {
    for n in 0..40 {
        let sequence = ids(n);
        let token = BatchCodec::encode(&sequence).unwrap();
        assert_eq!(BatchCodec::decode(&token).unwrap(), sequence, "n={}", n);
    }
}

#[test]
fn codec_preserves_repeated_ids_and_position() {
    let base = ids(3);
    let sequence = vec![base[2].clone(), base[0].clone(), base[2].clone()];
    let decoded = BatchCodec::decode(&BatchCodec::encode(&sequence).unwrap()).unwrap();
    assert_eq!(decoded, sequence);
}

#[test]
fn partition_reproduces_registration_order() {
    let features = [FeatureRequest { kind: FeatureKind::LogoDetection, max_results: 1 }];
    let assets = images(12);

    let batches: Vec<_> = RequestBuilder::partition(&assets, &features, 5, 80)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![5, 5, 2]);

    let total: usize = batches.iter().map(|b| b.request.requests.len()).sum();
    assert_eq!(total, 12);

    let order: Vec<&ImageId> = batches.iter().flat_map(|b| b.ids.iter()).collect();
    let registered: Vec<&ImageId> = assets.iter().map(|a| a.id()).collect();
    assert_eq!(order, registered);
}

#[test]
fn partition_of_empty_set_yields_no_batches() {
    let features = [FeatureRequest { kind: FeatureKind::LabelDetection, max_results: 1 }];
    let none: Vec<ImageAsset> = Vec::new();
    assert_eq!(RequestBuilder::partition(&none, &features, 3, 80).unwrap().count(), 0);
}

#[test]
fn router_pairs_ith_result_with_ith_id() {
    let sequence = ids(4);
    let token = BatchCodec::encode(&sequence).unwrap();
    let body = json!({
        "responses": [
            {"labelAnnotations": [{"description": "door"}]},
            {},
            {"error": {"code": 3, "message": "Bad image data."}},
            {"labelAnnotations": [{"description": "sign", "score": 0.9}]}
        ]
    });

    let routed = ResponseRouter::route(&token, body.to_string().as_bytes()).unwrap();
    assert_eq!(routed.len(), 4);
    for (i, (id, _)) in routed.iter().enumerate() {
        assert_eq!(id, &sequence[i]);
    }
    assert_eq!(routed[0].1.label_annotations()[0].description, "door");
    assert_eq!(routed[2].1.error().unwrap().code, 3);
    assert_eq!(routed[3].1.label_annotations()[0].score, Some(0.9));
}

#[test]
fn router_never_truncates_or_pads() {
    let token = BatchCodec::encode(&ids(3)).unwrap();
    let short = json!({"responses": [{}, {}]}).to_string();
    let err = ResponseRouter::route(&token, short.as_bytes()).unwrap_err();
    assert!(matches!(err, VisionError::ResponseShape { expected: 3, actual: 2 }));
}
