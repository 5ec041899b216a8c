use image::{DynamicImage, Rgba, RgbaImage};
use vision_batch::{
    VisionError,
    domain::{
        feature::entity::{FeatureKind, FeatureRegistry},
        image::{entity::ImageAsset, registry::ImageRegistry},
    },
    infrastructure::imaging::codec::encode_png,
};

fn tiny_png() -> Vec<u8> {
    encode_png(&DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        3,
        3,
        Rgba([12, 34, 56, 255]),
    )))
    .expect("png encoding")
}

#[test]
fn unknown_feature_names_are_rejected_at_registration() {
    let mut features = FeatureRegistry::new();
    let err = features.add_named("OCR_EVERYTHING", 5).unwrap_err();
    assert!(matches!(err, VisionError::UnknownFeature(ref name) if name == "OCR_EVERYTHING"));
    assert!(features.is_empty());

    assert!(features.add_named("text_detection", 5).is_err(), "names are case sensitive");
}

#[test]
fn re_adding_a_feature_overwrites_without_growing() {
    let mut features = FeatureRegistry::new();
    features.add(FeatureKind::TextDetection, 10);
    features.add(FeatureKind::LabelDetection, 2);
    features.add_named("TEXT_DETECTION", 50).unwrap();

    assert_eq!(features.len(), 2);
    assert_eq!(features.max_results(FeatureKind::TextDetection), Some(50));
    let order: Vec<FeatureKind> = features.list().iter().map(|f| f.kind).collect();
    assert_eq!(order, vec![FeatureKind::TextDetection, FeatureKind::LabelDetection]);
    assert_eq!(features.list(), features.list(), "listing is stable");
}

#[test]
fn duplicate_images_leave_registry_unchanged() {
    let mut registry = ImageRegistry::new();
    registry
        .insert(ImageAsset::from_raw(&tiny_png(), "storefront.png").unwrap())
        .unwrap();
    registry
        .insert(ImageAsset::from_raw(&tiny_png(), "menu.png").unwrap())
        .unwrap();
    let before = registry.ids();

    let err = registry
        .insert(ImageAsset::from_raw(&tiny_png(), "storefront.png").unwrap())
        .unwrap_err();

    assert!(matches!(err, VisionError::DuplicateImage { ref name, .. } if name == "storefront.png"));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.ids(), before);
}

#[test]
fn file_sources_use_path_identity_and_basename() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("IMG_0820.png");
    std::fs::write(&path, tiny_png()).unwrap();

    let a = ImageAsset::from_file(&path).unwrap();
    let b = ImageAsset::from_file(&path).unwrap();
    assert_eq!(a.name(), "IMG_0820.png");
    assert_eq!(a.id(), b.id());

    let missing = ImageAsset::from_file(dir.path().join("nope.png")).unwrap_err();
    assert!(matches!(missing, VisionError::Source { .. }));
}

#[tokio::test]
async fn invalid_urls_fail_before_any_request() {
    let http = reqwest::Client::new();
    let err = ImageAsset::from_url(&http, "not a url").await.unwrap_err();
    assert!(matches!(err, VisionError::Source { ref reason, .. } if reason.contains("not a valid URL")));
}
