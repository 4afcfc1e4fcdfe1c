use crate::common::{glyph_count, noise_count, ready_captcha, view_box};
use svgcap::{CaptchaKind, CaptchaOptions, FontSource, LETTER_SET};

#[tokio::test]
async fn test_default_number_captcha() {
    let captcha = ready_captcha(CaptchaOptions::default()).await;
    let result = captcha.generate(None).await.unwrap();

    assert_eq!(result.value.len(), 4);
    assert!(result.value.chars().all(|c| c.is_ascii_digit()));
    assert_eq!(glyph_count(&result.svg), 4);
    assert_eq!(noise_count(&result.svg), 1);

    let (width, height) = view_box(&result.svg);
    assert!((width - result.width).abs() < 0.001);
    assert!((height - result.height).abs() < 0.001);
}

#[tokio::test]
async fn test_letter_captcha_respects_ignore_chars() {
    let captcha = ready_captcha(CaptchaOptions {
        kind: CaptchaKind::Letter,
        length: Some(12),
        ignore_chars: "lIoO".to_string(),
        ..CaptchaOptions::default()
    })
    .await;

    for _ in 0..10 {
        let result = captcha.generate(None).await.unwrap();
        assert_eq!(result.value.chars().count(), 12);
        assert!(result.value.chars().all(|c| LETTER_SET.contains(c)));
        assert!(!result.value.contains(['l', 'I', 'o', 'O']));
    }
}

#[tokio::test]
async fn test_custom_charset() {
    let captcha = ready_captcha(CaptchaOptions {
        kind: CaptchaKind::Mix,
        length: Some(6),
        chars: Some("AB".to_string()),
        ..CaptchaOptions::default()
    })
    .await;

    let result = captcha.generate(None).await.unwrap();
    assert!(result.value.chars().all(|c| c == 'A' || c == 'B'));
}

#[tokio::test]
async fn test_requested_dimensions() {
    let both = ready_captcha(CaptchaOptions {
        width: Some(200.0),
        height: Some(80.0),
        ..CaptchaOptions::default()
    })
    .await;
    let result = both.generate(None).await.unwrap();
    assert_eq!(view_box(&result.svg), (200.0, 80.0));
    assert!(result.svg.contains(r#"width="200" height="80""#));

    let natural = ready_captcha(CaptchaOptions::default()).await;
    let reference = natural.generate(Some("1234")).await.unwrap();

    let width_only = ready_captcha(CaptchaOptions {
        width: Some(120.0),
        ..CaptchaOptions::default()
    })
    .await;
    let scaled = width_only.generate(Some("1234")).await.unwrap();
    let expected_height = (reference.height * 120.0 / reference.width).round();
    assert_eq!(scaled.width, 120.0);
    assert_eq!(scaled.height, expected_height);
    assert_eq!(scaled.scale.x, scaled.scale.y);
}

#[tokio::test]
async fn test_noise_width_and_count() {
    let captcha = ready_captcha(CaptchaOptions {
        noise: 5,
        noise_width: Some(2.0),
        ..CaptchaOptions::default()
    })
    .await;

    let result = captcha.generate(None).await.unwrap();
    assert_eq!(noise_count(&result.svg), 5);
    assert_eq!(result.svg.matches(r#"stroke-width="2""#).count(), 5);
}

#[tokio::test]
async fn test_in_memory_font() {
    let bytes = std::fs::read(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/DejaVuSans.ttf")).unwrap();
    let captcha = ready_captcha(CaptchaOptions {
        font: FontSource::Bytes(bytes.into()),
        ..CaptchaOptions::default()
    })
    .await;

    let result = captcha.generate(Some("5150")).await.unwrap();
    assert_eq!(result.value, "5150");
    assert!(result.data_uri().starts_with("data:image/svg+xml;base64,"));
}

#[tokio::test]
async fn test_json_serialization() {
    let captcha = ready_captcha(CaptchaOptions {
        background_color: Some("rgb(20, 30, 40)".to_string()),
        ..CaptchaOptions::default()
    })
    .await;

    let result = captcha.generate(Some("9090")).await.unwrap();
    let json: serde_json::Value = serde_json::to_value(&result).unwrap();
    assert_eq!(json["value"], "9090");
    assert_eq!(json["background_color"], "rgb(20, 30, 40)");
    assert_eq!(json["scale"]["x"], 1.0);
    assert!(json["svg"].as_str().unwrap().starts_with("<svg"));
}
