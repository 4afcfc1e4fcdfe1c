use crate::common::ready_captcha;
use svgcap::{CaptchaError, CaptchaKind, CaptchaOptions, evaluate_formula};

#[tokio::test]
async fn test_formula_answer_matches_text() {
    let captcha = ready_captcha(CaptchaOptions {
        kind: CaptchaKind::Formula,
        length: Some(3),
        ..CaptchaOptions::default()
    })
    .await;

    for _ in 0..20 {
        let result = captcha.generate(None).await.unwrap();
        assert!(!result.value.is_empty());
        result.value.parse::<i64>().unwrap();
    }
}

#[tokio::test]
async fn test_non_negative_formula() {
    let captcha = ready_captcha(CaptchaOptions {
        kind: CaptchaKind::Formula,
        length: Some(4),
        non_negative: true,
        ..CaptchaOptions::default()
    })
    .await;

    for _ in 0..50 {
        let result = captcha.generate(None).await.unwrap();
        assert!(result.value.parse::<i64>().unwrap() >= 0);
    }
}

#[tokio::test]
async fn test_formula_override() {
    let captcha = ready_captcha(CaptchaOptions {
        kind: CaptchaKind::Formula,
        ..CaptchaOptions::default()
    })
    .await;

    assert_eq!(captcha.generate(Some("8/2+6x3")).await.unwrap().value, "22");
    assert_eq!(captcha.generate(Some("12x10-7")).await.unwrap().value, "113");
    assert!(matches!(
        captcha.generate(Some("4+")).await,
        Err(CaptchaError::Formula(_))
    ));
}

#[test]
fn test_evaluate_formula_precedence() {
    assert_eq!(evaluate_formula("2+3x4").unwrap(), 14);
    assert_eq!(evaluate_formula("9-2-3").unwrap(), 4);
    assert_eq!(evaluate_formula("7x0-8").unwrap(), -8);
}
