use crate::common::glyph_count;
use std::path::PathBuf;
use std::sync::Arc;
use svgcap::{Captcha, CaptchaError, CaptchaOptions, FontSource};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generation_shares_font() {
    let captcha = Arc::new(Captcha::new(CaptchaOptions::default()));

    let tasks: Vec<_> = (0..32)
        .map(|_| {
            let captcha = captcha.clone();
            tokio::spawn(async move { captcha.generate(None).await })
        })
        .collect();

    for task in tasks {
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.value.len(), 4);
        assert_eq!(glyph_count(&result.svg), 4);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failure_is_shared() {
    let captcha = Arc::new(Captcha::new(CaptchaOptions {
        font: FontSource::Path(PathBuf::from("/nonexistent/fonts/missing.otf")),
        ..CaptchaOptions::default()
    }));

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let captcha = captcha.clone();
            tokio::spawn(async move { captcha.generate(None).await })
        })
        .collect();

    let mut errors = Vec::new();
    for task in tasks {
        errors.push(task.await.unwrap().unwrap_err());
    }
    assert!(matches!(errors[0], CaptchaError::FontLoad(_)));
    assert!(errors.iter().all(|e| *e == errors[0]));
}

#[test]
fn test_generator_built_outside_runtime() {
    let captcha = Captcha::new(CaptchaOptions::default());
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let result = runtime.block_on(captcha.generate(Some("77"))).unwrap();
    assert_eq!(result.value, "77");
}
