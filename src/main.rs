//! `svgcap` - SVG CAPTCHA generator.
//!
//! Copyright (C) 2026 Maverick
//! SPDX-License-Identifier: AGPL-3.0-only
//!
//! Loads configuration, sets up logging, renders `CAPTCHA_COUNT` challenges
//! concurrently and prints each one as a JSON line.

use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use svgcap::{Captcha, CaptchaError, CaptchaResult, Config, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Rendered<'a> {
    index: usize,
    #[serde(flatten)]
    result: &'a CaptchaResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let (non_blocking, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking);

    if log_format.eq_ignore_ascii_case("pretty") {
        subscriber.init();
    } else {
        subscriber.json().init();
    }

    let config = Config::from_env();
    info!(
        kind = ?config.captcha.kind,
        font = ?config.captcha.font,
        count = config.count,
        output_dir = ?config.output_dir,
        log_format = %config.log_format,
        "Generator initialized"
    );

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Generation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Arc<Config>) -> Result<()> {
    let captcha = Arc::new(Captcha::new(config.captcha.clone()));
    captcha.ready().await?;

    if let Some(dir) = &config.output_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| CaptchaError::Generation(format!("{}: {e}", dir.display())))?;
    }

    let tasks: Vec<_> = (0..config.count)
        .map(|_| {
            let captcha = captcha.clone();
            tokio::spawn(async move { captcha.generate(None).await })
        })
        .collect();

    for (index, task) in tasks.into_iter().enumerate() {
        let result = task
            .await
            .map_err(|e| CaptchaError::Generation(format!("render task: {e}")))??;

        let file = match &config.output_dir {
            Some(dir) => {
                let path = dir.join(format!("captcha-{index}.svg"));
                tokio::fs::write(&path, &result.svg)
                    .await
                    .map_err(|e| CaptchaError::Generation(format!("{}: {e}", path.display())))?;
                Some(path)
            }
            None => None,
        };

        let line = serde_json::to_string(&Rendered {
            index,
            result: &result,
            file,
        })
        .map_err(|e| CaptchaError::Generation(e.to_string()))?;
        println!("{line}");
    }

    info!(count = config.count, "Generation complete");
    Ok(())
}
