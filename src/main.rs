use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use vision_batch::{
    AnnotationOrchestrator,
    config::Config,
    domain::image::entity::ImageAsset,
    infrastructure::{imaging::codec::encode_png, transport::reqwest_transport::ReqwestTransport},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Uses RUST_LOG if set, otherwise sensible defaults
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,vision_batch=debug"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let sources: Vec<String> = std::env::args().skip(1).collect();
    if sources.is_empty() {
        anyhow::bail!("usage: vision-batch <image path or URL>...");
    }

    let config = Config::from_env()?;
    let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
    let http = transport.client().clone();
    let mut orchestrator = AnnotationOrchestrator::from_config(transport, &config);

    for source in &sources {
        if source.starts_with("http://") || source.starts_with("https://") {
            orchestrator.add_image_url(&http, source).await?;
        } else {
            orchestrator.add_image_file(source)?;
        }
    }

    let style = config.overlay_style()?;
    let output_dir = config.overlay_output_dir.as_deref().map(PathBuf::from);
    if let Some(dir) = &output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut failed_batches = 0usize;
    let submission = orchestrator.submit(config.batch_size).await?;
    for item in submission {
        let (id, mut asset) = match item {
            Ok(pair) => pair,
            Err(e) => {
                tracing::error!("Batch failed: {}", e);
                failed_batches += 1;
                continue;
            }
        };

        let result = asset.result();
        let summary = serde_json::json!({
            "id": id,
            "name": asset.name(),
            "text": result
                .and_then(|r| r.text_annotations().into_iter().next())
                .map(|t| t.description),
            "labels": result
                .map(|r| r.label_annotations().into_iter().map(|l| l.description).collect::<Vec<_>>())
                .unwrap_or_default(),
            "error": result.and_then(|r| r.error()).map(|s| s.message),
        });
        println!("{}", summary);

        if let Some(dir) = &output_dir {
            write_overlay(&mut asset, dir, &style)?;
        }
    }

    if failed_batches > 0 {
        anyhow::bail!("{} batches could not be processed", failed_batches);
    }
    Ok(())
}

fn write_overlay(
    asset: &mut ImageAsset,
    dir: &Path,
    style: &vision_batch::infrastructure::imaging::overlay::OverlayStyle,
) -> anyhow::Result<()> {
    let drawn = asset.draw_text_annotations(style);
    let stem = Path::new(asset.name())
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| asset.id().short().to_string());
    let path = dir.join(format!("{}-{}.png", stem, asset.id().short()));
    std::fs::write(&path, encode_png(asset.resource())?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote overlay with {} annotations to {}", drawn, path.display());
    Ok(())
}
