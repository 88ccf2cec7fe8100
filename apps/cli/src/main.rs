use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    HttpTransformClient, PlanCarousel, ResultHandle, TransformClientConfig, TransformController,
    TransformStatus,
};
use shared::protocol::advisory_upload_hint;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ghibli", about = "Turn photos into Ghibli-style artwork")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one image to the transformation service and save the result.
    Transform {
        #[arg(long, short)]
        input: PathBuf,
        /// Defaults to `<input stem>-ghibli.<ext>` next to the input.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Falls back to GHIBLI_TRANSFORM_URL, then the local relay.
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Open the result in the system image viewer.
        #[arg(long)]
        open: bool,
    },
    /// List the pricing plans.
    Plans {
        /// Plan index to highlight (0-2).
        #[arg(long)]
        select: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let args = Args::parse();

    match args.command {
        Command::Transform {
            input,
            output,
            endpoint,
            timeout_secs,
            open,
        } => {
            let config = TransformClientConfig::resolve(endpoint)
                .with_timeout(timeout_secs.map(Duration::from_secs));
            run_transform(config, &input, output, open).await
        }
        Command::Plans { select, json } => {
            let mut carousel = PlanCarousel::default();
            if let Some(index) = select {
                carousel.click(index);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(carousel.plans())?);
            } else {
                print!("{}", render_plans(&carousel));
            }
            Ok(())
        }
    }
}

async fn run_transform(
    config: TransformClientConfig,
    input: &Path,
    output: Option<PathBuf>,
    open: bool,
) -> Result<()> {
    let client = HttpTransformClient::new(config)?;
    info!(endpoint = %client.endpoint(), hint = %advisory_upload_hint(), "using transform endpoint");
    let controller = TransformController::new(Arc::new(client));

    controller
        .select_path(input)
        .await
        .with_context(|| format!("cannot use '{}' as input", input.display()))?;
    if controller.trigger().await.is_none() {
        bail!("no transform request was issued");
    }

    let result = match controller.snapshot().await.status {
        TransformStatus::Succeeded(result) => result,
        TransformStatus::Failed { message, .. } => bail!(message),
        other => bail!("transform ended in unexpected state: {other:?}"),
    };

    let output = output.unwrap_or_else(|| default_output_path(input, &result));
    std::fs::write(&output, result.bytes())
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    println!(
        "Saved {} ({} bytes) to {}",
        result.mime_type(),
        result.len(),
        output.display()
    );

    if open {
        client_core::open_in_external_viewer(&output)
            .with_context(|| format!("failed to open '{}'", output.display()))?;
    }
    Ok(())
}

fn default_output_path(input: &Path, result: &ResultHandle) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let file_name = result.suggested_file_name(&format!("{stem}-ghibli"));
    match input.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn render_plans(carousel: &PlanCarousel) -> String {
    let mut out = String::new();
    for (index, plan) in carousel.plans().iter().enumerate() {
        let marker = if carousel.is_active(index) { ">" } else { " " };
        let badge = if plan.popular { " [Popular]" } else { "" };
        out.push_str(&format!(
            "{marker} {index}. {}{badge} - {}\n",
            plan.name,
            plan.price_label()
        ));
        for feature in plan.features {
            out.push_str(&format!("      * {feature}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::TransformedImage;
    use shared::domain::RequestId;

    fn result(content_type: &str) -> ResultHandle {
        ResultHandle::new(
            RequestId(1),
            TransformedImage::new(b"out".to_vec(), Some(content_type.to_string())),
        )
    }

    #[test]
    fn default_output_sits_next_to_input_with_result_extension() {
        let path = default_output_path(Path::new("/photos/cat.jpg"), &result("image/png"));
        assert_eq!(path, PathBuf::from("/photos/cat-ghibli.png"));
    }

    #[test]
    fn renders_marker_on_selected_plan_only() {
        let carousel = PlanCarousel::with_active(2);
        let text = render_plans(&carousel);
        let marked: Vec<&str> = text.lines().filter(|l| l.starts_with('>')).collect();
        assert_eq!(marked.len(), 1);
        assert!(marked[0].contains("Premium"));
        assert!(text.contains("Standard [Popular]"));
    }

    #[test]
    fn parses_transform_arguments() {
        let args = Args::try_parse_from([
            "ghibli",
            "transform",
            "--input",
            "cat.jpg",
            "--endpoint",
            "http://relay/api/transform",
            "--open",
        ])
        .expect("args");
        match args.command {
            Command::Transform {
                input,
                endpoint,
                open,
                output,
                ..
            } => {
                assert_eq!(input, PathBuf::from("cat.jpg"));
                assert_eq!(endpoint.as_deref(), Some("http://relay/api/transform"));
                assert!(open);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_input_fails_before_any_request() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = run_transform(
            TransformClientConfig::default(),
            &dir.path().join("missing.jpg"),
            None,
            false,
        )
        .await
        .expect_err("missing input");
        assert!(err.to_string().contains("cannot use"));
    }
}
