use ai_photo_studio::ai::BinaryPayload;
use ai_photo_studio::app::App;
use ai_photo_studio::models::{
    AnalysisDepth, AspectRatio, EditTool, VideoAspectRatio, VideoResolution,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "ai-photo-studio")]
#[command(about = "Edit, generate, and analyze images with Gemini")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply a quick tool or a free-text edit to an image.
    Edit {
        image: PathBuf,
        /// remove-bg, color-correct, remove-object, style-filter, or text-prompt
        #[arg(long, default_value = "text-prompt")]
        tool: String,
        /// Object to remove, style to apply, or edit description.
        #[arg(long)]
        option: Option<String>,
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
    /// Generate an image from a prompt.
    Generate {
        prompt: String,
        #[arg(long, default_value = "1:1", value_parser = parse_aspect_ratio)]
        aspect_ratio: AspectRatio,
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
    /// Generate a video from a prompt, a starting image, or both.
    Video {
        prompt: Option<String>,
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long, default_value = "16:9", value_parser = parse_video_aspect_ratio)]
        aspect_ratio: VideoAspectRatio,
        #[arg(long, default_value = "720p", value_parser = parse_resolution)]
        resolution: VideoResolution,
        #[arg(long, default_value = "output")]
        out: PathBuf,
    },
    /// Describe an image.
    Analyze {
        image: PathBuf,
        /// Use the slower model with extended reasoning.
        #[arg(long)]
        deep: bool,
    },
    /// Chat interactively on stdin.
    Chat,
}

fn parse_aspect_ratio(input: &str) -> std::result::Result<AspectRatio, String> {
    input.parse()
}

fn parse_video_aspect_ratio(input: &str) -> std::result::Result<VideoAspectRatio, String> {
    input.parse()
}

fn parse_resolution(input: &str) -> std::result::Result<VideoResolution, String> {
    input.parse()
}

fn image_extension(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Echo a streamed chat fragment; output errors are logged, not fatal.
fn echo_fragment<W: Write>(out: &mut W, fragment: &str) {
    if let Err(e) = out
        .write_all(fragment.as_bytes())
        .and_then(|_| out.flush())
    {
        warn!("Failed to write chat output: {}", e);
    }
}

async fn save_data_url(data_url: &str, out: &Path, stem: &str) -> Result<PathBuf> {
    let payload = BinaryPayload::from_data_url(data_url)?;
    let bytes = payload.decode()?;

    tokio::fs::create_dir_all(out).await?;
    let path = out.join(format!(
        "{}-{}.{}",
        stem,
        Uuid::new_v4(),
        image_extension(&payload.mime_type)
    ));
    tokio::fs::write(&path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

async fn run(app: App, command: Command) -> Result<()> {
    match command {
        Command::Edit {
            image,
            tool,
            option,
            out,
        } => {
            let tool = EditTool::from_id(&tool, option.as_deref())?;
            let mut page = app.editor_page();
            page.upload(&image).await?;
            let edited = page.apply(&tool).await?;
            let path = save_data_url(&edited, &out, "edited").await?;
            println!("{}", path.display());
        }
        Command::Generate {
            prompt,
            aspect_ratio,
            out,
        } => {
            let mut page = app.generator_page().await;
            page.set_prompt(prompt);
            page.set_aspect_ratio(aspect_ratio);
            let generated = page.generate_image().await?;
            let path = save_data_url(&generated, &out, "generated").await?;
            println!("{}", path.display());
        }
        Command::Video {
            prompt,
            image,
            aspect_ratio,
            resolution,
            out,
        } => {
            let mut page = app.generator_page().await;
            page.set_prompt(prompt.unwrap_or_default());
            page.set_video_options(aspect_ratio, resolution);
            if let Some(image) = image {
                page.upload_start_image(&image).await?;
            }

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling video generation");
                    on_interrupt.cancel();
                }
            });

            info!("Generating video, this can take a few minutes");
            let video = page.generate_video(&cancel).await?;

            tokio::fs::create_dir_all(&out).await?;
            let path = out.join(format!("video-{}.{}", Uuid::new_v4(), video.file_extension()));
            video.save(&path).await?;
            println!("{}", path.display());
        }
        Command::Analyze { image, deep } => {
            let depth = if deep {
                AnalysisDepth::Deep
            } else {
                AnalysisDepth::Quick
            };
            let mut page = app.analyzer_page();
            page.upload(&image).await?;
            println!("{}", page.analyze(depth).await?);
        }
        Command::Chat => {
            let mut page = app.chat_page();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            print!("> ");
            std::io::stdout().flush()?;
            while let Some(line) = lines.next_line().await? {
                let result = page
                    .send(&line, |fragment| echo_fragment(&mut std::io::stdout(), fragment))
                    .await;
                if let Err(e) = result {
                    error!("Chat failed: {}", e);
                    if let Some(reply) = page.last_reply() {
                        print!("\n{}", reply);
                    }
                }
                print!("\n> ");
                std::io::stdout().flush()?;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ai_photo_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match App::new() {
        Ok(app) => match run(app, args.command).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("{}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}
