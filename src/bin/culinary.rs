//! CLI for Culinary - professional food photos via Gemini.

use clap::{Args, Parser, Subcommand, ValueEnum};
use culinary::{
    build_prompt, Config, GeminiClientBuilder, PhotoTransformer, Session, TransformMode,
    DOWNLOAD_FILE_NAME,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "culinary")]
#[command(about = "Turn a phone photo of a dish into a professional food photograph")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log request details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a food photo
    Transform(TransformArgs),

    /// Print the prompt that would be sent
    Prompt(PromptArgs),

    /// List transformation modes
    Modes,

    /// Run as MCP server (for AI agent integration)
    Mcp,
}

#[derive(Args)]
struct TransformArgs {
    /// Photo of the dish (PNG, JPEG or WebP)
    input: PathBuf,

    /// Output file path
    #[arg(short, long, default_value = DOWNLOAD_FILE_NAME)]
    output: PathBuf,

    /// Transformation mode
    #[arg(short, long, value_enum, default_value = "reimagine")]
    mode: ModeArg,

    /// Menu item name, e.g. "Signature Angus Burger"
    #[arg(short, long)]
    label: Option<String>,

    /// Gemini model identifier (overrides CULINARY_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,
}

#[derive(Args)]
struct PromptArgs {
    /// Transformation mode
    #[arg(short, long, value_enum, default_value = "reimagine")]
    mode: ModeArg,

    /// Menu item name
    #[arg(short, long)]
    label: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Reimagine,
    Polish,
}

impl From<ModeArg> for TransformMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Reimagine => TransformMode::Reimagine,
            ModeArg::Polish => TransformMode::Polish,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Transform(args) => {
            transform_photo(args, cli.json).await?;
        }
        Commands::Prompt(args) => {
            print_prompt(args, cli.json)?;
        }
        Commands::Modes => {
            list_modes(cli.json)?;
        }
        Commands::Mcp => {
            run_mcp_server().await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "culinary=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_transformer(
    model: Option<String>,
    timeout: Option<Duration>,
) -> anyhow::Result<PhotoTransformer> {
    let mut config = Config::from_env()?;
    if let Some(model) = model {
        config = config.with_model(model);
    }
    if let Some(timeout) = timeout {
        config = config.with_timeout(timeout);
    }
    tracing::debug!(?config, "resolved configuration");

    let client = GeminiClientBuilder::from_config(&config).build()?;
    Ok(PhotoTransformer::from_model(client))
}

fn validate_transform_args(args: &TransformArgs) -> anyhow::Result<()> {
    if args.timeout == 0 {
        anyhow::bail!("--timeout must be at least 1 second");
    }
    if args.label.is_some() && !TransformMode::from(args.mode).uses_label() {
        tracing::debug!(mode = ?args.mode, "label is ignored in this mode");
    }
    if args.output.is_dir() {
        anyhow::bail!(
            "--output is a directory; use {}",
            args.output.join(DOWNLOAD_FILE_NAME).display()
        );
    }
    Ok(())
}

async fn transform_photo(args: TransformArgs, json_output: bool) -> anyhow::Result<()> {
    validate_transform_args(&args)?;

    let limit = Duration::from_secs(args.timeout);
    let transformer = build_transformer(args.model.clone(), Some(limit))?;

    let mut session = Session::new();
    session
        .select_file(&args.input)
        .map_err(|e| anyhow::anyhow!("{}: {}", args.input.display(), e.user_message()))?;
    session.set_mode(args.mode.into())?;
    if let Some(label) = &args.label {
        session.set_label(label.as_str())?;
    }

    let started = std::time::Instant::now();
    if let Err(e) = session.transform_within(&transformer, limit).await {
        tracing::debug!(error = ?e, "transform failed");
        let message = session
            .error_message()
            .map(str::to_string)
            .unwrap_or_else(|| e.user_message());
        anyhow::bail!(message);
    }
    let elapsed_ms = started.elapsed().as_millis();

    session.download_to(&args.output)?;

    let photo = session
        .result()
        .ok_or_else(|| anyhow::anyhow!("transform produced no photo"))?;
    let size = photo.decode()?.len();

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "input": args.input.display().to_string(),
            "output": args.output.display().to_string(),
            "mode": session.mode(),
            "label": session.label(),
            "mime_type": photo.mime_type(),
            "size_bytes": size,
            "model": transformer.model_name(),
            "duration_ms": elapsed_ms,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Professional photo: {} ({} bytes) via {}",
            args.output.display(),
            size,
            transformer.model_name()
        );
        println!("Duration: {}ms", elapsed_ms);
    }

    Ok(())
}

fn print_prompt(args: PromptArgs, json_output: bool) -> anyhow::Result<()> {
    let mode = TransformMode::from(args.mode);
    let prompt = build_prompt(mode, args.label.as_deref());

    if json_output {
        let result = serde_json::json!({
            "mode": mode,
            "label": args.label,
            "prompt": prompt,
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", prompt);
    }

    Ok(())
}

async fn run_mcp_server() -> anyhow::Result<()> {
    let transformer = build_transformer(None, None)?;
    tracing::info!(model = transformer.model_name(), "starting MCP server");
    let mut server = culinary::mcp::McpServer::new(transformer);
    server.run().await?;
    Ok(())
}

fn list_modes(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct ModeInfo {
        name: &'static str,
        description: &'static str,
        uses_label: bool,
    }

    let modes: Vec<ModeInfo> = TransformMode::ALL
        .iter()
        .map(|mode| ModeInfo {
            name: mode.as_str(),
            description: mode.description(),
            uses_label: mode.uses_label(),
        })
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&modes)?);
    } else {
        println!("Available modes:\n");
        for m in &modes {
            println!("  {} - {}", m.name, m.description);
            if m.uses_label {
                println!("    uses --label in the prompt");
            } else {
                println!("    ignores --label");
            }
        }
    }

    Ok(())
}
