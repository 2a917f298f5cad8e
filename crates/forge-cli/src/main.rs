//! `forge` - drive the generation pipeline from a terminal
//!
//! ```text
//! forge generate --app-id 42 --mode multi_file "A landing page for a bakery"
//! forge stream --app-id 42 --mode html "A countdown timer"
//! ```

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use forge_artifact::{AppId, CodeGenMode, UserId};
use forge_core::{
    wait_terminal, ChatHistoryStore, CodeGenPipeline, ForgeConfig, GenerationRequest,
    InMemoryHistoryStore, JsonlHistoryStore, OllamaBackendFactory, PipelineState,
};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn request_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("app-id")
                .long("app-id")
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Application the artifact belongs to"),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .default_value("html")
                .value_parser(|s: &str| s.parse::<CodeGenMode>())
                .help("Artifact shape: html or multi_file"),
        )
        .arg(
            Arg::new("user-id")
                .long("user-id")
                .value_parser(value_parser!(u64))
                .help("Record prompt and reply in chat history as this user"),
        )
        .arg(
            Arg::new("prompt")
                .required(true)
                .num_args(1..)
                .help("What to build"),
        )
}

fn cli() -> Command {
    Command::new("forge")
        .version(forge_core::VERSION)
        .about("Generate runnable web artifacts from a prompt")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .env("FORGE_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .global(true)
                .env("FORGE_BASE_URL")
                .help("Model server base URL"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .global(true)
                .env("FORGE_MODEL")
                .help("Model name"),
        )
        .arg(
            Arg::new("output-root")
                .long("output-root")
                .global(true)
                .env("FORGE_OUTPUT_ROOT")
                .value_parser(value_parser!(PathBuf))
                .help("Directory artifacts are written under"),
        )
        .arg(
            Arg::new("history-dir")
                .long("history-dir")
                .global(true)
                .env("FORGE_HISTORY_DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Keep chat history as JSON lines in this directory"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .subcommand(request_args(
            Command::new("generate").about("Generate, save, and print the artifact directory"),
        ))
        .subcommand(request_args(
            Command::new("stream").about("Print the live stream as SSE frames, then the save outcome"),
        ))
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn load_config(matches: &ArgMatches) -> Result<ForgeConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ForgeConfig::load(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ForgeConfig::default(),
    };

    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(base_url);
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model);
    }
    if let Some(root) = matches.get_one::<PathBuf>("output-root") {
        config = config.with_output_root(root);
    }
    Ok(config)
}

fn build_request(args: &ArgMatches) -> Result<GenerationRequest> {
    let app_id = args.get_one::<u64>("app-id").copied().unwrap_or_default();
    let mode = args
        .get_one::<CodeGenMode>("mode")
        .copied()
        .unwrap_or(CodeGenMode::SinglePage);
    let prompt = args
        .get_many::<String>("prompt")
        .map(|words| words.cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default();
    if prompt.trim().is_empty() {
        bail!("prompt is empty");
    }

    let mut request = GenerationRequest::new(AppId(app_id), prompt, mode);
    if let Some(user_id) = args.get_one::<u64>("user-id") {
        request = request.with_user(UserId(*user_id));
    }
    Ok(request)
}

async fn generate(pipeline: &CodeGenPipeline, request: GenerationRequest) -> Result<()> {
    let dir = pipeline
        .generate_and_save(request)
        .await
        .context("generation failed")?;
    println!("{}", dir.display());
    Ok(())
}

async fn stream(pipeline: &CodeGenPipeline, request: GenerationRequest) -> Result<()> {
    let mut events = pipeline
        .generate_stream(request)
        .await
        .context("cannot start generation")?;
    let status = events.status();

    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        let event = event.context("generation failed")?;
        stdout.write_all(event.to_sse().as_bytes())?;
        stdout.flush()?;
    }

    match wait_terminal(status).await {
        PipelineState::Saved(dir) => {
            tracing::info!(dir = %dir.display(), "artifact saved");
            Ok(())
        }
        PipelineState::SaveFailed(reason) => bail!("generated code was not saved: {reason}"),
        other => bail!("generation ended as {other:?}"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    // Global flags are propagated into the subcommand's matches
    let Some((command, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    init_tracing(args.get_flag("json-logs"));

    let config = load_config(args).await?;
    let history: Arc<dyn ChatHistoryStore> = match args.get_one::<PathBuf>("history-dir") {
        Some(dir) => Arc::new(JsonlHistoryStore::new(dir)),
        None => Arc::new(InMemoryHistoryStore::new()),
    };
    let factory = Arc::new(OllamaBackendFactory::new(config.backend.clone()));
    let pipeline = CodeGenPipeline::new(&config, factory, history);
    let request = build_request(args)?;

    match command {
        "generate" => generate(&pipeline, request).await,
        "stream" => stream(&pipeline, request).await,
        other => bail!("unknown command {other}"),
    }
}
