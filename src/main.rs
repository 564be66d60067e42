use modelcompass::cli::commands::{CliArgs, Commands};
use modelcompass::cli::handlers::{
    handle_bench, handle_cancel, handle_download, handle_favorites, handle_hardware,
    handle_history, handle_models, handle_queue, handle_recommend, handle_register,
    handle_search, handle_tools, handle_updates, handle_vram_calc,
};
use modelcompass::config::EngineConfig;
use modelcompass::engine::Engine;
use modelcompass::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, error, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("modelcompass v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let config = EngineConfig::default();
    if let Err(e) = config.validate() {
        error!("invalid configuration: {}", e);
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    let engine = Engine::init(config).await;

    let exit_code = match &args.command {
        Commands::Hardware(a) => handle_hardware(&engine, a).await,
        Commands::Models(a) => handle_models(&engine, a).await,
        Commands::Recommend(a) => handle_recommend(&engine, a).await,
        Commands::Download(a) => handle_download(&engine, a).await,
        Commands::Queue(a) => handle_queue(&engine, a).await,
        Commands::Cancel(a) => handle_cancel(&engine, a).await,
        Commands::History(a) => handle_history(&engine, a).await,
        Commands::Register(a) => handle_register(&engine, a).await,
        Commands::Bench(a) => handle_bench(&engine, a).await,
        Commands::Favorites(a) => handle_favorites(&engine, a).await,
        Commands::Search(a) => handle_search(&engine, a).await,
        Commands::Tools(a) => handle_tools(&engine, a).await,
        Commands::Updates(a) => handle_updates(&engine, a).await,
        Commands::VramCalc(a) => handle_vram_calc(a).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    use std::sync::Once;
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let level = if let Some(level_str) = &args.log_level {
            parse_level(level_str)
        } else if args.verbose {
            Level::DEBUG
        } else if args.quiet {
            Level::ERROR
        } else {
            let level_str =
                env::var("MODELCOMPASS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        };

        let mut filter = EnvFilter::from_default_env();

        if env::var("RUST_LOG").is_err() {
            filter = filter
                .add_directive(format!("modelcompass={}", level).parse().unwrap())
                .add_directive("h2=warn".parse().unwrap())
                .add_directive("hyper=warn".parse().unwrap())
                .add_directive("reqwest=warn".parse().unwrap());
        }

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    });
}

fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}
