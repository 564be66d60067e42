use crate::catalog::UseCase;
use clap::{Parser, Subcommand, ValueEnum};

/// Hardware-aware discovery, download and integration of local AI models
#[derive(Parser, Debug)]
#[command(
    name = "modelcompass",
    about = "Find, download and run local AI models that fit your hardware",
    version,
    author,
    long_about = "modelcompass inspects your GPU/CPU, ranks a curated catalog of GGUF \
                  models against it, drives verified downloads, and registers the \
                  results with local runtimes such as Ollama and LM Studio."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Increase verbosity (debug logging)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Human,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Show detected hardware and what it can run",
        long_about = "Shows the current hardware snapshot (GPU, VRAM, RAM, bandwidth), the \
                      capacity tier and the usable model size.\n\n\
                      Examples:\n  \
                      modelcompass hardware\n  \
                      modelcompass hardware --refresh"
    )]
    Hardware(HardwareArgs),

    #[command(about = "List catalog models with fit assessments")]
    Models(ModelsArgs),

    #[command(
        about = "Recommend models for your hardware and use cases",
        long_about = "Ranks the catalog for the current hardware. Fitting models always come \
                      first; within a fit group higher community score and then higher \
                      estimated speed win.\n\n\
                      Examples:\n  \
                      modelcompass recommend\n  \
                      modelcompass recommend -u coding -u agents --limit 5"
    )]
    Recommend(RecommendArgs),

    #[command(
        about = "Download a model by catalog id",
        long_about = "Queues a download and, by default, waits for it to finish while showing \
                      progress. Downloads are verified against the catalog-declared size \
                      (and checksum when available) before they count as completed."
    )]
    Download(DownloadArgs),

    #[command(about = "Show the download queue")]
    Queue(FormatOnlyArgs),

    #[command(about = "Cancel a queued or running download")]
    Cancel(CancelArgs),

    #[command(about = "Show download history (or benchmark history with --benchmarks)")]
    History(HistoryArgs),

    #[command(
        about = "Register a completed download with local runtimes",
        long_about = "Registers the artifact of a completed download job with Ollama and/or \
                      LM Studio. Registration is idempotent per tool and partial failures \
                      are reported per tool."
    )]
    Register(RegisterArgs),

    #[command(about = "Benchmark a model served by the local runtime")]
    Bench(BenchArgs),

    #[command(about = "List, star and annotate favorite models")]
    Favorites(FavoritesArgs),

    #[command(
        about = "Search the model hub and import results into the catalog",
        long_about = "Examples:\n  \
                      modelcompass search qwen3\n  \
                      modelcompass search --files bartowski/Qwen3-8B-GGUF\n  \
                      modelcompass search --import bartowski/Qwen3-8B-GGUF Qwen3-8B-Q4_K_M.gguf"
    )]
    Search(SearchArgs),

    #[command(about = "Show detected runtime tools; optionally install one")]
    Tools(ToolsArgs),

    #[command(about = "Show tracked installs from the update manifest")]
    Updates(FormatOnlyArgs),

    #[command(about = "Estimate VRAM needs for an arbitrary model shape")]
    VramCalc(VramCalcArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct FormatOnlyArgs {
    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct HardwareArgs {
    #[arg(long, help = "Re-probe hardware instead of using the startup snapshot")]
    pub refresh: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ModelsArgs {
    #[arg(long, help = "Only models that fit the current hardware")]
    pub fits: bool,

    #[arg(short = 's', long, value_name = "TEXT", help = "Filter by name/description/tag")]
    pub search: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct RecommendArgs {
    #[arg(
        short = 'u',
        long = "use-case",
        value_name = "USE_CASE",
        help = "Use case filter (chat, coding, roleplay, uncensored, research, agents, vision); repeatable"
    )]
    pub use_cases: Vec<UseCase>,

    #[arg(short = 'l', long, default_value_t = 10, help = "Maximum results")]
    pub limit: usize,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadArgs {
    #[arg(value_name = "MODEL_ID", help = "Catalog id, e.g. qwen3-8b")]
    pub model_id: String,

    #[arg(long, help = "Enqueue and return immediately instead of waiting")]
    pub no_wait: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CancelArgs {
    #[arg(value_name = "JOB_ID", help = "Job id as printed by download/queue")]
    pub job_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct HistoryArgs {
    #[arg(long, help = "Show benchmark history instead of download history")]
    pub benchmarks: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(value_name = "JOB_ID", help = "Completed download job id")]
    pub job_id: String,

    #[arg(
        short = 't',
        long = "tool",
        value_name = "TOOL",
        help = "Target tool (ollama, lmstudio); repeatable, all when omitted"
    )]
    pub tools: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct BenchArgs {
    #[arg(value_name = "MODEL", help = "Model tag as the runtime knows it, e.g. qwen3:8b")]
    pub model: String,

    #[arg(short = 'p', long, help = "Custom test prompt")]
    pub prompt: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct FavoritesArgs {
    #[arg(long, value_name = "MODEL_ID", help = "Star or unstar a model")]
    pub toggle: Option<String>,

    #[arg(
        long,
        value_names = ["MODEL_ID", "TEXT"],
        num_args = 2,
        help = "Attach a note to a starred model"
    )]
    pub note: Option<Vec<String>>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[arg(value_name = "QUERY", help = "Text query against the model hub")]
    pub query: Option<String>,

    #[arg(long, value_name = "REPO", help = "List GGUF files of one repository")]
    pub files: Option<String>,

    #[arg(
        long,
        value_names = ["REPO", "FILE"],
        num_args = 2,
        help = "Import one repository file into the catalog"
    )]
    pub import: Option<Vec<String>>,

    #[arg(short = 'l', long, default_value_t = 20, help = "Maximum search results")]
    pub limit: usize,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ToolsArgs {
    #[arg(long, value_name = "TOOL_ID", help = "Install a tool by id (e.g. ollama)")]
    pub install: Option<String>,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct VramCalcArgs {
    #[arg(long, value_name = "BILLIONS", help = "Parameter count in billions")]
    pub params: f64,

    #[arg(long, default_value_t = 4.83, help = "Bits per weight (Q4_K_M = 4.83)")]
    pub bpw: f64,

    #[arg(long, default_value_t = 8, value_name = "K_TOKENS", help = "Context window in K tokens")]
    pub context: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recommend() {
        let args =
            CliArgs::parse_from(["modelcompass", "recommend", "-u", "coding", "--limit", "3"]);
        match args.command {
            Commands::Recommend(rec) => {
                assert_eq!(rec.use_cases, vec![UseCase::Coding]);
                assert_eq!(rec.limit, 3);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_download() {
        let args = CliArgs::parse_from(["modelcompass", "download", "qwen3-8b", "--no-wait"]);
        match args.command {
            Commands::Download(dl) => {
                assert_eq!(dl.model_id, "qwen3-8b");
                assert!(dl.no_wait);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_search_import_pair() {
        let args = CliArgs::parse_from([
            "modelcompass",
            "search",
            "--import",
            "org/Repo-GGUF",
            "model-Q4_K_M.gguf",
        ]);
        match args.command {
            Commands::Search(search) => {
                assert_eq!(
                    search.import,
                    Some(vec!["org/Repo-GGUF".into(), "model-Q4_K_M.gguf".into()])
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_verbose_quiet_conflict() {
        assert!(CliArgs::try_parse_from(["modelcompass", "-v", "-q", "hardware"]).is_err());
    }
}
