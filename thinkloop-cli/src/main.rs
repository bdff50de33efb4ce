//! # thinkloop CLI
//!
//! Command-line front end for the plan-then-ReAct agent.
//!
//! Usage:
//!   thinkloop <task>
//!   thinkloop run [--model M] [--max-turns N] <task>
//!   thinkloop parse [FILE]
//!   thinkloop demo
//!
//! Examples:
//!   thinkloop "Get current price of Bitcoin"
//!   thinkloop --json run "What's the weather in Paris?"
//!   echo "Thought: hi" | thinkloop parse --json
//!   thinkloop demo -v

mod render;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use thinkloop_agent::{Agent, AgentConfig, AgentResult, SearchStub};
use thinkloop_llm::{
    Error, ErrorKind, LlmProvider, OpenAIProvider, ProviderConfig, Result, ScriptedProvider,
};
use thinkloop_parser::parse_response;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "thinkloop")]
#[command(author, version, about = "Plan a task, then reason and act through each step")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Task to execute (when not using subcommands)
    #[arg(trailing_var_arg = true)]
    task: Vec<String>,

    /// Enable verbose output (debug logs, full observations, token usage)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show final answer
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Model name (overrides THINKLOOP_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// API base URL (overrides OPENAI_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Sampling temperature
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Model turns allowed per plan step
    #[arg(long, global = true)]
    max_turns: Option<usize>,

    /// Completion length cap per model call
    #[arg(long, global = true)]
    max_tokens: Option<usize>,

    /// HTTP timeout in seconds for each model call
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a task against the configured model
    Run {
        /// The task description
        #[arg(trailing_var_arg = true, required = true)]
        task: Vec<String>,
    },
    /// Parse a model reply into plan steps and log entries
    Parse {
        /// File to read; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Run the Bitcoin walkthrough offline with scripted replies
    Demo,
}

const DEMO_TASK: &str = "Get current price of Bitcoin";

const DEMO_SCRIPT: [&str; 5] = [
    "PLAN:\n1. Identify Bitcoin's ticker symbol\n2. Search for the current BTC price",
    "Thought: I need to find the ticker symbol for Bitcoin.\nAction: Search(\"Bitcoin ticker symbol\")",
    "Thought: The ticker is BTC.\nFinal Answer: Bitcoin's ticker symbol is BTC.",
    "Thought: Now I need the current price of BTC.\nAction: Search(\"price of BTC\")",
    "Thought: The search returned the price.\nFinal Answer: The current price of Bitcoin is $54,000.",
];

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        Level::DEBUG
    } else if quiet {
        Level::WARN
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    // A subscriber set by an embedding process wins
    let _ = tracing::subscriber::set_global_default(subscriber);
}

impl Cli {
    fn agent_config(&self) -> AgentConfig {
        let mut config = AgentConfig::default();
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(max_turns) = self.max_turns {
            config.max_turns_per_subtask = max_turns;
        }
        config.max_tokens = self.max_tokens;
        config
    }

    fn provider_config(&self) -> anyhow::Result<ProviderConfig> {
        let mut config = ProviderConfig::from_env().map_err(|err| {
            if err.kind() == ErrorKind::ConfigInvalid {
                warn!("set OPENAI_API_KEY (or add it to .env), or try `thinkloop demo`");
            }
            err
        })?;
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            warn!(error = %err, "failed to load .env");
        }
    }

    match &cli.command {
        Some(Commands::Run { task }) => run_task(&cli, &task.join(" ")).await,
        Some(Commands::Parse { file }) => parse_input(&cli, file.as_deref()),
        Some(Commands::Demo) => run_demo(&cli).await,
        None if !cli.task.is_empty() => run_task(&cli, &cli.task.join(" ")).await,
        None => {
            eprintln!("No task given. Try `thinkloop --help` or `thinkloop demo`.");
            std::process::exit(2);
        }
    }
}

async fn run_task(cli: &Cli, task: &str) -> anyhow::Result<()> {
    let provider = OpenAIProvider::new(cli.provider_config()?)?;
    info!(provider = provider.name(), model = provider.default_model(), "starting agent");

    let mut agent = Agent::with_config(provider, SearchStub::new(), cli.agent_config());
    let result = agent.run(task).await?;
    emit(cli, &result)
}

async fn run_demo(cli: &Cli) -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(DEMO_SCRIPT);
    let mut agent = Agent::with_config(provider, SearchStub::new(), cli.agent_config());
    let result = agent.run(DEMO_TASK).await?;
    debug!(remaining = agent.provider().remaining(), "demo script finished");
    emit(cli, &result)
}

/// Read the text to parse from `file`, or stdin when absent
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|err| {
            Error::from(err)
                .with_operation("cli::read_input")
                .with_context("path", path.display().to_string())
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|err| Error::from(err).with_operation("cli::read_input"))?;
            Ok(buf)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|err| {
        Error::serialization_failed("failed to encode output as JSON")
            .with_operation("cli::to_json")
            .set_source(err)
    })
}

fn parse_input(cli: &Cli, file: Option<&Path>) -> anyhow::Result<()> {
    let text = read_input(file)?;

    let parsed = parse_response(&text);
    debug!(plan = parsed.plan.len(), log = parsed.log.len(), "parsed input");

    if cli.json {
        println!("{}", to_json(&parsed)?);
    } else {
        render::print_parsed(&parsed);
    }
    Ok(())
}

fn emit(cli: &Cli, result: &AgentResult) -> anyhow::Result<()> {
    if cli.json {
        println!("{}", to_json(result)?);
    } else {
        render::print_result(result, cli.verbose, cli.quiet);
    }
    Ok(())
}
