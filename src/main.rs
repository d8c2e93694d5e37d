use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use travel_crew::llm::{LlmConfig, LlmOverrides, Provider};
use travel_crew::travel_crew;

/// Plan, research, write and review a travel itinerary.
#[derive(Debug, Parser)]
#[command(name = "travel-crew", version, about)]
struct Cli {
    /// Trip request, e.g. "3 days in Lisbon on a budget". Prompted for when omitted.
    topic: Vec<String>,

    /// Model name, routed through OpenRouter unless --provider openai.
    #[arg(long, env = "TRAVEL_CREW_MODEL")]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long)]
    max_tokens: Option<u32>,

    /// `openrouter` or `openai`.
    #[arg(long)]
    provider: Option<Provider>,

    /// Re-runs per task after transient model errors.
    #[arg(long, default_value_t = 3)]
    max_retries: usize,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn overrides(&self) -> LlmOverrides {
        let mut overrides = LlmOverrides::default();
        if let Some(model) = &self.model {
            overrides = overrides.model(model.clone());
        }
        if let Some(temperature) = self.temperature {
            overrides = overrides.temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            overrides = overrides.max_tokens(max_tokens);
        }
        if let Some(provider) = self.provider {
            overrides = overrides.provider(provider);
        }
        overrides
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_topic() -> Result<String> {
    print!("Where to? Describe your trip: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read trip request")?;
    Ok(line.trim().to_string())
}

fn run(cli: &Cli) -> Result<String> {
    let topic = if cli.topic.is_empty() {
        read_topic()?
    } else {
        cli.topic.join(" ")
    };
    if topic.trim().is_empty() {
        bail!("no trip request given");
    }

    let crew = travel_crew(&LlmConfig::from_env(), &cli.overrides())?.with_max_retries(cli.max_retries);
    let output = crew.kickoff(&topic)?;
    Ok(output.raw)
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(markdown) => {
            println!("## Final Output\n\n{markdown}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Pipeline failed: {err:#}");
            ExitCode::FAILURE
        }
    }
}
