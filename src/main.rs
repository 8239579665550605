use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use llm_starter_kit::{
    ClaudeClient, Config, OpenAiClient, Operation, ProviderError, RateLimiter,
};

#[derive(Parser)]
#[command(name = "llm-starter-kit", version)]
#[command(
    about = "Rate-limited, retrying access to the Anthropic and OpenAI APIs",
    long_about = None
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// LLM provider to use (anthropic, openai)
    #[arg(long, global = true, default_value = "anthropic")]
    provider: String,

    /// Model to use (provider-specific)
    #[arg(long, global = true)]
    model: Option<String>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,
    },
    /// Send a numbered series of messages through the rate limiter and retry
    Burst {
        /// Number of messages to send
        #[arg(long, default_value_t = 7)]
        count: u32,

        /// Calls allowed per window [default: MAX_REQUESTS_PER_MINUTE]
        #[arg(long)]
        max_calls: Option<usize>,

        /// Rate limit window in seconds
        #[arg(long, default_value_t = 60.0)]
        window_secs: f64,

        /// Attempts per message [default: RETRY_MAX_ATTEMPTS]
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Seconds between attempts [default: RETRY_DELAY_SECS]
        #[arg(long)]
        delay_secs: Option<f64>,

        /// Only retry timeouts, rate limits and server errors
        #[arg(long)]
        transient_only: bool,
    },
    /// Check that the configuration loads and the clients initialize
    Check,
}

/// The provider selected on the command line.
enum Client {
    Claude(ClaudeClient),
    OpenAi(OpenAiClient),
}

impl Client {
    fn send_message(&self, message: &str) -> Result<String, ProviderError> {
        match self {
            Self::Claude(client) => client.send_message(message),
            Self::OpenAi(client) => client.send_message(message),
        }
    }

    fn model(&self) -> &str {
        match self {
            Self::Claude(client) => client.model(),
            Self::OpenAi(client) => client.model(),
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive("info".parse().expect("valid log directive"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn create_client(provider: &str, model: Option<&str>, config: &Config) -> Result<Client> {
    match provider {
        "anthropic" => {
            let client = ClaudeClient::new(config)?;
            Ok(Client::Claude(match model {
                Some(m) => client.with_model(m),
                None => client,
            }))
        }
        "openai" => {
            let client = OpenAiClient::new(config)?;
            Ok(Client::OpenAi(match model {
                Some(m) => client.with_model(m),
                None => client,
            }))
        }
        _ => anyhow::bail!("unknown provider: {}", provider),
    }
}

fn report(name: &str, result: Result<(), ProviderError>) {
    match result {
        Ok(()) => println!("[ok]   {name} initializes"),
        Err(e @ ProviderError::MissingApiKey { .. }) => {
            println!("[warn] {name} needs API key: {e}")
        }
        Err(e) => println!("[fail] {name} error: {e}"),
    }
}

fn check(config: &Config) -> Result<()> {
    println!("Testing LLM starter kit setup...\n");
    println!("[ok]   configuration loads ({config:?})");

    let limiter = config.rate_limiter().context("invalid rate limit")?;
    println!(
        "[ok]   rate limiter allows {} calls per minute",
        limiter.max_calls()
    );
    let policy = config.retry_policy().context("invalid retry policy")?;
    println!(
        "[ok]   retry policy makes up to {} attempts",
        policy.max_attempts()
    );

    report("ClaudeClient", ClaudeClient::new(config).map(drop));
    report("OpenAiClient", OpenAiClient::new(config).map(drop));

    println!("\nAll checks complete.");
    if config.anthropic_api_key.is_none() || config.openai_api_key.is_none() {
        println!("Next step: add API keys to your .env file");
    }
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Ask { message } => {
            let client = create_client(&cli.provider, cli.model.as_deref(), &config)
                .context("failed to create LLM client")?;
            info!(provider = %cli.provider, model = client.model(), "sending message");

            match client.send_message(&message) {
                Ok(response) => println!("\n{}", response),
                Err(e) => {
                    error!(error = %e, "message failed");
                    std::process::exit(1);
                }
            }
        }
        Commands::Burst {
            count,
            max_calls,
            window_secs,
            max_attempts,
            delay_secs,
            transient_only,
        } => {
            let limiter = RateLimiter::from_secs_f64(
                max_calls.unwrap_or(config.max_requests_per_minute),
                window_secs,
            )
            .context("invalid rate limit")?;
            let mut settings = config.clone();
            if let Some(n) = max_attempts {
                settings.retry_max_attempts = n;
            }
            if let Some(secs) = delay_secs {
                settings.retry_delay_secs = secs;
            }
            let executor = settings
                .retry_executor()
                .context("invalid retry policy")?
                .named("send_message")
                .retry_if(move |e: &ProviderError| !transient_only || e.is_transient());

            let client = create_client(&cli.provider, cli.model.as_deref(), &config)
                .context("failed to create LLM client")?;
            info!(
                provider = %cli.provider,
                model = client.model(),
                max_calls = limiter.max_calls(),
                window_secs,
                max_attempts = executor.policy().max_attempts(),
                "starting burst"
            );

            let mut send =
                executor.wrap(limiter.wrap(|message: String| client.send_message(&message)));

            for i in 1..=count {
                println!("\nCall {i}:");
                let response = send
                    .invoke(format!("Count to {i}"))
                    .with_context(|| format!("call {i} failed"))?;
                println!("Response: {}...", preview(&response, 50));
            }
        }
        Commands::Check => check(&config)?,
    }

    Ok(())
}
