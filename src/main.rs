use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use relay_token::ConfigSource;
use relay_token::token_codec::{
    ApiEndpoint, DEFAULT_EXPIRE_DAYS, DEFAULT_MAX_CALLS, DEFAULT_PROVIDER, IdScheme, TokenCodec,
    TokenOptions,
};

#[derive(Parser)]
#[command(name = "relay-token", version, about = "Issue encrypted relay access tokens")]
struct Cli {
    /// Path to the relay configuration (.rai JSON or YAML).
    #[arg(short, long, default_value = "default.rai")]
    conf: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue a new token.
    Issue(IssueArgs),
    /// Print a relay server URL.
    Url {
        /// Path below the base path; `health` for the liveness URL.
        #[arg(default_value = "")]
        path: String,
    },
    /// Decrypt a token and print its payload.
    Decode { token: String },
}

#[derive(Args)]
struct IssueArgs {
    /// Upstream API key embedded in the token.
    #[arg(long)]
    api_key: String,

    #[arg(long, default_value_t = DEFAULT_MAX_CALLS)]
    max_calls: u64,

    #[arg(long, default_value_t = DEFAULT_EXPIRE_DAYS)]
    expire_days: u32,

    #[arg(long, default_value = DEFAULT_PROVIDER)]
    provider: String,

    #[arg(long, conflicts_with = "model")]
    ext_info: Option<String>,

    /// Have the relay replace the request model.
    #[arg(long)]
    model: Option<String>,

    /// Print the full endpoint URL (chat_completions, images_generations, embeddings).
    #[arg(long)]
    endpoint: Option<ApiEndpoint>,

    /// Use UUIDv7 token ids instead of timestamps.
    #[arg(long)]
    uuid_ids: bool,
}

impl IssueArgs {
    fn options(&self) -> TokenOptions {
        let options = TokenOptions::new(&self.api_key)
            .with_max_calls(self.max_calls)
            .with_expire_days(self.expire_days)
            .with_provider(&self.provider);

        match (&self.model, &self.ext_info) {
            (Some(model), _) => options.with_model_override(model),
            (None, Some(ext_info)) => options.with_ext_info(ext_info),
            (None, None) => options,
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigSource::Unresolved(cli.conf).resolve()?;

    match cli.command {
        Command::Issue(args) => {
            let id_scheme = if args.uuid_ids {
                IdScheme::UuidV7
            } else {
                IdScheme::Timestamp
            };
            let codec = TokenCodec::new(config).with_id_scheme(id_scheme);
            let issued = codec.issue(&args.options())?;
            log::info!("issued {} (expires {})", issued.id, issued.expire_time);

            match args.endpoint {
                Some(endpoint) => {
                    println!("{}", codec.config().urls().endpoint_url(endpoint, &issued.token))
                }
                None => println!("{}", issued.token),
            }
        }
        Command::Url { path } => println!("{}", config.urls().url(&path)),
        Command::Decode { token } => {
            let payload = TokenCodec::new(config).decrypt(&token)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    // Enable basic logging; set RUST_LOG=info for visibility.
    env_logger::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
