use anyhow::{Context, Result};
use clap::Parser;
use gcx::config::{Config, ConfigOverrides};
use gcx::extract_embedded_json;
use gcx::runtime::{RealRuntime, Runtime};
use std::path::PathBuf;

/// gcx - authenticated Garmin Connect requests
///
/// Credentials come from GARMIN_TOKEN (a pre-issued bearer token) or a web
/// session cookie (GARMIN_COOKIE, or the cookie file) that is exchanged for
/// an access token.
///
/// Examples:
///   gcx get /userprofile-service/socialProfile
///   gcx put /userprofile-service/userprofile/user-settings --data '{"weight":72500}'
#[derive(Parser, Debug)]
#[command(author, version = env!("GCX_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (defaults to https://connect.garmin.com/gc-api)
    #[arg(
        long = "base-url",
        env = "GARMIN_CONNECT_URL",
        value_name = "URL",
        global = true
    )]
    pub base_url: Option<String>,

    /// Web session cookie to exchange for an access token
    #[arg(
        long = "cookie",
        env = "GARMIN_COOKIE",
        value_name = "COOKIE",
        hide_env_values = true,
        global = true
    )]
    pub cookie: Option<String>,

    /// File holding the session cookie (defaults to <config dir>/gcx/cookie)
    #[arg(long = "cookie-file", value_name = "PATH", global = true)]
    pub cookie_file: Option<PathBuf>,

    /// Pre-issued bearer token; skips the cookie exchange
    #[arg(
        long = "token",
        env = "GARMIN_TOKEN",
        value_name = "TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub token: Option<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            cookie: self.cookie.clone(),
            cookie_file: self.cookie_file.clone(),
            token: self.token.clone(),
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// GET a path and print the JSON response
    Get(GetArgs),

    /// PUT a JSON body to a path
    Put(PutArgs),

    /// Print the JSON a saved page assigns to window.<KEY>
    Extract(ExtractArgs),
}

#[derive(clap::Args, Debug)]
pub struct GetArgs {
    /// Path relative to the base URL, e.g. /userprofile-service/socialProfile
    #[arg(value_name = "PATH")]
    pub path: String,
}

#[derive(clap::Args, Debug)]
pub struct PutArgs {
    #[arg(value_name = "PATH")]
    pub path: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: String,
}

#[derive(clap::Args, Debug)]
pub struct ExtractArgs {
    /// Variable name after `window.`
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Saved HTML page
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;
    let overrides = cli.overrides();

    match cli.command {
        Commands::Get(args) => {
            let mut client = Config::load(&runtime, overrides)?.into_client();
            let value: serde_json::Value = client.get_json(&args.path).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Put(args) => {
            let body: serde_json::Value =
                serde_json::from_str(&args.data).context("--data is not valid JSON")?;
            let mut client = Config::load(&runtime, overrides)?.into_client();
            let response = client.put_json(&args.path, &body).await?;
            println!("{}", response.status());
        }
        Commands::Extract(args) => {
            let html = runtime.read_to_string(&args.file)?;
            let value: serde_json::Value = extract_embedded_json(&html, &args.key)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }
    Ok(())
}
