use std::path::PathBuf;

use anyhow::Context;
use botapi::{Bot, Config, File, Params, config::Args, telemetry};
use clap::{Parser, Subcommand};

/// Call the bot API from the command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    args: Args,

    /// Log request parameters and raw responses
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the bot's own account
    GetMe,
    /// Call any method with string parameters and print the raw response
    Raw {
        /// API method name, e.g. sendMessage
        method: String,
        /// Parameters as key=value, repeatable
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Upload a PNG for use in sticker sets
    UploadSticker {
        /// Owner of the sticker file
        #[arg(long)]
        user_id: i64,
        /// PNG file on disk
        #[arg(long)]
        png: PathBuf,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got `{s}`"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.args)?;
    if cli.verbose {
        config.verbose = true;
    }

    if cli.args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry()?;

    let bot = Bot::new(&config)?;

    match cli.command.unwrap_or(Command::GetMe) {
        Command::GetMe => {
            let me = bot.get_me().await.context("getMe failed")?;
            println!("{}", serde_json::to_string_pretty(&me)?);
        }
        Command::Raw { method, params } => {
            let params: Params = params.into_iter().collect();
            let data = bot.raw(&method, &params).await.with_context(|| format!("{method} failed"))?;
            println!("{}", String::from_utf8_lossy(&data));
        }
        Command::UploadSticker { user_id, png } => {
            let file = bot
                .upload_sticker(&user_id, File::from_disk(&png))
                .await
                .with_context(|| format!("failed to upload {}", png.display()))?;
            println!("{}", file.file_id);
        }
    }

    Ok(())
}
