use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use spcanvas::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Enable debug logging
    #[clap(long, short, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API with scheduled token and secret refreshes
    Serve,

    /// Print a web player access token
    Token,

    /// Print the current TOTP code
    Totp,

    /// Look up the canvas of a track
    Canvas(CanvasOptions),

    /// Show a track
    Track(IdOption),

    /// List the tracks of an album
    Album(IdOption),

    /// List the tracks of a playlist
    Playlist(IdOption),

    /// Search for tracks
    Search(SearchOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CanvasOptions {
    /// Track id or spotify:track: URI
    id: String,

    /// Open the canvas in the default browser
    #[clap(long)]
    open: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct IdOption {
    id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    query: String,

    /// Number of results (1-50)
    #[clap(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=50))]
    limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "spcanvas=debug"
    } else {
        "spcanvas=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    match cli.command {
        Command::Serve => cli::serve().await,
        Command::Token => cli::token().await,
        Command::Totp => cli::totp().await,
        Command::Canvas(opt) => cli::canvas(&opt.id, opt.open).await,
        Command::Track(opt) => cli::track(&opt.id).await,
        Command::Album(opt) => cli::album(&opt.id).await,
        Command::Playlist(opt) => cli::playlist(&opt.id).await,
        Command::Search(opt) => cli::search(&opt.query, opt.limit).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
