use std::{path::PathBuf, str::FromStr};

use clap::{
    ArgAction, Args, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use lyricsync::{
    cli, config, error,
    library::Selection,
    types::{Provider, UpgradePolicy},
};

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
    /// Library root, overrides LYRICSYNC_MUSIC_DIR
    #[clap(long, global = true)]
    music_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download lyrics for artists, albums, tracks or paths
    Download(DownloadOptions),

    /// Find and download lyrics for tracks that have none
    Missing(MissingOptions),

    /// Search lyrics for one track with a custom query
    Search(SearchArgs),

    /// Show lyric completeness of the library
    Status(StatusOptions),

    /// Print the quality state of lyric files
    Classify(ClassifyOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    /// Files or folders to process
    pub paths: Vec<PathBuf>,

    /// Artist folder below the library root; can be repeated
    #[clap(long, action = ArgAction::Append)]
    pub artist: Vec<String>,

    /// Album folder of the selected artist; can be repeated
    #[clap(long, action = ArgAction::Append)]
    pub album: Vec<String>,

    /// Track of the selected artist or album; can be repeated
    #[clap(long, action = ArgAction::Append)]
    pub track: Vec<PathBuf>,
}

impl From<SelectionArgs> for Selection {
    fn from(args: SelectionArgs) -> Self {
        Selection {
            artists: args.artist,
            albums: args.album,
            tracks: args.track,
            paths: args.paths,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Provider to use, in priority order; can be repeated
    #[clap(long = "provider", value_parser = Provider::from_str, action = ArgAction::Append)]
    pub providers: Vec<Provider>,

    /// Accept plain lyrics when no synced lyrics are found
    #[clap(long)]
    pub allow_plain: bool,

    /// What to do with existing plain lyrics
    #[clap(long, value_enum)]
    pub upgrade: Option<UpgradePolicy>,

    /// Store downloaded plain lyrics as .txt
    #[clap(long)]
    pub rename_plain: bool,

    /// Keep lines written in CJK scripts
    #[clap(long)]
    pub no_strip_cjk: bool,

    /// Keep lyrics that are mostly non-ASCII
    #[clap(long)]
    pub no_reject: bool,

    /// Share of non-ASCII characters above which lyrics are rejected
    #[clap(long)]
    pub reject_ratio: Option<f64>,

    /// Language hint passed to the providers; empty disables it
    #[clap(long)]
    pub lang: Option<String>,
}

impl PolicyArgs {
    fn into_overrides(self, music_dir: Option<PathBuf>) -> cli::Overrides {
        cli::Overrides {
            music_dir,
            providers: self.providers,
            allow_plain: self.allow_plain,
            upgrade: self.upgrade,
            rename_plain: self.rename_plain,
            no_strip_cjk: self.no_strip_cjk,
            no_reject: self.no_reject,
            reject_ratio: self.reject_ratio,
            lang: self.lang,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadOptions {
    #[clap(flatten)]
    pub selection: SelectionArgs,

    #[clap(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct MissingOptions {
    #[command(subcommand)]
    pub command: MissingSubcommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum MissingSubcommand {
    /// Record tracks without lyrics; scans the whole library without a selection
    Scan(MissingScanOpts),

    /// Download lyrics for the recorded tracks
    Download(MissingDownloadOpts),

    /// Forget the recorded tracks
    Clear,
}

#[derive(Parser, Debug, Clone)]
pub struct MissingScanOpts {
    #[clap(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct MissingDownloadOpts {
    #[clap(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Media file to search lyrics for
    pub track: PathBuf,

    /// Query to send instead of "Artist: Album - Title"
    #[clap(long)]
    pub query: Option<String>,

    /// Remove repeated artist names from the query
    #[clap(long)]
    pub dedup_artist: bool,

    /// Remove punctuation from the query
    #[clap(long)]
    pub strip_punctuation: bool,

    #[clap(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct StatusOptions {
    /// Show the albums of one artist
    #[clap(long)]
    pub artist: Option<String>,

    /// Include artists that were never scanned
    #[clap(long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ClassifyOptions {
    /// Lyric files, or media files whose lyric file should be checked
    #[clap(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    let music_dir = cli.music_dir;

    match cli.command {
        Command::Download(opt) => {
            cli::download(
                opt.selection.into(),
                opt.policy.into_overrides(music_dir),
            )
            .await
        }
        Command::Missing(opt) => match opt.command {
            MissingSubcommand::Scan(s) => {
                let overrides = cli::Overrides {
                    music_dir,
                    ..cli::Overrides::default()
                };
                cli::missing_scan(s.selection.into(), overrides).await
            }
            MissingSubcommand::Download(d) => {
                cli::missing_download(d.policy.into_overrides(music_dir)).await
            }
            MissingSubcommand::Clear => cli::missing_clear().await,
        },
        Command::Search(opt) => {
            let options = cli::SearchOptions {
                query: opt.query,
                dedup_artist: opt.dedup_artist,
                strip_punctuation: opt.strip_punctuation,
            };
            cli::search(opt.track, options, opt.policy.into_overrides(music_dir)).await
        }
        Command::Status(opt) => {
            let overrides = cli::Overrides {
                music_dir,
                ..cli::Overrides::default()
            };
            cli::status(opt.artist, opt.all, overrides).await
        }
        Command::Classify(opt) => cli::classify(opt.files).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
