mod commands;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use coursedeck::config::{Config, project_dirs};
use coursedeck::logging;
use coursedeck::view::{DraftFilter, SortKey};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), long_about = None)]
#[command(about = "Curate and watch YouTube course playlists")]
struct Cli {
  /// Config file (default: the platform config dir's coursedeck/config.toml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Directory holding the persisted stores
  #[arg(long, global = true, env = "COURSEDECK_DATA_DIR")]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Run the HTTP service
  Serve {
    #[arg(long)]
    host: Option<String>,
    #[arg(short, long)]
    port: Option<u16>,
  },
  /// Create, edit and publish playlists
  #[command(subcommand)]
  Playlist(PlaylistCommand),
  /// Published playlists, as on the home page
  Feed {
    #[arg(short, long, default_value = "")]
    search: String,
    #[arg(short, long)]
    tag: Option<String>,
  },
  /// Open a published playlist and record the video as watched
  Watch {
    id: String,
    /// 1-based video number
    #[arg(short, long, default_value_t = 1)]
    video: usize,
  },
  /// Playlists saved for later
  #[command(subcommand)]
  WatchLater(WatchLaterCommand),
  /// Continue-watching history
  #[command(subcommand)]
  History(HistoryCommand),
  /// Print shell completions
  Completions { shell: Shell },
}

#[derive(Subcommand, Debug)]
enum PlaylistCommand {
  /// Create a playlist, blank or fetched from a YouTube playlist URL
  Create {
    #[arg(short, long)]
    url: Option<String>,
    #[arg(short, long)]
    name: Option<String>,
    #[arg(short, long)]
    description: Option<String>,
    /// Comma-separated tags
    #[arg(short, long)]
    tags: Option<String>,
    #[arg(long)]
    thumbnail: Option<String>,
    /// Publish immediately instead of saving a draft
    #[arg(long)]
    publish: bool,
  },
  /// Admin listing, drafts included
  List {
    #[arg(short, long, default_value = "")]
    search: String,
    #[arg(short, long)]
    tag: Option<String>,
    /// all, drafts or published
    #[arg(long, default_value = "all")]
    drafts: DraftFilter,
    /// name-asc, name-desc, date-desc, date-asc, videos-desc or videos-asc
    #[arg(long, default_value = "date-desc")]
    sort: SortKey,
  },
  Show {
    id: String,
  },
  /// Edit fields and save in the playlist's current state
  Edit {
    id: String,
    #[arg(short, long)]
    name: Option<String>,
    #[arg(short, long)]
    description: Option<String>,
    /// Custom thumbnail URL; pass an empty string to clear it
    #[arg(long)]
    thumbnail: Option<String>,
    /// Replace all tags with this comma-separated list
    #[arg(short, long)]
    tags: Option<String>,
    #[arg(long = "add-tag")]
    add_tags: Vec<String>,
    #[arg(long = "remove-tag")]
    remove_tags: Vec<String>,
    #[arg(long)]
    source_url: Option<String>,
  },
  Publish {
    id: String,
  },
  Unpublish {
    id: String,
  },
  /// Permanently delete a draft
  Discard {
    id: String,
  },
  /// Permanently delete a published playlist
  Delete {
    id: String,
  },
  /// Re-fetch videos from the source playlist and save
  Refresh {
    id: String,
  },
  /// Move a video (1-based positions)
  MoveVideo {
    id: String,
    from: usize,
    to: usize,
  },
  RemoveVideo {
    id: String,
    video_id: String,
  },
  RenameVideo {
    id: String,
    video_id: String,
    title: String,
  },
}

#[derive(Subcommand, Debug)]
enum WatchLaterCommand {
  Add { id: String },
  Remove { id: String },
  List,
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
  List,
  Remove { id: String },
  Clear,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  if let Command::Completions { shell } = cli.command {
    clap_complete::generate(shell, &mut Cli::command(), "coursedeck", &mut std::io::stdout());
    return Ok(());
  }

  let log_dir = project_dirs().map(|dirs| dirs.data_local_dir().join("logs"));
  let _log_guard = logging::init(log_dir.as_deref());

  let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
  if let Some(dir) = cli.data_dir {
    config.storage.data_dir = Some(dir);
  }

  commands::run(cli.command, config).await
}
