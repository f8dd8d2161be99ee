use anyhow::{Context, Result, bail};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{info, warn};

use coursedeck::auth::SessionService;
use coursedeck::config::Config;
use coursedeck::constants::constants;
use coursedeck::discord::DiscordClient;
use coursedeck::editor::{PlaylistEditor, PlaylistState};
use coursedeck::library::Library;
use coursedeck::model::Playlist;
use coursedeck::render;
use coursedeck::server::{self, AppState, ServerOptions};
use coursedeck::storage::JsonFileStore;
use coursedeck::view::{self, AdminQuery};
use coursedeck::youtube::YoutubeClient;

use crate::{Command, HistoryCommand, PlaylistCommand, WatchLaterCommand};

pub async fn run(command: Command, config: Config) -> Result<()> {
  match command {
    Command::Serve { host, port } => serve(config, host, port).await,
    Command::Completions { .. } => Ok(()),
    command => {
      let data_dir = config.data_dir().context("Cannot locate a data directory")?;
      info!(data_dir = %data_dir.display(), "commands: opening library");
      let mut library = Library::open(Arc::new(JsonFileStore::new(data_dir)));
      let result = match command {
        Command::Playlist(cmd) => playlist(&mut library, &config, cmd).await,
        Command::Feed { search, tag } => {
          feed(&library, &search, tag.as_deref());
          Ok(())
        }
        Command::Watch { id, video } => watch(&mut library, &id, video),
        Command::WatchLater(cmd) => watch_later(&mut library, cmd),
        Command::History(cmd) => history(&mut library, cmd),
        Command::Serve { .. } | Command::Completions { .. } => Ok(()),
      };
      if let Some(e) = library.persistence_error() {
        eprintln!("warning: changes are kept for this run only, saving failed: {}", e);
      }
      result
    }
  }
}

// --- Helpers ---

/// Exact id, or a unique id prefix as printed by the listings.
fn resolve_id(library: &Library, id: &str) -> Result<String> {
  let id = id.trim();
  if id.is_empty() {
    bail!("Playlist id must not be empty");
  }
  if library.playlist(id).is_some() {
    return Ok(id.to_string());
  }
  let matches: Vec<&Playlist> = library.playlists().iter().filter(|p| p.id.starts_with(id)).collect();
  match matches.as_slice() {
    [one] => Ok(one.id.clone()),
    [] => bail!("No playlist with id '{}'", id),
    _ => bail!("Id prefix '{}' matches {} playlists", id, matches.len()),
  }
}

fn youtube_client(config: &Config) -> YoutubeClient {
  let api_key = config.youtube.api_key.clone();
  match &config.youtube.api_base {
    Some(base) => YoutubeClient::with_base(reqwest::Client::new(), base, api_key),
    None => YoutubeClient::new(api_key),
  }
}

/// Persist the editor in whatever state the playlist is already in.
fn save_in_place(editor: &mut PlaylistEditor, library: &mut Library) -> Result<String> {
  let id = match editor.state() {
    Some(PlaylistState::Published) => editor.publish(library)?,
    _ => editor.save_draft(library)?,
  };
  Ok(id)
}

// --- Serve ---

async fn serve(mut config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
  if let Some(host) = host {
    config.server.host = host;
  }
  if let Some(port) = port {
    config.server.port = port;
  }
  config.validate_for_server().context("Server configuration incomplete")?;
  if config.youtube.api_key.is_none() {
    warn!("serve: no YouTube API key configured; playlist fetches will fail");
  }

  let discord = match &config.discord.api_base {
    Some(base) => DiscordClient::with_base(
      reqwest::Client::new(),
      config.discord_app(),
      base,
      &constants().discord_authorize_url,
    ),
    None => DiscordClient::new(config.discord_app()),
  };
  let public_url = config.server.public_url();
  let state = AppState::new(
    Arc::new(youtube_client(&config)),
    Arc::new(discord),
    SessionService::new(&config.session.secret, config.session.ttl_hours),
    config.role_policy(),
    ServerOptions {
      require_auth: config.server.require_auth,
      web_dir: config.server.web_dir.clone(),
      secure_cookies: public_url.starts_with("https://"),
    },
  );

  let ip: IpAddr = config.server.host.parse().with_context(|| format!("Invalid host '{}'", config.server.host))?;
  let addr = SocketAddr::new(ip, config.server.port);
  info!(public_url = %public_url, "serve: starting");
  server::serve(addr, state).await.context("Server failed")
}

// --- Playlists ---

async fn playlist(library: &mut Library, config: &Config, command: PlaylistCommand) -> Result<()> {
  match command {
    PlaylistCommand::Create { url, name, description, tags, thumbnail, publish } => {
      let mut editor = match url.as_deref() {
        Some(url) => PlaylistEditor::from_source(&youtube_client(config), url)
          .await
          .context("Failed to fetch playlist data")?,
        None => PlaylistEditor::new_blank(),
      };
      if let Some(name) = name {
        editor.set_name(&name);
      }
      if let Some(description) = description {
        editor.set_description(&description);
      }
      if let Some(tags) = tags {
        editor.set_tags_csv(&tags);
      }
      if thumbnail.is_some() {
        editor.set_thumbnail(thumbnail.as_deref());
      }
      let id = if publish { editor.publish(library)? } else { editor.save_draft(library)? };
      println!("{} {}", if publish { "Published" } else { "Saved draft" }, id);
    }
    PlaylistCommand::List { search, tag, drafts, sort } => {
      let query = AdminQuery { search, tag, drafts, sort };
      let listing = view::admin_listing(library.playlists(), &query);
      print!("{}", render::playlist_table(&listing, true));
    }
    PlaylistCommand::Show { id } => {
      let id = resolve_id(library, &id)?;
      if let Some(playlist) = library.playlist(&id) {
        print!("{}", render::playlist_detail(playlist));
      }
    }
    PlaylistCommand::Edit { id, name, description, thumbnail, tags, add_tags, remove_tags, source_url } => {
      let id = resolve_id(library, &id)?;
      let mut editor = PlaylistEditor::open(library, &id)?;
      if let Some(name) = name {
        editor.set_name(&name);
      }
      if let Some(description) = description {
        editor.set_description(&description);
      }
      if let Some(thumbnail) = thumbnail {
        editor.set_thumbnail(Some(thumbnail.as_str()));
      }
      if let Some(tags) = tags {
        editor.set_tags_csv(&tags);
      }
      for tag in &add_tags {
        editor.add_tag(tag);
      }
      for tag in &remove_tags {
        editor.remove_tag(tag);
      }
      if let Some(url) = source_url {
        editor.set_source_url(&url);
      }
      if !editor.is_dirty() {
        println!("Nothing to change.");
        return Ok(());
      }
      save_in_place(&mut editor, library)?;
      println!("Saved {}", id);
    }
    PlaylistCommand::Publish { id } => {
      let id = resolve_id(library, &id)?;
      PlaylistEditor::open(library, &id)?.publish(library)?;
      println!("Published {}", id);
    }
    PlaylistCommand::Unpublish { id } => {
      let id = resolve_id(library, &id)?;
      PlaylistEditor::open(library, &id)?.unpublish(library)?;
      println!("Unpublished {}; it is now a draft", id);
    }
    PlaylistCommand::Discard { id } => {
      let id = resolve_id(library, &id)?;
      PlaylistEditor::open(library, &id)?.discard_draft(library)?;
      println!("Discarded draft {}", id);
    }
    PlaylistCommand::Delete { id } => {
      let id = resolve_id(library, &id)?;
      PlaylistEditor::open(library, &id)?.delete(library)?;
      println!("Deleted {}", id);
    }
    PlaylistCommand::Refresh { id } => {
      let id = resolve_id(library, &id)?;
      let mut editor = PlaylistEditor::open(library, &id)?;
      editor.refresh(&youtube_client(config)).await.context("Failed to fetch playlist data")?;
      if editor.is_dirty() {
        save_in_place(&mut editor, library)?;
        println!("Refreshed {} ({} videos)", id, editor.buffer().videos.len());
      } else {
        println!("{} is up to date", id);
      }
    }
    PlaylistCommand::MoveVideo { id, from, to } => {
      let id = resolve_id(library, &id)?;
      let mut editor = PlaylistEditor::open(library, &id)?;
      if from == 0 || to == 0 || !editor.move_video(from - 1, to - 1) {
        bail!("Positions must be between 1 and {}", editor.buffer().videos.len());
      }
      save_in_place(&mut editor, library)?;
    }
    PlaylistCommand::RemoveVideo { id, video_id } => {
      let id = resolve_id(library, &id)?;
      let mut editor = PlaylistEditor::open(library, &id)?;
      if !editor.remove_video(&video_id) {
        bail!("Video '{}' is not in this playlist", video_id);
      }
      save_in_place(&mut editor, library)?;
    }
    PlaylistCommand::RenameVideo { id, video_id, title } => {
      let id = resolve_id(library, &id)?;
      let mut editor = PlaylistEditor::open(library, &id)?;
      if !editor.rename_video(&video_id, &title) {
        bail!("Video '{}' is not in this playlist", video_id);
      }
      save_in_place(&mut editor, library)?;
    }
  }
  Ok(())
}

// --- Viewing ---

fn feed(library: &Library, search: &str, tag: Option<&str>) {
  print!("{}", render::tag_groups(&view::tag_groups(library.playlists())));
  let continuing = view::continue_watching(library.playlists(), library.history());
  if !continuing.is_empty() && search.trim().is_empty() && tag.is_none() {
    println!("\nContinue watching");
    print!("{}", render::continue_watching(&continuing));
  }
  println!();
  print!("{}", render::playlist_table(&view::public_feed(library.playlists(), search, tag), false));
}

fn watch(library: &mut Library, id: &str, video: usize) -> Result<()> {
  let id = resolve_id(library, id)?;
  let Some(playlist) = view::find_public(library.playlists(), &id) else {
    bail!("Playlist not found");
  };
  let index = video.checked_sub(1).context("Video numbers start at 1")?;
  let Some(current) = playlist.videos.get(index) else {
    bail!("Playlist has {} videos", playlist.videos.len());
  };
  println!("{} ({}/{})", current.title, video, playlist.videos.len());
  println!("{}", current.url);
  library.add_to_history(&id, index)?;
  Ok(())
}

fn watch_later(library: &mut Library, command: WatchLaterCommand) -> Result<()> {
  match command {
    WatchLaterCommand::Add { id } => {
      let id = resolve_id(library, &id)?;
      if library.add_to_watch_later(&id)? {
        println!("Added to watch later");
      } else {
        println!("Already in watch later");
      }
    }
    WatchLaterCommand::Remove { id } => {
      let id = resolve_id(library, &id).unwrap_or(id);
      if !library.remove_from_watch_later(&id) {
        println!("Not in watch later");
      }
    }
    WatchLaterCommand::List => {
      let saved = view::watch_later(library.playlists(), library.watch_later_ids());
      print!("{}", render::playlist_table(&saved, false));
    }
  }
  Ok(())
}

fn history(library: &mut Library, command: HistoryCommand) -> Result<()> {
  match command {
    HistoryCommand::List => {
      print!("{}", render::continue_watching(&view::continue_watching(library.playlists(), library.history())));
    }
    HistoryCommand::Remove { id } => {
      let id = resolve_id(library, &id).unwrap_or(id);
      if !library.remove_from_history(&id) {
        println!("Not in history");
      }
    }
    HistoryCommand::Clear => {
      library.clear_history();
      println!("History cleared");
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use coursedeck::model::NewPlaylist;
  use coursedeck::storage::MemoryStore;

  fn library_with(names: &[&str]) -> (Library, Vec<String>) {
    let mut library = Library::open(Arc::new(MemoryStore::new()));
    let ids = names
      .iter()
      .map(|name| library.create_playlist(NewPlaylist { name: name.to_string(), ..Default::default() }))
      .collect();
    (library, ids)
  }

  #[test]
  fn resolve_id_accepts_exact_id_and_unique_prefix() {
    let (library, ids) = library_with(&["A"]);
    assert_eq!(resolve_id(&library, &ids[0]).unwrap(), ids[0]);
    assert_eq!(resolve_id(&library, &ids[0][..8]).unwrap(), ids[0]);
    assert!(resolve_id(&library, "not-an-id").is_err());
  }

  #[test]
  fn resolve_id_rejects_blank_id() {
    let (library, _) = library_with(&["Only"]);
    assert!(resolve_id(&library, "").is_err());
    assert!(resolve_id(&library, "   ").is_err());
  }
}
