//! The three persisted collections. Each one is independent; cross-store
//! rules such as the delete cascade live in [`crate::library::Library`].

pub mod continue_watching;
pub mod playlists;
pub mod watch_later;

pub use continue_watching::ContinueWatchingStore;
pub use playlists::PlaylistStore;
pub use watch_later::WatchLaterStore;
