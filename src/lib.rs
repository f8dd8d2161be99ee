//! coursedeck: curate YouTube playlists into courses, publish them to a
//! Discord-gated site, and keep per-user watch-later and continue-watching state.

pub mod auth;
pub mod config;
pub mod constants;
pub mod discord;
pub mod duration;
pub mod editor;
pub mod library;
pub mod logging;
pub mod model;
pub mod render;
pub mod server;
pub mod storage;
pub mod store;
pub mod view;
pub mod youtube;
