//! HTTP glue over the game store.

mod handlers;
mod server;

pub use server::{routes, AppState, Server};
