// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lumen Showroom - a product page built from sequenced full-viewport stages
//!
//! Each stage in the manifest is a stack of sections. While a stage fills
//! the window, wheel, swipe and arrow keys step between its sections
//! instead of scrolling the page. Once a stage lets go, the page scrolls
//! on to the content that follows it.
//!
//! ## Usage
//!
//! `lumen_showroom [MANIFEST]`
//!
//! The manifest path falls back to `LUMEN_STAGE_MANIFEST`, then to the
//! `stage.ron` shipped with the crate. The manifest is reloaded on save.

mod app;
mod event_log;
mod manifest;
mod manifest_watcher;
mod showroom;
mod theme;

use app::ShowroomApp;
use event_log::EventLogBridge;
use manifest::{DEFAULT_MANIFEST_PATH, MANIFEST_ENV_VAR};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "lumen_stage_app=debug,lumen_stage_sequencer=debug,wgpu=warn,naga=warn";

fn manifest_path() -> PathBuf {
    std::env::args()
        .nth(1)
        .or_else(|| std::env::var(MANIFEST_ENV_VAR).ok())
        .map_or_else(|| PathBuf::from(DEFAULT_MANIFEST_PATH), PathBuf::from)
}

fn main() {
    // Stage events go to stdout and to the in-app event log
    let (bridge_layer, log_rx) = EventLogBridge::new();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(bridge_layer)
        .init();

    tracing::info!("Starting Lumen Showroom v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = ShowroomApp::run(manifest_path(), Some(log_rx)) {
        tracing::error!("Showroom crashed: {e}");
        std::process::exit(1);
    }
}
