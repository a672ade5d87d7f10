use std::io;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use tokio::sync::mpsc;

use output::FramePresenter;
use position::FilePositionStore;
use service::{HttpPlaybackService, PlaybackService as _};
use widget::Widget;

mod args;
mod blink;
mod cache;
mod drag;
mod error;
mod input;
mod output;
mod position;
mod scheduler;
mod service;
mod sync;
#[cfg(test)]
mod testing;
mod utils;
mod widget;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = args::Args::parse();
    args.init_tracing_subscriber()?;

    let service = HttpPlaybackService::new(&args.service_url, args.request_timeout())?;
    let position_file = args
        .position_file
        .clone()
        .or_else(FilePositionStore::default_path)
        .context("No place to keep the widget position, pass --position-file")?;
    let store = FilePositionStore::new(position_file);
    tracing::debug!(path = %store.path().display(), "Using position file");
    let presenter = FramePresenter::new(io::stdout(), service.login_url());

    let (input_sender, input_receiver) = mpsc::channel(16);
    let _input = input::spawn_stdin_reader(input_sender)?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(?e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    Widget::new(args.widget_config(), service, store, presenter)
        .run(input_receiver, shutdown)
        .await
}
