use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{drag::Size, widget::WidgetConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Base URL of the playback service
    #[clap(long, short, default_value = "http://127.0.0.1:8888")]
    pub service_url: String,
    /// Poll the current song every X milliseconds
    #[clap(long, default_value_t = 3000)]
    pub poll_interval_ms: u64,
    /// Skip to the next song every X milliseconds while auto-skip is on
    #[clap(long, default_value_t = 30000)]
    pub skip_interval_ms: u64,
    /// Refresh the current song X milliseconds after a successful skip
    #[clap(long, default_value_t = 1000)]
    pub refresh_after_skip_ms: u64,
    /// Give up on a request to the playback service after X milliseconds
    #[clap(long, default_value_t = 10000)]
    pub request_timeout_ms: u64,
    /// Where to keep the widget position. Defaults to the user's state directory.
    #[clap(long, short)]
    pub position_file: Option<PathBuf>,
    /// Width of the widget box until the host reports one
    #[clap(long, default_value_t = 320)]
    pub widget_width: i32,
    /// Height of the widget box until the host reports one
    #[clap(long, default_value_t = 96)]
    pub widget_height: i32,
    /// Width of the viewport until the host reports one
    #[clap(long, default_value_t = 1920)]
    pub viewport_width: i32,
    /// Height of the viewport until the host reports one
    #[clap(long, default_value_t = 1080)]
    pub viewport_height: i32,
    /// File to write the log to. If not specified, logs will be written to stderr.
    #[clap(long, short)]
    log_file: Option<String>,
}

impl Args {
    /// Build the tracing subscriber using parameters from the command line arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn init_tracing_subscriber(&self) -> Result<()> {
        let builder = tracing_subscriber::fmt()
            .pretty()
            .with_env_filter(EnvFilter::from_default_env());

        match self.log_file.as_ref() {
            None => builder.with_writer(io::stderr).init(),
            Some(f) => {
                let file = File::create(f).with_context(|| format!("Failed to create {f}"))?;
                builder.with_writer(Mutex::new(file)).init();
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    #[must_use]
    pub const fn widget_config(&self) -> WidgetConfig {
        WidgetConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            skip_interval: Duration::from_millis(self.skip_interval_ms),
            refresh_after_skip: Duration::from_millis(self.refresh_after_skip_ms),
            viewport: Size::new(self.viewport_width, self.viewport_height),
            widget: Size::new(self.widget_width, self.widget_height),
            hint_delay: Duration::from_secs(3),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_widget_defaults() {
        let args = Args::parse_from(["nowplaying-overlay"]);
        assert_eq!(args.widget_config(), WidgetConfig::default());
        assert_eq!(args.request_timeout(), Duration::from_secs(10));
        assert_eq!(args.service_url, "http://127.0.0.1:8888");
        assert!(args.position_file.is_none());
    }

    #[test]
    fn intervals_in_milliseconds() {
        let args = Args::parse_from([
            "nowplaying-overlay",
            "--poll-interval-ms",
            "500",
            "--skip-interval-ms",
            "10000",
            "--viewport-width",
            "640",
        ]);
        let config = args.widget_config();
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.skip_interval, Duration::from_secs(10));
        assert_eq!(config.viewport, Size::new(640, 1080));
    }
}
