//! Where the widget was last left.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

/// Translation of the widget from its top-left anchor, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WidgetPosition {
    #[serde(rename = "widgetX")]
    pub offset_x: i32,
    #[serde(rename = "widgetY")]
    pub offset_y: i32,
}

impl WidgetPosition {
    #[must_use]
    pub const fn new(offset_x: i32, offset_y: i32) -> Self {
        Self { offset_x, offset_y }
    }
}

/// Persists one [`WidgetPosition`] across restarts.
pub trait PositionStore {
    /// The saved position, or `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage exists but cannot be read.
    fn load(&self) -> Result<Option<WidgetPosition>>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&mut self, position: WidgetPosition) -> Result<()>;
}

/// Stores the position as `{"widgetX": .., "widgetY": ..}` in a JSON file.
#[derive(Debug, Clone)]
pub struct FilePositionStore {
    path: PathBuf,
}

impl FilePositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `position.json` under the user's state directory, falling back to the config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::state_dir()
            .or_else(dirs::config_dir)
            .map(|d| d.join(env!("CARGO_PKG_NAME")).join("position.json"))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for FilePositionStore {
    fn load(&self) -> Result<Option<WidgetPosition>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };
        // A file missing either key counts as never saved
        #[derive(Deserialize)]
        struct Partial {
            #[serde(rename = "widgetX")]
            x: Option<i32>,
            #[serde(rename = "widgetY")]
            y: Option<i32>,
        }
        let partial: Partial = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;
        Ok(partial.x.zip(partial.y).map(|(x, y)| WidgetPosition::new(x, y)))
    }

    fn save(&mut self, position: WidgetPosition) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let data = serde_json::to_vec(&position)?;
        fs::write(&self.path, data)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
