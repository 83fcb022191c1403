//! Indexer configuration.

use std::path::PathBuf;

/// Environment variable that overrides the default media folder.
pub const MEDIA_FOLDER_ENV: &str = "MEDIA_INDEXER_FOLDER";

/// Default observer channel capacity.
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Audio file extensions picked up by the folder walker (case-insensitive).
    pub extensions: Vec<String>,
    /// Extensions whose embedded cover art is cached as a sidecar image.
    pub cover_art_extensions: Vec<String>,
    /// Folders queued for indexing as soon as the indexer is created.
    pub initial_folders: Vec<PathBuf>,
    /// Capacity of the broadcast channel used for notifications.
    pub event_capacity: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".to_string()],
            cover_art_extensions: vec!["mp3".to_string()],
            initial_folders: Vec::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl IndexerConfig {
    /// Create a configuration with the default extensions and the given folders.
    pub fn with_folders(folders: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            initial_folders: folders.into_iter().collect(),
            ..Default::default()
        }
    }

    /// Build a configuration whose initial folders come from the environment.
    ///
    /// `MEDIA_INDEXER_FOLDER` wins when set; otherwise the platform music
    /// directory is used, if there is one.
    pub fn from_env() -> Self {
        Self::with_folders(default_media_folders(
            std::env::var_os(MEDIA_FOLDER_ENV).map(PathBuf::from),
        ))
    }

    /// Replace the supported extensions.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }
}

/// Resolve the default media folders from an optional override.
fn default_media_folders(custom: Option<PathBuf>) -> Vec<PathBuf> {
    match custom.filter(|p| !p.as_os_str().is_empty()) {
        Some(folder) => {
            tracing::info!(
                "{} is set, indexing {}",
                MEDIA_FOLDER_ENV,
                folder.display()
            );
            vec![folder]
        }
        None => {
            let folders: Vec<PathBuf> = dirs::audio_dir().into_iter().collect();
            tracing::info!("Searching for music files in {:?}", folders);
            folders
        }
    }
}
