//! Retrieving raw asset bytes.

use crate::AudioError;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, error};

/// Completion callback for [`Fetcher::fetch`].
pub type FetchCallback = Box<dyn FnOnce(Result<Vec<u8>, AudioError>) + Send + 'static>;

/// Host capability retrieving the bytes behind a locator.
///
/// Implementations must not block the caller and must invoke `done` at most
/// once. A fetch that never completes simply leaves its sound unloaded.
pub trait Fetcher {
    /// Start retrieving `locator`.
    fn fetch(&self, locator: &str, done: FetchCallback);
}

/// Reads assets from the local filesystem on a background thread.
#[derive(Debug, Clone, Default)]
pub struct FsFetcher {
    root: Option<PathBuf>,
}

impl FsFetcher {
    /// Resolve locators relative to the current directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve locators relative to `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Path a locator resolves to.
    pub fn resolve(&self, locator: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(locator),
            None => Path::new(locator).to_path_buf(),
        }
    }
}

impl Fetcher for FsFetcher {
    fn fetch(&self, locator: &str, done: FetchCallback) {
        let path = self.resolve(locator);
        let locator = locator.to_string();
        let spawned = thread::Builder::new()
            .name("gaudio-fetch".into())
            .spawn(move || {
                let result = fs::read(&path).map_err(|err| AudioError::fetch(&locator, err));
                if let Ok(bytes) = &result {
                    debug!(locator = %locator, bytes = bytes.len(), "fetched asset");
                }
                done(result);
            });
        if let Err(err) = spawned {
            error!("Failed to spawn fetch thread: {err}");
        }
    }
}
