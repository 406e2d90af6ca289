#![warn(missing_docs)]
//! Deterministic fakes of every host capability the sound manager uses.

mod backend;
mod clock;
mod fetch;

use anyhow::Result;
use gaudio_audio::{SoundId, SoundManager};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

pub use backend::*;
pub use clock::ManualClock;
pub use fetch::FakeFetcher;

/// Wall-clock start used by [`FakeHost::new`].
pub const START_MS: u64 = 1_700_000_000_000;

/// A fake backend, fetcher and clock wired together.
#[derive(Clone)]
pub struct FakeHost {
    /// Audio capability.
    pub backend: FakeBackend,
    /// Asset source.
    pub fetcher: FakeFetcher,
    /// Time source.
    pub clock: ManualClock,
}

impl FakeHost {
    /// Host with audio support, the clock at [`START_MS`].
    pub fn new() -> Self {
        Self::with_backend(FakeBackend::new())
    }

    /// Host around a preconfigured backend.
    pub fn with_backend(backend: FakeBackend) -> Self {
        Self {
            backend,
            fetcher: FakeFetcher::new(),
            clock: ManualClock::new(START_MS),
        }
    }

    /// Manager sharing this host's fakes; `setup` has not run yet.
    pub fn manager(&self) -> SoundManager<FakeBackend> {
        SoundManager::new(self.backend.clone())
            .with_fetcher(self.fetcher.clone())
            .with_clock(self.clock.clone())
    }

    /// Load `filename` and finish its fetch and decode with a `duration_ms` buffer.
    pub fn load_ready(
        &self,
        manager: &mut SoundManager<FakeBackend>,
        filename: &str,
        is_music: bool,
        duration_ms: u64,
    ) -> SoundId {
        let id = manager.load(filename, is_music);
        if self.fetcher.respond(filename, Ok(filename.as_bytes().to_vec())) {
            self.backend
                .complete_decode(Ok(FakeBuffer::from_millis(duration_ms)));
        }
        id
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

/// A sink that writes host events as newline-delimited JSON.
pub struct JsonlSink {
    file: File,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent dirs if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            file: File::create(path)?,
        })
    }

    /// Append an event to the log.
    pub fn write(&mut self, event: &GraphEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        Ok(())
    }

    /// Append every event recorded by `backend`.
    pub fn write_all(&mut self, backend: &FakeBackend) -> Result<usize> {
        let events = backend.events();
        for event in &events {
            self.write(event)?;
        }
        tracing::debug!(events = events.len(), "wrote graph event log");
        Ok(events.len())
    }
}
