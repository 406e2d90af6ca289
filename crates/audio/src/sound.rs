//! Loaded sounds and their playback session state.

use crate::host::{AudioBuffer, AudioContext};
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Handle to a sound registered with a [`crate::SoundManager`].
///
/// Ids are only meaningful for the manager that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundId(pub(crate) usize);

impl SoundId {
    /// Position of the sound in its manager's registry.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sound#{}", self.0)
    }
}

/// Slot filled in by the decoder once, from whatever thread finishes the decode.
pub(crate) type BufferSlot<B> = Arc<OnceLock<Arc<B>>>;

/// One loaded audio asset plus its current playback session.
pub struct Sound<C: AudioContext> {
    pub(crate) filename: String,
    pub(crate) is_music: bool,
    pub(crate) volume: f32,
    pub(crate) buffer: BufferSlot<C::Buffer>,
    /// Main gain node; the left channel when the session is panned.
    pub(crate) gain_node: Option<C::Node>,
    /// Right channel gain node; present only for panned sessions.
    pub(crate) gain_node2: Option<C::Node>,
    /// Wall-clock start of the current session, cleared by stop.
    pub(crate) played_at: Option<u64>,
    /// Part of stop-all/unlock-all. False when loaded without a context.
    pub(crate) registered: bool,
}

impl<C: AudioContext> Sound<C> {
    pub(crate) fn new(filename: String, is_music: bool, registered: bool) -> Self {
        Self {
            filename,
            is_music,
            volume: 1.0,
            buffer: Arc::new(OnceLock::new()),
            gain_node: None,
            gain_node2: None,
            played_at: None,
            registered,
        }
    }

    /// Locator the sound was loaded from.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Whether the music volume applies to this sound.
    pub fn is_music(&self) -> bool {
        self.is_music
    }

    /// Per-sound volume multiplier.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Whether decoding has finished successfully.
    pub fn is_loaded(&self) -> bool {
        self.buffer.get().is_some()
    }

    /// Decoded PCM data, once available.
    pub fn buffer(&self) -> Option<&Arc<C::Buffer>> {
        self.buffer.get()
    }

    /// Length of the decoded data, once available.
    pub fn duration(&self) -> Option<Duration> {
        self.buffer.get().map(|buffer| buffer.duration())
    }

    /// Gain node of the most recent session.
    pub fn gain_node(&self) -> Option<&C::Node> {
        self.gain_node.as_ref()
    }

    /// Right channel gain node of the most recent session, if it was panned.
    pub fn pan_node(&self) -> Option<&C::Node> {
        self.gain_node2.as_ref()
    }

    /// Start of the current session in milliseconds since the epoch.
    pub fn played_at(&self) -> Option<u64> {
        self.played_at
    }

    /// Whether bulk operations (stop all, unlock) include this sound.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Whether `now_ms` falls inside the current session's playback window.
    pub(crate) fn is_playing_at(&self, now_ms: u64) -> bool {
        match (self.played_at, self.duration()) {
            (Some(started), Some(duration)) => {
                (now_ms as f64) < started as f64 + duration.as_secs_f64() * 1000.0
            }
            _ => false,
        }
    }
}

impl<C: AudioContext> fmt::Debug for Sound<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sound")
            .field("filename", &self.filename)
            .field("is_music", &self.is_music)
            .field("volume", &self.volume)
            .field("loaded", &self.is_loaded())
            .field("panned", &self.gain_node2.is_some())
            .field("played_at", &self.played_at)
            .field("registered", &self.registered)
            .finish()
    }
}
