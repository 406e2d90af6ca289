//! Sound loading and playback over a host audio graph.
//!
//! Loads and decodes sounds in the background, plays them through small
//! per-session graphs with optional stereo panning, and keeps per-sound and
//! global (music / non-music) volumes. Also handles hosts that only allow
//! audio after a user gesture, and hosts that lose their context when the
//! application is backgrounded.
//!
//! # Architecture
//!
//! - [`SoundManager`] - Main interface: load, play, pan, stop, volumes, unlock
//! - [`AudioBackend`] and friends in [`host`] - What the host must provide
//! - [`backend`] - Shipped hosts ([`backend::NoAudio`], rodio behind `rodio_backend`)
//! - [`GlobalVolumes`] - The two global volume scalars
//! - [`PanGains`] - The pan law
//!
//! # Example
//!
//! ```ignore
//! let mut audio = SoundManager::new(RodioBackend);
//! audio.setup();
//! let gong = audio.load("gong.ogg", false);
//! // ...once decoded, from a click handler:
//! audio.handle_event(HostEvent::MouseUp);
//! audio.play(gong, Some(0.25));
//! ```

pub mod backend;
mod clock;
mod error;
mod fetch;
pub mod host;
mod manager;
mod pan;
mod settings;
mod sound;

pub use clock::{Clock, SystemClock};
pub use error::AudioError;
pub use fetch::{FetchCallback, Fetcher, FsFetcher};
pub use host::{
    AudioBackend, AudioBuffer, AudioContext, AudioDecoder, AudioNode, ContextState,
    DecodeCallback, HostEvent,
};
pub use manager::SoundManager;
pub use pan::PanGains;
pub use settings::GlobalVolumes;
pub use sound::{Sound, SoundId};
