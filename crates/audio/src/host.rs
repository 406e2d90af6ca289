//! Capabilities the host environment provides to the sound manager.
//!
//! The manager never talks to an audio device directly. It asks an
//! [`AudioBackend`] for a context and builds small playback graphs out of the
//! nodes that context hands back. Everything here is a seam: the shipped
//! backends live in [`crate::backend`], and deterministic fakes live in the
//! testkit crate.

use crate::AudioError;
use std::sync::Arc;
use std::time::Duration;

/// Completion callback for [`AudioDecoder::decode_audio_data`].
pub type DecodeCallback<B> = Box<dyn FnOnce(Result<B, AudioError>) + Send + 'static>;

/// Run state of an audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Audio is flowing.
    Running,
    /// The host paused the context (autoplay policy, backgrounding, ads...).
    Suspended,
    /// The context can no longer be used.
    Closed,
}

/// Decoded PCM data.
pub trait AudioBuffer {
    /// Playback length of the buffer.
    fn duration(&self) -> Duration;
}

/// Handle to a host-owned node in an audio graph.
///
/// Handles are cheap to clone and stay usable after the context that created
/// them has been replaced.
pub trait AudioNode: Clone {
    /// Route `output` of this node into `input` of `destination`.
    fn connect(&self, destination: &Self, output: u32, input: u32);

    /// Set the gain of a gain node. Other node kinds ignore this.
    fn set_gain(&self, value: f32);

    /// Current gain, or `None` when this is not a gain node.
    fn gain(&self) -> Option<f32>;
}

/// Turns fetched bytes into an [`AudioBuffer`] in the background.
pub trait AudioDecoder: Send + 'static {
    /// Buffer type produced by this decoder.
    type Buffer: AudioBuffer + Send + Sync + 'static;

    /// Decode `data`, invoking `done` exactly once with the outcome.
    fn decode_audio_data(&self, data: Vec<u8>, done: DecodeCallback<Self::Buffer>);
}

/// A live audio context: node factory plus the sink all graphs end in.
pub trait AudioContext {
    /// Buffer type played by this context.
    type Buffer: AudioBuffer + Send + Sync + 'static;
    /// Node handle type.
    type Node: AudioNode;
    /// Decoder producing [`Self::Buffer`]s.
    type Decoder: AudioDecoder<Buffer = Self::Buffer>;

    /// Current run state.
    fn state(&self) -> ContextState;

    /// Ask the host to resume a suspended context.
    fn resume(&self);

    /// The final sink (speakers).
    fn destination(&self) -> Self::Node;

    /// Confirm a source playing `buffer` could be started, before any node is created.
    fn check_start(&self, buffer: &Self::Buffer) -> Result<(), AudioError>;

    /// Create a one-shot source playing `buffer`, if the host can.
    fn create_buffer_source(&self, buffer: Arc<Self::Buffer>) -> Option<Self::Node>;

    /// Create a gain node with unity gain.
    fn create_gain(&self) -> Self::Node;

    /// Create a node splitting its input into `channels` mono outputs.
    fn create_channel_splitter(&self, channels: u32) -> Self::Node;

    /// Create a node merging `channels` mono inputs into one output.
    fn create_channel_merger(&self, channels: u32) -> Self::Node;

    /// Start a source created by [`Self::create_buffer_source`], `offset` seconds in.
    fn start(&self, source: &Self::Node, offset: f64) -> Result<(), AudioError>;

    /// Decoder that can outlive the borrow of this context.
    fn decoder(&self) -> Self::Decoder;
}

/// The host capability able to create audio contexts.
pub trait AudioBackend {
    /// Context type produced by this backend.
    type Context: AudioContext;

    /// Create a fresh context, or `None` when the host has no audio support.
    fn create_context(&self) -> Option<Self::Context>;
}

/// Host events the manager reacts to once [`crate::SoundManager::setup`] ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// A touch gesture ended.
    TouchEnd,
    /// A mouse button was released.
    MouseUp,
    /// The application was hidden or shown again.
    VisibilityChange {
        /// `true` when the application went to the background.
        hidden: bool,
    },
}

impl HostEvent {
    /// Whether this event counts as a genuine user gesture.
    pub fn is_gesture(&self) -> bool {
        matches!(self, Self::TouchEnd | Self::MouseUp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gestures() {
        assert!(HostEvent::TouchEnd.is_gesture());
        assert!(HostEvent::MouseUp.is_gesture());
        assert!(!HostEvent::VisibilityChange { hidden: true }.is_gesture());
    }
}
