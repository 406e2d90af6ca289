//! Native audio output through rodio.
//!
//! rodio has no node graph of its own, so nodes here only record how they are
//! wired. Starting a source walks that wiring once and turns it into a
//! [`RoutedSource`]: one route per output channel, each reading one input
//! channel through one gain node. Gains are read per sample, so stopping,
//! re-panning or changing the volume of a playing sound takes effect at once.
//!
//! Supported shapes are the two the manager builds:
//! `source -> gain -> destination` and
//! `source -> splitter -> gain(s) -> merger -> destination`.

use crate::host::{
    AudioBackend, AudioBuffer, AudioContext, AudioDecoder, AudioNode, ContextState,
    DecodeCallback,
};
use crate::AudioError;
use anyhow::{Context as _, Result};
use rodio::{OutputStream, OutputStreamHandle, Source};
use std::io::Cursor;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Host backed by the default output device.
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioBackend;

impl AudioBackend for RodioBackend {
    type Context = RodioContext;

    fn create_context(&self) -> Option<RodioContext> {
        match RodioContext::new() {
            Ok(context) => Some(context),
            Err(e) => {
                warn!("Failed to initialize audio: {e:#}");
                None
            }
        }
    }
}

/// Interleaved PCM samples.
#[derive(Debug, Clone)]
pub struct RodioBuffer {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

impl RodioBuffer {
    /// Wrap interleaved samples.
    pub fn new(channels: u16, sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            samples,
            channels: channels.max(1),
            sample_rate: sample_rate.max(1),
        }
    }

    /// Decode a complete encoded file (wav, vorbis, mp3).
    pub fn decode(data: Vec<u8>) -> Result<Self, AudioError> {
        let decoder = rodio::Decoder::new(Cursor::new(data)).map_err(AudioError::decode)?;
        let channels = decoder.channels();
        let sample_rate = decoder.sample_rate();
        if channels == 0 || sample_rate == 0 {
            return Err(AudioError::decode("stream has no channels"));
        }
        let samples = decoder.convert_samples::<f32>().collect();
        Ok(Self::new(channels, sample_rate, samples))
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Frames per second.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }
}

impl AudioBuffer for RodioBuffer {
    fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }
}

enum NodeKind {
    Source(Arc<RodioBuffer>),
    Gain,
    Splitter,
    Merger,
    Destination,
}

struct Connection {
    target: RodioNode,
    output: u32,
    input: u32,
}

struct NodeInner {
    kind: NodeKind,
    /// f32 bits, read from the output thread.
    gain: AtomicU32,
    outputs: Mutex<Vec<Connection>>,
}

/// Node in a rodio playback graph.
#[derive(Clone)]
pub struct RodioNode(Arc<NodeInner>);

impl RodioNode {
    fn new(kind: NodeKind) -> Self {
        Self(Arc::new(NodeInner {
            kind,
            gain: AtomicU32::new(1.0f32.to_bits()),
            outputs: Mutex::new(Vec::new()),
        }))
    }

    fn is_gain(&self) -> bool {
        matches!(self.0.kind, NodeKind::Gain)
    }

    fn current_gain(&self) -> f32 {
        f32::from_bits(self.0.gain.load(Ordering::Relaxed))
    }

    fn connections(&self) -> Vec<(RodioNode, u32, u32)> {
        self.0
            .outputs
            .lock()
            .map(|outputs| {
                outputs
                    .iter()
                    .map(|c| (c.target.clone(), c.output, c.input))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn feeds_destination(&self) -> bool {
        self.connections()
            .iter()
            .any(|(target, _, _)| matches!(target.0.kind, NodeKind::Destination))
    }
}

impl AudioNode for RodioNode {
    fn connect(&self, destination: &Self, output: u32, input: u32) {
        if let Ok(mut outputs) = self.0.outputs.lock() {
            outputs.push(Connection {
                target: destination.clone(),
                output,
                input,
            });
        }
    }

    fn set_gain(&self, value: f32) {
        if self.is_gain() {
            self.0.gain.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    fn gain(&self) -> Option<f32> {
        self.is_gain().then(|| self.current_gain())
    }
}

/// One output channel: a source channel scaled by a gain node.
struct Route {
    input_channel: usize,
    gain: RodioNode,
}

/// Work out the per-channel routes from `source` to the destination.
fn resolve_routes(source: &RodioNode, buffer: &RodioBuffer) -> Result<Vec<Route>, AudioError> {
    let outputs = source.connections();
    let [(first, _, _)] = outputs.as_slice() else {
        return Err(AudioError::start("source must feed exactly one node"));
    };

    match first.0.kind {
        NodeKind::Gain => {
            if !first.feeds_destination() {
                return Err(AudioError::start("gain node is not connected to the destination"));
            }
            Ok((0..buffer.channels as usize)
                .map(|input_channel| Route {
                    input_channel,
                    gain: first.clone(),
                })
                .collect())
        }
        NodeKind::Splitter => {
            let mut inputs = Vec::new();
            for (gain, split_channel, _) in first.connections() {
                if !gain.is_gain() {
                    return Err(AudioError::start("splitter must feed gain nodes"));
                }
                for (merger, _, merger_input) in gain.connections() {
                    if !matches!(merger.0.kind, NodeKind::Merger) {
                        return Err(AudioError::start("gain node must feed a merger"));
                    }
                    if !merger.feeds_destination() {
                        return Err(AudioError::start("merger is not connected to the destination"));
                    }
                    inputs.push((merger_input, split_channel as usize, gain.clone()));
                }
            }
            if inputs.is_empty() {
                return Err(AudioError::start("splitter has no routed outputs"));
            }
            inputs.sort_by_key(|(merger_input, _, _)| *merger_input);
            Ok(inputs
                .into_iter()
                .map(|(_, input_channel, gain)| Route {
                    input_channel,
                    gain,
                })
                .collect())
        }
        _ => Err(AudioError::start("unsupported playback graph")),
    }
}

/// Sample stream applying live gains to routed channels.
struct RoutedSource {
    buffer: Arc<RodioBuffer>,
    routes: Vec<Route>,
    frame: usize,
    channel: usize,
}

impl Iterator for RoutedSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let in_channels = self.buffer.channels as usize;
        let base = self.frame * in_channels;
        if self.frame >= self.buffer.frames() {
            return None;
        }
        let route = &self.routes[self.channel];
        let sample = self.buffer.samples[base + route.input_channel.min(in_channels - 1)];
        let value = sample * route.gain.current_gain();

        self.channel += 1;
        if self.channel == self.routes.len() {
            self.channel = 0;
            self.frame += 1;
        }
        Some(value)
    }
}

impl Source for RoutedSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.routes.len() as u16
    }

    fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.buffer.duration())
    }
}

/// Decodes on a background thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct RodioDecoder;

impl AudioDecoder for RodioDecoder {
    type Buffer = RodioBuffer;

    fn decode_audio_data(&self, data: Vec<u8>, done: DecodeCallback<RodioBuffer>) {
        let spawned = thread::Builder::new()
            .name("gaudio-decode".into())
            .spawn(move || done(RodioBuffer::decode(data)));
        if let Err(e) = spawned {
            warn!("Failed to spawn decode thread: {e}");
        }
    }
}

/// Context bound to the default output device.
pub struct RodioContext {
    /// Output stream (must be kept alive)
    _stream: OutputStream,
    /// Stream handle for starting sources
    handle: OutputStreamHandle,
    destination: RodioNode,
}

impl RodioContext {
    /// Open the default output device.
    pub fn new() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("Failed to create audio output stream")?;
        debug!("Audio backend: rodio");
        Ok(Self {
            _stream: stream,
            handle,
            destination: RodioNode::new(NodeKind::Destination),
        })
    }
}

impl AudioContext for RodioContext {
    type Buffer = RodioBuffer;
    type Node = RodioNode;
    type Decoder = RodioDecoder;

    fn state(&self) -> ContextState {
        ContextState::Running
    }

    fn resume(&self) {}

    fn destination(&self) -> RodioNode {
        self.destination.clone()
    }

    fn check_start(&self, buffer: &RodioBuffer) -> Result<(), AudioError> {
        if buffer.samples.is_empty() {
            return Err(AudioError::start("buffer has no samples"));
        }
        Ok(())
    }

    fn create_buffer_source(&self, buffer: Arc<RodioBuffer>) -> Option<RodioNode> {
        Some(RodioNode::new(NodeKind::Source(buffer)))
    }

    fn create_gain(&self) -> RodioNode {
        RodioNode::new(NodeKind::Gain)
    }

    fn create_channel_splitter(&self, _channels: u32) -> RodioNode {
        RodioNode::new(NodeKind::Splitter)
    }

    fn create_channel_merger(&self, _channels: u32) -> RodioNode {
        RodioNode::new(NodeKind::Merger)
    }

    fn start(&self, source: &RodioNode, offset: f64) -> Result<(), AudioError> {
        let NodeKind::Source(buffer) = &source.0.kind else {
            return Err(AudioError::start("only buffer sources can be started"));
        };
        let routes = resolve_routes(source, buffer)?;
        let skip = (offset.max(0.0) * buffer.sample_rate as f64) as usize;
        self.handle
            .play_raw(RoutedSource {
                buffer: Arc::clone(buffer),
                routes,
                frame: skip,
                channel: 0,
            })
            .map_err(AudioError::start)
    }

    fn decoder(&self) -> RodioDecoder {
        RodioDecoder
    }
}
