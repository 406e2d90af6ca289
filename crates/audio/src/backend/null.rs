//! Backend for hosts that offer no audio context at all.
//!
//! The types below are uninhabited: a [`NoAudio`] host never produces a
//! context, so none of their methods can ever run.

use crate::host::{
    AudioBackend, AudioBuffer, AudioContext, AudioDecoder, AudioNode, ContextState,
    DecodeCallback,
};
use crate::AudioError;
use std::sync::Arc;
use std::time::Duration;

/// Host without audio support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAudio;

impl AudioBackend for NoAudio {
    type Context = NoContext;

    fn create_context(&self) -> Option<NoContext> {
        None
    }
}

/// Context that cannot exist.
#[derive(Debug)]
pub enum NoContext {}

/// Buffer that cannot exist.
#[derive(Debug)]
pub enum NoBuffer {}

/// Node that cannot exist.
#[derive(Debug, Clone)]
pub enum NoNode {}

/// Decoder that cannot exist.
#[derive(Debug)]
pub enum NoDecoder {}

impl AudioBuffer for NoBuffer {
    fn duration(&self) -> Duration {
        match *self {}
    }
}

impl AudioNode for NoNode {
    fn connect(&self, _destination: &Self, _output: u32, _input: u32) {
        match *self {}
    }

    fn set_gain(&self, _value: f32) {
        match *self {}
    }

    fn gain(&self) -> Option<f32> {
        match *self {}
    }
}

impl AudioDecoder for NoDecoder {
    type Buffer = NoBuffer;

    fn decode_audio_data(&self, _data: Vec<u8>, _done: DecodeCallback<NoBuffer>) {
        match *self {}
    }
}

impl AudioContext for NoContext {
    type Buffer = NoBuffer;
    type Node = NoNode;
    type Decoder = NoDecoder;

    fn state(&self) -> ContextState {
        match *self {}
    }

    fn resume(&self) {
        match *self {}
    }

    fn destination(&self) -> NoNode {
        match *self {}
    }

    fn check_start(&self, _buffer: &NoBuffer) -> Result<(), AudioError> {
        match *self {}
    }

    fn create_buffer_source(&self, _buffer: Arc<NoBuffer>) -> Option<NoNode> {
        match *self {}
    }

    fn create_gain(&self) -> NoNode {
        match *self {}
    }

    fn create_channel_splitter(&self, _channels: u32) -> NoNode {
        match *self {}
    }

    fn create_channel_merger(&self, _channels: u32) -> NoNode {
        match *self {}
    }

    fn start(&self, _source: &NoNode, _offset: f64) -> Result<(), AudioError> {
        match *self {}
    }

    fn decoder(&self) -> NoDecoder {
        match *self {}
    }
}
