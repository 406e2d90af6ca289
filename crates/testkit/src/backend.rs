use gaudio_audio::{
    AudioBackend, AudioBuffer, AudioContext, AudioDecoder, AudioError, AudioNode, ContextState,
    DecodeCallback,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Decoded buffer that only knows its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeBuffer {
    /// Playback length.
    pub duration: Duration,
}

impl FakeBuffer {
    /// Buffer lasting `ms` milliseconds.
    pub fn from_millis(ms: u64) -> Self {
        Self {
            duration: Duration::from_millis(ms),
        }
    }
}

impl AudioBuffer for FakeBuffer {
    fn duration(&self) -> Duration {
        self.duration
    }
}

/// Kind of a fake node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FakeNodeKind {
    /// One-shot buffer source.
    Source,
    /// Gain node.
    Gain,
    /// Channel splitter with the given channel count.
    Splitter(u32),
    /// Channel merger with the given channel count.
    Merger(u32),
    /// Context destination.
    Destination,
}

/// Everything observable the fake host did, in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GraphEvent {
    /// A context was created.
    ContextCreated {
        /// Context index, counting from zero.
        context: usize,
    },
    /// A suspended context was asked to resume.
    ContextResumed {
        /// Context index.
        context: usize,
    },
    /// A node was created.
    NodeCreated {
        /// Owning context index.
        context: usize,
        /// Node id, unique across contexts.
        node: usize,
        /// Node kind.
        kind: FakeNodeKind,
    },
    /// Two nodes were connected.
    Connected {
        /// Upstream node id.
        from: usize,
        /// Downstream node id.
        to: usize,
        /// Output index of the upstream node.
        output: u32,
        /// Input index of the downstream node.
        input: u32,
    },
    /// A source was started.
    Started {
        /// Source node id.
        node: usize,
        /// Start offset in seconds.
        offset: f64,
    },
}

struct FakeNodeInner {
    id: usize,
    context: usize,
    kind: FakeNodeKind,
    gain: Mutex<f32>,
    outputs: Mutex<Vec<(FakeNode, u32, u32)>>,
    host: Arc<Mutex<HostState>>,
}

/// Node recording its wiring and gain.
#[derive(Clone)]
pub struct FakeNode(Arc<FakeNodeInner>);

impl FakeNode {
    /// Unique id of the node.
    pub fn id(&self) -> usize {
        self.0.id
    }

    /// Index of the context that created the node.
    pub fn context(&self) -> usize {
        self.0.context
    }

    /// Kind of the node.
    pub fn kind(&self) -> FakeNodeKind {
        self.0.kind
    }

    /// Downstream connections as `(node, output, input)`.
    pub fn outputs(&self) -> Vec<(FakeNode, u32, u32)> {
        self.0
            .outputs
            .lock()
            .map(|outputs| outputs.clone())
            .unwrap_or_default()
    }

    /// Whether this is the very same host node as `other`.
    pub fn same_node(&self, other: &FakeNode) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for FakeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeNode")
            .field("id", &self.0.id)
            .field("kind", &self.0.kind)
            .field("gain", &self.gain())
            .finish()
    }
}

impl AudioNode for FakeNode {
    fn connect(&self, destination: &Self, output: u32, input: u32) {
        if let Ok(mut outputs) = self.0.outputs.lock() {
            outputs.push((destination.clone(), output, input));
        }
        if let Ok(mut host) = self.0.host.lock() {
            host.events.push(GraphEvent::Connected {
                from: self.0.id,
                to: destination.0.id,
                output,
                input,
            });
        }
    }

    fn set_gain(&self, value: f32) {
        if self.0.kind == FakeNodeKind::Gain {
            if let Ok(mut gain) = self.0.gain.lock() {
                *gain = value;
            }
        }
    }

    fn gain(&self) -> Option<f32> {
        if self.0.kind != FakeNodeKind::Gain {
            return None;
        }
        self.0.gain.lock().ok().map(|gain| *gain)
    }
}

struct PendingDecode {
    data: Vec<u8>,
    done: DecodeCallback<FakeBuffer>,
}

struct ContextRecord {
    state: ContextState,
    resumes: usize,
}

struct HostState {
    available: bool,
    refuse_sources: bool,
    fail_start: bool,
    initial_state: ContextState,
    contexts: Vec<ContextRecord>,
    pending_decodes: VecDeque<PendingDecode>,
    events: Vec<GraphEvent>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            available: true,
            refuse_sources: false,
            fail_start: false,
            initial_state: ContextState::Running,
            contexts: Vec::new(),
            pending_decodes: VecDeque::new(),
            events: Vec::new(),
        }
    }
}

static NEXT_NODE_ID: AtomicUsize = AtomicUsize::new(0);

/// Scriptable host. Clones share state, so keep one to inspect what the
/// manager did with the one it owns.
#[derive(Clone, Default)]
pub struct FakeBackend {
    host: Arc<Mutex<HostState>>,
}

impl FakeBackend {
    /// Host that can create contexts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host without any audio support.
    pub fn unavailable() -> Self {
        let backend = Self::default();
        backend.lock().available = false;
        backend
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        // A test that panicked while holding the lock has already failed.
        self.host.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make future context creation succeed or fail.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Make `create_buffer_source` return `None`.
    pub fn refuse_sources(&self, refuse: bool) {
        self.lock().refuse_sources = refuse;
    }

    /// Make `start` fail.
    pub fn fail_start(&self, fail: bool) {
        self.lock().fail_start = fail;
    }

    /// State new contexts start in.
    pub fn set_initial_state(&self, state: ContextState) {
        self.lock().initial_state = state;
    }

    /// Number of contexts created so far.
    pub fn contexts_created(&self) -> usize {
        self.lock().contexts.len()
    }

    /// Current state of context `index`.
    pub fn context_state(&self, index: usize) -> Option<ContextState> {
        self.lock().contexts.get(index).map(|c| c.state)
    }

    /// Force the state of context `index`, as a host suspending it would.
    pub fn set_context_state(&self, index: usize, state: ContextState) {
        if let Some(context) = self.lock().contexts.get_mut(index) {
            context.state = state;
        }
    }

    /// How many times context `index` was asked to resume.
    pub fn resume_count(&self, index: usize) -> usize {
        self.lock().contexts.get(index).map(|c| c.resumes).unwrap_or(0)
    }

    /// Everything the host did so far.
    pub fn events(&self) -> Vec<GraphEvent> {
        self.lock().events.clone()
    }

    /// Number of nodes created so far, across contexts.
    pub fn nodes_created(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|event| matches!(event, GraphEvent::NodeCreated { .. }))
            .count()
    }

    /// Ids of started sources, in start order.
    pub fn started(&self) -> Vec<usize> {
        self.lock()
            .events
            .iter()
            .filter_map(|event| match event {
                GraphEvent::Started { node, .. } => Some(*node),
                _ => None,
            })
            .collect()
    }

    /// Number of decodes waiting for an answer.
    pub fn pending_decodes(&self) -> usize {
        self.lock().pending_decodes.len()
    }

    /// Bytes handed to the oldest waiting decode.
    pub fn next_decode_input(&self) -> Option<Vec<u8>> {
        self.lock().pending_decodes.front().map(|p| p.data.clone())
    }

    /// Answer the oldest waiting decode. Returns `false` if none was waiting.
    pub fn complete_decode(&self, result: Result<FakeBuffer, AudioError>) -> bool {
        let pending = self.lock().pending_decodes.pop_front();
        match pending {
            Some(pending) => {
                (pending.done)(result);
                true
            }
            None => false,
        }
    }

    /// Answer every waiting decode with a buffer of `ms` milliseconds.
    pub fn complete_all_decodes(&self, ms: u64) -> usize {
        let drained: Vec<_> = self.lock().pending_decodes.drain(..).collect();
        let count = drained.len();
        for pending in drained {
            (pending.done)(Ok(FakeBuffer::from_millis(ms)));
        }
        count
    }
}

impl AudioBackend for FakeBackend {
    type Context = FakeContext;

    fn create_context(&self) -> Option<FakeContext> {
        let mut host = self.lock();
        if !host.available {
            return None;
        }
        let index = host.contexts.len();
        let state = host.initial_state;
        host.contexts.push(ContextRecord { state, resumes: 0 });
        host.events.push(GraphEvent::ContextCreated { context: index });
        drop(host);

        let context = FakeContext {
            index,
            host: Arc::clone(&self.host),
            destination: None,
        };
        let destination = context.node(FakeNodeKind::Destination);
        Some(FakeContext {
            destination: Some(destination),
            ..context
        })
    }
}

/// Context created by a [`FakeBackend`].
pub struct FakeContext {
    index: usize,
    host: Arc<Mutex<HostState>>,
    destination: Option<FakeNode>,
}

impl FakeContext {
    /// Index of this context in creation order.
    pub fn index(&self) -> usize {
        self.index
    }

    fn lock(&self) -> MutexGuard<'_, HostState> {
        self.host.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn node(&self, kind: FakeNodeKind) -> FakeNode {
        let id = NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed);
        self.lock().events.push(GraphEvent::NodeCreated {
            context: self.index,
            node: id,
            kind,
        });
        FakeNode(Arc::new(FakeNodeInner {
            id,
            context: self.index,
            kind,
            gain: Mutex::new(1.0),
            outputs: Mutex::new(Vec::new()),
            host: Arc::clone(&self.host),
        }))
    }
}

impl AudioContext for FakeContext {
    type Buffer = FakeBuffer;
    type Node = FakeNode;
    type Decoder = FakeDecoder;

    fn state(&self) -> ContextState {
        self.lock()
            .contexts
            .get(self.index)
            .map(|c| c.state)
            .unwrap_or(ContextState::Closed)
    }

    fn resume(&self) {
        let mut host = self.lock();
        if let Some(context) = host.contexts.get_mut(self.index) {
            context.resumes += 1;
            if context.state == ContextState::Suspended {
                context.state = ContextState::Running;
            }
        }
        host.events.push(GraphEvent::ContextResumed {
            context: self.index,
        });
    }

    fn destination(&self) -> FakeNode {
        match &self.destination {
            Some(destination) => destination.clone(),
            None => self.node(FakeNodeKind::Destination),
        }
    }

    fn check_start(&self, _buffer: &FakeBuffer) -> Result<(), AudioError> {
        if self.lock().fail_start {
            return Err(AudioError::start("start refused"));
        }
        Ok(())
    }

    fn create_buffer_source(&self, _buffer: Arc<FakeBuffer>) -> Option<FakeNode> {
        if self.lock().refuse_sources {
            return None;
        }
        Some(self.node(FakeNodeKind::Source))
    }

    fn create_gain(&self) -> FakeNode {
        self.node(FakeNodeKind::Gain)
    }

    fn create_channel_splitter(&self, channels: u32) -> FakeNode {
        self.node(FakeNodeKind::Splitter(channels))
    }

    fn create_channel_merger(&self, channels: u32) -> FakeNode {
        self.node(FakeNodeKind::Merger(channels))
    }

    fn start(&self, source: &FakeNode, offset: f64) -> Result<(), AudioError> {
        let mut host = self.lock();
        if host.fail_start {
            return Err(AudioError::start("start refused"));
        }
        host.events.push(GraphEvent::Started {
            node: source.id(),
            offset,
        });
        Ok(())
    }

    fn decoder(&self) -> FakeDecoder {
        FakeDecoder {
            host: Arc::clone(&self.host),
        }
    }
}

/// Decoder queueing work on its [`FakeBackend`].
pub struct FakeDecoder {
    host: Arc<Mutex<HostState>>,
}

impl AudioDecoder for FakeDecoder {
    type Buffer = FakeBuffer;

    fn decode_audio_data(&self, data: Vec<u8>, done: DecodeCallback<FakeBuffer>) {
        if let Ok(mut host) = self.host.lock() {
            host.pending_decodes.push_back(PendingDecode { data, done });
        }
    }
}
