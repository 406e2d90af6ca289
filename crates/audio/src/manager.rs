//! Sound manager for loading, playback, volume and pan.

use crate::clock::{Clock, SystemClock};
use crate::fetch::{Fetcher, FsFetcher};
use crate::host::{AudioBackend, AudioContext, AudioDecoder, AudioNode, ContextState, HostEvent};
use crate::{AudioError, GlobalVolumes, PanGains, Sound, SoundId};
use std::sync::Arc;
use tracing::{debug, error, warn};

type UnlockCallback = Box<dyn FnOnce()>;

/// Main interface for loading and playing sounds.
///
/// Owns the registry of every sound ever loaded, the two global volumes and
/// the current audio context. Every failure degrades to a `false` return or a
/// no-op plus a log line; nothing here returns an error to the caller.
///
/// Lifecycle: [`SoundManager::new`] → [`SoundManager::setup`] → forward host
/// events through [`SoundManager::handle_event`] → [`SoundManager::teardown`].
pub struct SoundManager<B: AudioBackend> {
    backend: B,
    context: Option<B::Context>,
    /// Insertion ordered, never searched by key.
    sounds: Vec<Sound<B::Context>>,
    volumes: GlobalVolumes,
    fetcher: Box<dyn Fetcher>,
    clock: Box<dyn Clock>,
    unlocked: bool,
    listening: bool,
    on_unlocked: Option<UnlockCallback>,
}

impl<B: AudioBackend> SoundManager<B> {
    /// Create a manager over `backend`, reading assets from the filesystem.
    ///
    /// No context exists until [`Self::setup`] or [`Self::make_context`] runs.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            context: None,
            sounds: Vec::new(),
            volumes: GlobalVolumes::default(),
            fetcher: Box::new(FsFetcher::new()),
            clock: Box::new(SystemClock),
            unlocked: false,
            listening: false,
            on_unlocked: None,
        }
    }

    /// Replace the asset fetcher.
    pub fn with_fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Box::new(fetcher);
        self
    }

    /// Replace the clock used for playback windows.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Start from the given global volumes.
    pub fn with_volumes(mut self, volumes: GlobalVolumes) -> Self {
        self.volumes = volumes;
        self
    }

    /// Install the hook run once, right after audio gets unlocked.
    pub fn set_on_unlocked(&mut self, callback: impl FnOnce() + 'static) {
        self.on_unlocked = Some(Box::new(callback));
    }

    /// Start listening to host events and create the initial context.
    pub fn setup(&mut self) {
        self.listening = true;
        self.make_context();
    }

    /// Stop every sound, drop the context and stop listening to host events.
    ///
    /// The registry and volumes are kept; [`Self::setup`] may run again.
    pub fn teardown(&mut self) {
        self.stop_all();
        self.context = None;
        self.listening = false;
        debug!("Sound manager torn down");
    }

    /// React to a host event. Ignored unless [`Self::setup`] ran.
    pub fn handle_event(&mut self, event: HostEvent) {
        if !self.listening {
            return;
        }
        if event.is_gesture() {
            self.unlock_all();
        } else if let HostEvent::VisibilityChange { hidden } = event {
            if hidden {
                // Backgrounded apps must go quiet.
                self.stop_all();
            } else {
                // Some hosts never resume a context that was backgrounded.
                self.make_context();
            }
        }
    }

    /// (Re)create the audio context, abandoning any previous one.
    ///
    /// Keeps the current context when the host cannot create a new one.
    pub fn make_context(&mut self) {
        match self.backend.create_context() {
            Some(context) => {
                self.context = Some(context);
                debug!("Audio context created");
            }
            None => warn!("{}", AudioError::NoContext),
        }
    }

    /// Register a new sound and start fetching and decoding it in the background.
    ///
    /// The returned sound becomes playable once decoding finishes; poll
    /// [`Sound::is_loaded`] through [`Self::sound`] to find out when. Without a
    /// context the sound can never play and is left out of bulk operations.
    pub fn load(&mut self, filename: impl Into<String>, is_music: bool) -> SoundId {
        let filename = filename.into();
        let id = SoundId(self.sounds.len());

        let Some(context) = &self.context else {
            error!(filename = %filename, "{}", AudioError::NoContext);
            self.sounds.push(Sound::new(filename, is_music, false));
            return id;
        };

        let sound = Sound::new(filename.clone(), is_music, true);
        let slot = Arc::clone(&sound.buffer);
        let decoder = context.decoder();
        self.sounds.push(sound);

        let locator = filename.clone();
        self.fetcher.fetch(
            &filename,
            Box::new(move |fetched: Result<Vec<u8>, AudioError>| match fetched {
                Ok(bytes) => decoder.decode_audio_data(
                    bytes,
                    Box::new(move |decoded: Result<_, AudioError>| match decoded {
                        Ok(buffer) => {
                            if slot.set(Arc::new(buffer)).is_ok() {
                                debug!(filename = %locator, "Sound decoded");
                            } else {
                                warn!(filename = %locator, "Sound decoded twice, keeping first buffer");
                            }
                        }
                        Err(err) => error!(filename = %locator, "{err}"),
                    }),
                ),
                Err(err) => error!("{err}"),
            }),
        );
        debug!(%id, filename = %filename, is_music, "Loading sound");
        id
    }

    /// Play a sound from the start, optionally panned (`0.0` left .. `1.0` right).
    ///
    /// Returns `false` without side effects when the sound is unknown or not
    /// decoded yet, when there is no context, when its category is muted, or
    /// when the host cannot start a source. Any previous session's nodes are
    /// abandoned, not disconnected.
    pub fn play(&mut self, id: SoundId, pan: Option<f32>) -> bool {
        let Some(context) = &self.context else {
            return false;
        };
        let Some(sound) = self.sounds.get_mut(id.0) else {
            return false;
        };
        let Some(buffer) = sound.buffer.get().cloned() else {
            return false;
        };

        // A muted category must not interrupt whatever else the user is listening to.
        if self.volumes.is_muted(sound.is_music) {
            debug!(%id, "Category muted, not playing");
            return false;
        }
        let global = self.volumes.get(sound.is_music);

        // Refusals must land before the graph exists.
        if let Err(err) = context.check_start(&buffer) {
            error!(%id, "{err}");
            return false;
        }
        let Some(source) = context.create_buffer_source(buffer) else {
            error!(%id, "{}", AudioError::SourceUnavailable);
            return false;
        };

        let gain_node = context.create_gain();
        let gain_node2 = match pan {
            Some(pan) => {
                let gain_node2 = context.create_gain();
                let splitter = context.create_channel_splitter(2);
                let merger = context.create_channel_merger(2);
                apply_pan(&gain_node, &gain_node2, sound.volume * global, pan);

                // Only the first source channel feeds both sides.
                source.connect(&splitter, 0, 0);
                splitter.connect(&gain_node, 0, 0);
                splitter.connect(&gain_node2, 0, 0);
                gain_node.connect(&merger, 0, 0);
                gain_node2.connect(&merger, 0, 1);
                merger.connect(&context.destination(), 0, 0);
                Some(gain_node2)
            }
            None => {
                gain_node.set_gain(global * sound.volume);
                source.connect(&gain_node, 0, 0);
                gain_node.connect(&context.destination(), 0, 0);
                None
            }
        };

        if let Err(err) = context.start(&source, 0.0) {
            error!(%id, "{err}");
            return false;
        }

        sound.gain_node = Some(gain_node);
        sound.gain_node2 = gain_node2;
        sound.played_at = Some(self.clock.now_ms());
        debug!(%id, ?pan, "Playing sound");
        true
    }

    /// Re-pan a sound whose current session was started with a pan.
    ///
    /// Returns `false` when the sound is unknown or was last played unpanned.
    pub fn change_pan(&self, id: SoundId, pan: f32) -> bool {
        let Some(sound) = self.sounds.get(id.0) else {
            return false;
        };
        let (Some(left), Some(right)) = (&sound.gain_node, &sound.gain_node2) else {
            return false;
        };
        let volume = sound.volume * self.volumes.get(sound.is_music);
        apply_pan(left, right, volume, pan);
        true
    }

    /// Silence a sound and end its session.
    ///
    /// The source keeps running on the host; only its gains drop to zero.
    pub fn stop(&mut self, id: SoundId) -> bool {
        match self.sounds.get_mut(id.0) {
            Some(sound) => {
                silence(sound);
                true
            }
            None => false,
        }
    }

    /// Stop every registered sound, playing or not.
    pub fn stop_all(&mut self) {
        for sound in self.sounds.iter_mut().filter(|sound| sound.registered) {
            silence(sound);
        }
    }

    /// Set a sound's own volume for this and future sessions.
    ///
    /// A live session gets the plain `volume` written into its gain nodes, without
    /// the global volume or the pan law.
    pub fn set_volume(&mut self, id: SoundId, volume: f32) -> bool {
        let Some(sound) = self.sounds.get_mut(id.0) else {
            return false;
        };
        sound.volume = volume;
        if sound.played_at.is_some() {
            for node in sound.gain_node.iter().chain(sound.gain_node2.iter()) {
                node.set_gain(volume);
            }
        }
        true
    }

    /// Global volume of the music (`true`) or non-music (`false`) category.
    pub fn global_volume(&self, is_music: bool) -> f32 {
        self.volumes.get(is_music)
    }

    /// Set the global volume of a category. Applies from the next play or pan change.
    pub fn set_global_volume(&mut self, volume: f32, is_music: bool) {
        self.volumes.set(volume, is_music);
    }

    /// Both global volumes.
    pub fn volumes(&self) -> GlobalVolumes {
        self.volumes
    }

    /// Whether a sound's current session is still within its buffer's duration.
    pub fn is_playing(&self, id: SoundId) -> bool {
        self.sounds
            .get(id.0)
            .map(|sound| sound.is_playing_at(self.clock.now_ms()))
            .unwrap_or(false)
    }

    /// Resume a suspended context and, the first time, unlock every sound.
    ///
    /// Unlocking plays and immediately stops each registered sound that is not
    /// playing, which satisfies hosts that only allow audio started from a user
    /// gesture. Runs the unlock hook afterwards. Returns `true` only for the call
    /// that performed the unlock.
    pub fn unlock_all(&mut self) -> bool {
        let Some(context) = &self.context else {
            return false;
        };
        if context.state() == ContextState::Suspended {
            debug!("Resuming suspended audio context");
            context.resume();
        }
        if self.unlocked || !self.sounds.iter().any(|sound| sound.registered) {
            return false;
        }

        self.unlocked = true;
        for index in 0..self.sounds.len() {
            let id = SoundId(index);
            if self.sounds[index].registered && !self.is_playing(id) {
                self.play(id, None);
                self.stop(id);
            }
        }
        debug!(sounds = self.sounds.len(), "Audio unlocked");

        if let Some(callback) = self.on_unlocked.take() {
            callback();
        }
        true
    }

    /// Look up a sound.
    pub fn sound(&self, id: SoundId) -> Option<&Sound<B::Context>> {
        self.sounds.get(id.0)
    }

    /// Every sound in load order.
    pub fn sounds(&self) -> impl Iterator<Item = (SoundId, &Sound<B::Context>)> {
        self.sounds
            .iter()
            .enumerate()
            .map(|(index, sound)| (SoundId(index), sound))
    }

    /// The current audio context, if any.
    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    /// The host backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the one-time unlock already happened.
    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Whether host events are being handled.
    pub fn is_listening(&self) -> bool {
        self.listening
    }
}

fn apply_pan<N: AudioNode>(left: &N, right: &N, volume: f32, pan: f32) {
    let gains = PanGains::new(pan).scaled(volume);
    left.set_gain(gains.left);
    right.set_gain(gains.right);
}

fn silence<C: AudioContext>(sound: &mut Sound<C>) {
    sound.played_at = None;
    for node in sound.gain_node.iter().chain(sound.gain_node2.iter()) {
        node.set_gain(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NoAudio;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_load_without_context() {
        let mut manager = SoundManager::new(NoAudio);
        let id = manager.load("a.mp3", false);

        let sound = manager.sound(id).unwrap();
        assert_eq!(sound.filename(), "a.mp3");
        assert_eq!(sound.volume(), 1.0);
        assert!(!sound.is_loaded());
        assert!(!sound.is_registered());
        assert!(!manager.play(id, None));
        assert!(!manager.is_playing(id));
    }

    #[test]
    fn test_unknown_sound_is_noop() {
        let mut manager = SoundManager::new(NoAudio);
        let missing = SoundId(7);
        assert!(!manager.play(missing, Some(0.5)));
        assert!(!manager.change_pan(missing, 0.5));
        assert!(!manager.stop(missing));
        assert!(!manager.set_volume(missing, 0.5));
        assert!(!manager.is_playing(missing));
    }

    #[test]
    fn test_stop_and_set_volume_before_play() {
        let mut manager = SoundManager::new(NoAudio);
        let id = manager.load("a.mp3", true);

        assert!(manager.stop(id));
        assert!(manager.set_volume(id, 0.3));
        let sound = manager.sound(id).unwrap();
        assert_eq!(sound.volume(), 0.3);
        assert!(sound.gain_node().is_none());
        assert!(sound.played_at().is_none());
    }

    #[test]
    fn test_global_volumes_are_independent() {
        let mut manager = SoundManager::new(NoAudio);
        manager.set_global_volume(0.2, true);
        assert_eq!(manager.global_volume(true), 0.2);
        assert_eq!(manager.global_volume(false), 1.0);

        manager.set_global_volume(0.7, false);
        assert_eq!(manager.global_volume(true), 0.2);
        assert_eq!(manager.global_volume(false), 0.7);
    }

    #[test]
    fn test_unlock_requires_context() {
        let mut manager = SoundManager::new(NoAudio);
        let called = Rc::new(Cell::new(false));
        let flag = Rc::clone(&called);
        manager.set_on_unlocked(move || flag.set(true));
        manager.setup();
        manager.load("a.mp3", false);

        manager.handle_event(HostEvent::MouseUp);
        assert!(!manager.is_unlocked());
        assert!(!called.get());
    }

    #[test]
    fn test_setup_and_teardown_toggle_listening() {
        let mut manager = SoundManager::new(NoAudio);
        assert!(!manager.is_listening());
        manager.setup();
        assert!(manager.is_listening());
        assert!(manager.context().is_none());
        manager.teardown();
        assert!(!manager.is_listening());
    }
}
