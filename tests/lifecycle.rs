use gaudio_audio::{AudioNode, ContextState, HostEvent};
use gaudio_testkit::{FakeBackend, FakeHost, GraphEvent, JsonlSink};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn setup_creates_initial_context() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    assert!(audio.context().is_none());

    audio.setup();
    assert!(audio.context().is_some());
    assert!(audio.is_listening());
    assert_eq!(host.backend.contexts_created(), 1);
}

#[test]
fn missing_capability_degrades_silently() {
    let host = FakeHost::with_backend(FakeBackend::unavailable());
    let mut audio = host.manager();
    audio.setup();
    assert!(audio.context().is_none());

    let id = audio.load("a.mp3", false);
    assert!(host.fetcher.pending().is_empty());
    assert!(!audio.sound(id).unwrap().is_registered());
    assert!(!audio.play(id, None));
    assert!(!audio.unlock_all());
}

#[test]
fn events_are_ignored_before_setup() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.make_context();
    host.load_ready(&mut audio, "a.mp3", false, 1_000);

    audio.handle_event(HostEvent::TouchEnd);
    assert!(!audio.is_unlocked());
    audio.handle_event(HostEvent::VisibilityChange { hidden: false });
    assert_eq!(host.backend.contexts_created(), 1);
}

#[test]
fn gesture_unlocks_once_with_silent_blip() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    audio.set_on_unlocked(move || counter.set(counter.get() + 1));
    audio.setup();

    let ready = host.load_ready(&mut audio, "a.mp3", false, 1_000);
    let pending = audio.load("b.mp3", false);

    audio.handle_event(HostEvent::MouseUp);
    assert!(audio.is_unlocked());
    assert_eq!(calls.get(), 1);

    // The decoded sound was played and stopped at once; the other could not play.
    assert_eq!(host.backend.started().len(), 1);
    let sound = audio.sound(ready).unwrap();
    assert_eq!(sound.gain_node().unwrap().gain(), Some(0.0));
    assert!(!audio.is_playing(ready));
    assert!(audio.sound(pending).unwrap().gain_node().is_none());

    audio.handle_event(HostEvent::TouchEnd);
    assert!(!audio.unlock_all());
    assert_eq!(calls.get(), 1);
    assert_eq!(host.backend.started().len(), 1);
}

#[test]
fn unlock_skips_playing_sounds() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.setup();
    let music = host.load_ready(&mut audio, "theme.ogg", true, 60_000);
    assert!(audio.play(music, None));

    assert!(audio.unlock_all());
    assert!(audio.is_playing(music));
    assert_eq!(host.backend.started().len(), 1);
}

#[test]
fn unlock_waits_for_a_registered_sound() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    let called = Rc::new(Cell::new(false));
    let flag = Rc::clone(&called);
    audio.set_on_unlocked(move || flag.set(true));
    audio.setup();

    assert!(!audio.unlock_all());
    assert!(!audio.is_unlocked());
    assert!(!called.get());

    audio.load("a.mp3", false);
    assert!(audio.unlock_all());
    assert!(called.get());
}

#[test]
fn gesture_resumes_suspended_context() {
    let backend = FakeBackend::new();
    backend.set_initial_state(ContextState::Suspended);
    let host = FakeHost::with_backend(backend);
    let mut audio = host.manager();
    audio.setup();

    audio.handle_event(HostEvent::TouchEnd);
    assert_eq!(host.backend.resume_count(0), 1);
    assert_eq!(host.backend.context_state(0), Some(ContextState::Running));

    // Resuming is not limited to the first unlock.
    host.backend.set_context_state(0, ContextState::Suspended);
    audio.handle_event(HostEvent::MouseUp);
    assert_eq!(host.backend.resume_count(0), 2);
}

#[test]
fn hiding_stops_every_sound() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.setup();
    let a = host.load_ready(&mut audio, "a.mp3", false, 10_000);
    let b = host.load_ready(&mut audio, "b.mp3", true, 10_000);
    assert!(audio.play(a, None));
    assert!(audio.play(b, Some(0.9)));

    audio.handle_event(HostEvent::VisibilityChange { hidden: true });
    assert!(!audio.is_playing(a));
    assert!(!audio.is_playing(b));
    assert_eq!(
        audio.sound(b).unwrap().pan_node().unwrap().gain(),
        Some(0.0)
    );
}

#[test]
fn showing_recreates_context() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.setup();
    let id = host.load_ready(&mut audio, "a.mp3", false, 10_000);

    audio.handle_event(HostEvent::VisibilityChange { hidden: true });
    audio.handle_event(HostEvent::VisibilityChange { hidden: false });
    assert_eq!(host.backend.contexts_created(), 2);

    // Buffers decoded earlier still play on the new context.
    assert!(audio.play(id, None));
    let gain = audio.sound(id).unwrap().gain_node().unwrap().clone();
    assert_eq!(gain.context(), 1);
}

#[test]
fn failed_recreation_keeps_old_context() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.setup();
    host.backend.set_available(false);

    audio.make_context();
    assert!(audio.context().is_some());
    assert_eq!(host.backend.contexts_created(), 1);
}

#[test]
fn stop_all_after_context_replacement_reaches_old_nodes() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.setup();
    let id = host.load_ready(&mut audio, "a.mp3", false, 10_000);
    assert!(audio.play(id, None));

    audio.make_context();
    audio.stop_all();
    let gain = audio.sound(id).unwrap().gain_node().unwrap().clone();
    assert_eq!(gain.context(), 0);
    assert_eq!(gain.gain(), Some(0.0));
}

#[test]
fn stop_all_skips_sounds_loaded_without_context() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    let orphan = audio.load("early.mp3", false);
    audio.setup();
    let id = host.load_ready(&mut audio, "a.mp3", false, 10_000);
    assert!(audio.play(id, None));

    audio.stop_all();
    assert!(!audio.is_playing(id));
    assert!(!audio.sound(orphan).unwrap().is_registered());
    assert_eq!(audio.sounds().count(), 2);
}

#[test]
fn teardown_stops_and_releases_context() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.setup();
    let id = host.load_ready(&mut audio, "a.mp3", false, 10_000);
    assert!(audio.play(id, None));

    audio.teardown();
    assert!(audio.context().is_none());
    assert!(!audio.is_listening());
    assert!(!audio.is_playing(id));
    assert!(!audio.play(id, None));

    audio.handle_event(HostEvent::VisibilityChange { hidden: false });
    assert_eq!(host.backend.contexts_created(), 1);

    audio.setup();
    assert!(audio.play(id, None));
}

#[test]
fn managers_are_isolated() {
    let first = FakeHost::new();
    let second = FakeHost::new();
    let mut a = first.manager();
    let mut b = second.manager();
    a.setup();
    b.setup();
    a.set_global_volume(0.1, true);
    first.load_ready(&mut a, "a.mp3", false, 100);

    assert_eq!(b.global_volume(true), 1.0);
    assert_eq!(b.sounds().count(), 0);
}

#[test]
fn graph_log_can_be_written() {
    let host = FakeHost::new();
    let mut audio = host.manager();
    audio.setup();
    let id = host.load_ready(&mut audio, "a.mp3", false, 100);
    assert!(audio.play(id, Some(0.5)));

    let events = host.backend.events();
    assert!(matches!(events[0], GraphEvent::ContextCreated { context: 0 }));
    assert!(matches!(
        events.last(),
        Some(GraphEvent::Started { offset, .. }) if *offset == 0.0
    ));

    let path = std::env::temp_dir().join(format!("gaudio-graph-{}.jsonl", std::process::id()));
    let mut sink = JsonlSink::create(&path).expect("sink create");
    let written = sink.write_all(&host.backend).expect("write succeeds");
    assert_eq!(written, events.len());

    let lines: Vec<serde_json::Value> = std::fs::read_to_string(&path)
        .expect("log readable")
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json"))
        .collect();
    assert_eq!(lines.len(), events.len());
    assert_eq!(lines[0]["event"], "context_created");
}
