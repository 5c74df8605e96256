//! End-to-end scenarios for the registry and the playback state machine,
//! driven with a scripted plugin and a simulated audio-thread cadence.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use chipdeck_common::{
    DecodeError, DecoderPlugin, Notification, OpenError, PlayStatus, SetupError, TextCatalog,
};
use chipdeck_playback::{NullSink, PlaybackEngine, PluginRegistry};

// ============================================================================
// Scripted plugin
// ============================================================================

struct FakePlugin {
    name: &'static str,
    extensions: &'static [&'static str],
    fail_setup: bool,
    /// Tracks reported once open.
    tracks: usize,
    /// Blocks decoded per track before the stream ends naturally.
    blocks_per_track: usize,
    /// When set, decode fails with this message instead of ending.
    decode_failure: Option<&'static str>,

    open: AtomicBool,
    current: AtomicUsize,
    blocks_left: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
    decode_calls: AtomicUsize,
}

impl FakePlugin {
    fn new(name: &'static str, extensions: &'static [&'static str], tracks: usize) -> FakePlugin {
        FakePlugin {
            name,
            extensions,
            fail_setup: false,
            tracks,
            blocks_per_track: 4,
            decode_failure: None,
            open: AtomicBool::new(false),
            current: AtomicUsize::new(0),
            blocks_left: AtomicUsize::new(0),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            decode_calls: AtomicUsize::new(0),
        }
    }

    fn failing_setup(mut self) -> FakePlugin {
        self.fail_setup = true;
        self
    }

    fn failing_decode(mut self, message: &'static str) -> FakePlugin {
        self.decode_failure = Some(message);
        self
    }
}

impl DecoderPlugin for FakePlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> String {
        "fake 1.0".to_string()
    }

    fn supported_extensions(&self) -> &[&str] {
        self.extensions
    }

    fn setup(&self) -> Result<(), SetupError> {
        if self.fail_setup {
            Err(SetupError::EngineInit("scripted setup failure".into()))
        } else {
            Ok(())
        }
    }

    fn open(&self, data: &[u8]) -> Result<(), OpenError> {
        if data.starts_with(b"BAD") {
            return Err(OpenError::Format("scripted bad header".into()));
        }
        self.open.store(true, Ordering::SeqCst);
        self.current.store(1, Ordering::SeqCst);
        self.blocks_left.store(self.blocks_per_track, Ordering::SeqCst);
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
        self.current.store(0, Ordering::SeqCst);
    }

    fn decode(&self, out: &mut [i16]) -> Result<bool, DecodeError> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.decode_failure {
            return Err(DecodeError(message.into()));
        }
        out.fill(1);
        let left = self.blocks_left.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(false);
        }
        self.blocks_left.store(left - 1, Ordering::SeqCst);
        Ok(true)
    }

    fn current_track(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    fn track_count(&self) -> usize {
        if self.open.load(Ordering::SeqCst) {
            self.tracks
        } else {
            0
        }
    }

    fn set_subsong(&self, track: usize) {
        if self.open.load(Ordering::SeqCst) && track >= 1 && track <= self.tracks {
            self.current.store(track, Ordering::SeqCst);
            self.blocks_left.store(self.blocks_per_track, Ordering::SeqCst);
        }
    }

    fn render_settings(&self) -> String {
        format!("{} settings", self.name)
    }
}

// ============================================================================
// Harness
// ============================================================================

type Events = Rc<RefCell<Vec<Notification>>>;

fn engine_with(plugins: Vec<Arc<dyn DecoderPlugin>>) -> (PlaybackEngine, Events) {
    let (registry, _configured) = PluginRegistry::configure(plugins);
    let events: Events = Rc::new(RefCell::new(Vec::new()));
    let sink_events = Rc::clone(&events);
    let engine = PlaybackEngine::new(
        Arc::new(registry),
        Box::new(NullSink),
        Arc::new(TextCatalog::default()),
        Box::new(move |n| sink_events.borrow_mut().push(n)),
    )
    .expect("null sink always arms");
    (engine, events)
}

fn drain(events: &Events) -> Vec<Notification> {
    events.borrow_mut().drain(..).collect()
}

fn expect_state(n: &Notification) -> (PlayStatus, usize, usize) {
    match n {
        Notification::PlayStateChanged(s) => (s.status, s.current_track, s.track_count),
        other => panic!("expected PlayStateChanged, got {other:?}"),
    }
}

// ============================================================================
// Registry behavior
// ============================================================================

#[test]
fn registry_excludes_plugins_whose_setup_fails() {
    let (registry, configured) = PluginRegistry::configure(vec![
        Arc::new(FakePlugin::new("good", &[".aaa"], 1)),
        Arc::new(FakePlugin::new("broken", &[".bbb"], 1).failing_setup()),
    ]);

    assert_eq!(registry.plugins().len(), 1);
    assert!(registry.find_by_extension(".aaa").is_some());
    assert!(registry.find_by_extension(".bbb").is_none());

    match configured {
        Notification::RegistryConfigured(infos) => {
            assert_eq!(infos.len(), 1);
            assert_eq!(infos[0].name, "good");
            assert_eq!((infos[0].settings_view)(), "good settings");
        }
        other => panic!("expected RegistryConfigured, got {other:?}"),
    }
}

#[test]
fn extension_lookup_is_case_insensitive_with_registration_order_tie_break() {
    let (registry, _) = PluginRegistry::configure(vec![
        Arc::new(FakePlugin::new("first", &[".mod", ".xyz"], 1)),
        Arc::new(FakePlugin::new("second", &[".xyz"], 1)),
    ]);

    assert_eq!(registry.find_by_extension(".XYZ").unwrap().name(), "first");
    assert_eq!(
        registry.find_for_path(Path::new("/music/SONG.MOD")).unwrap().name(),
        "first"
    );
    let extensions = registry.supported_extensions();
    assert!(extensions.contains(&".mod".to_string()));
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_single_track_load_starts_playing() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("single", &[".one"], 1))]);

    engine.load_file(Path::new("tune.one"), b"data", 1, false);

    let notifications = drain(&events);
    assert_eq!(notifications.len(), 1);
    let (status, track, count) = expect_state(&notifications[0]);
    assert_eq!(status, PlayStatus::Playing);
    assert_eq!((track, count), (1, 1));
    assert_eq!(engine.status(), PlayStatus::Playing);
}

#[test]
fn scenario_next_subsong_walks_to_the_boundary() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("multi", &[".fou"], 4))]);
    engine.load_file(Path::new("tune.fou"), b"data", 1, false);
    drain(&events);

    for expected in [2usize, 3, 4] {
        engine.next_subsong();
        let notifications = drain(&events);
        assert_eq!(notifications.len(), 1);
        let (status, track, count) = expect_state(&notifications[0]);
        assert_eq!(status, PlayStatus::Playing);
        assert_eq!((track, count), (expected, 4));
    }

    engine.next_subsong();
    let notifications = drain(&events);
    assert_eq!(notifications.len(), 1);
    assert!(matches!(notifications[0], Notification::NoNextSubsong));
    assert_eq!(engine.status(), PlayStatus::Playing);
}

#[test]
fn scenario_prev_subsong_at_first_track_is_a_distinguished_no_op() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("multi", &[".fou"], 4))]);
    engine.load_file(Path::new("tune.fou"), b"data", 1, false);
    drain(&events);

    engine.prev_subsong();
    let notifications = drain(&events);
    assert_eq!(notifications.len(), 1);
    assert!(matches!(notifications[0], Notification::NoPrevSubsong));
}

#[test]
fn scenario_corrupt_buffer_emits_one_error_and_stays_no_file() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("single", &[".one"], 1))]);

    engine.load_file(Path::new("garbage.one"), b"BAD data", 1, false);

    let notifications = drain(&events);
    assert_eq!(notifications.len(), 1);
    assert!(matches!(notifications[0], Notification::Error(_)));
    assert_eq!(engine.status(), PlayStatus::NoFile);
}

#[test]
fn scenario_natural_end_stops_only_after_the_mailbox_drain() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("single", &[".one"], 1))]);
    engine.load_file(Path::new("tune.one"), b"data", 1, false);
    drain(&events);

    // Simulated hardware cadence: pump the callback until the stream ends.
    let shared = engine.render_shared();
    let mut block = vec![0i16; 64];
    for _ in 0..8 {
        shared.fill(&mut block);
    }

    // The callback must not have dispatched anything itself.
    assert!(drain(&events).is_empty());
    assert_eq!(engine.status(), PlayStatus::Playing);

    engine.tick();
    let notifications = drain(&events);
    assert_eq!(notifications.len(), 1);
    match &notifications[0] {
        Notification::Stopped { plugin_name, file_path } => {
            assert_eq!(plugin_name, "single");
            assert_eq!(file_path, "tune.one");
        }
        other => panic!("expected Stopped, got {other:?}"),
    }
    assert_eq!(engine.status(), PlayStatus::NoFile);
}

#[test]
fn scenario_load_over_playing_session_leaks_no_intermediate_state() {
    let first = Arc::new(FakePlugin::new("first", &[".aaa"], 1));
    let second = Arc::new(FakePlugin::new("second", &[".bbb"], 1));
    let (mut engine, events) = engine_with(vec![
        Arc::clone(&first) as Arc<dyn DecoderPlugin>,
        Arc::clone(&second) as Arc<dyn DecoderPlugin>,
    ]);

    engine.load_file(Path::new("a.aaa"), b"data", 1, false);
    drain(&events);

    engine.load_file(Path::new("b.bbb"), b"data", 1, false);
    let notifications = drain(&events);

    // Exactly one state change for B; no Stopped/NoFile leaked for A.
    assert_eq!(notifications.len(), 1);
    match &notifications[0] {
        Notification::PlayStateChanged(state) => {
            assert_eq!(state.plugin_name, "second");
            assert_eq!(state.status, PlayStatus::Playing);
        }
        other => panic!("expected PlayStateChanged, got {other:?}"),
    }
    assert_eq!(first.closes.load(Ordering::SeqCst), 1);
    assert_eq!(second.opens.load(Ordering::SeqCst), 1);
    assert_eq!(first.opens.load(Ordering::SeqCst), 1);
}

// ============================================================================
// State machine edges
// ============================================================================

#[test]
fn pause_and_play_transition_only_from_their_source_states() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("single", &[".one"], 1))]);

    // NoFile: both are no-ops, no notifications.
    engine.play();
    engine.pause();
    assert!(drain(&events).is_empty());

    engine.load_file(Path::new("tune.one"), b"data", 1, false);
    drain(&events);

    // Playing: play is a no-op.
    engine.play();
    assert!(drain(&events).is_empty());

    engine.pause();
    let (status, _, _) = expect_state(&drain(&events)[0]);
    assert_eq!(status, PlayStatus::Paused);

    // Paused: pause is a no-op.
    engine.pause();
    assert!(drain(&events).is_empty());

    engine.play();
    let (status, _, _) = expect_state(&drain(&events)[0]);
    assert_eq!(status, PlayStatus::Playing);
}

#[test]
fn start_paused_session_keeps_the_sink_muted() {
    let plugin = Arc::new(FakePlugin::new("single", &[".one"], 1));
    let (mut engine, events) = engine_with(vec![Arc::clone(&plugin) as Arc<dyn DecoderPlugin>]);

    engine.load_file(Path::new("tune.one"), b"data", 1, true);
    let (status, _, _) = expect_state(&drain(&events)[0]);
    assert_eq!(status, PlayStatus::Paused);

    // A muted callback never reaches the plugin.
    let shared = engine.render_shared();
    let mut block = vec![0i16; 64];
    shared.fill(&mut block);
    assert_eq!(plugin.decode_calls.load(Ordering::SeqCst), 0);
    assert!(block.iter().all(|&s| s == 0));
}

#[test]
fn decode_error_is_caught_at_the_callback_and_forces_a_stop() {
    let plugin = Arc::new(FakePlugin::new("single", &[".one"], 1).failing_decode("engine died"));
    let (mut engine, events) = engine_with(vec![Arc::clone(&plugin) as Arc<dyn DecoderPlugin>]);
    engine.load_file(Path::new("tune.one"), b"data", 1, false);
    drain(&events);

    let shared = engine.render_shared();
    let mut block = vec![0i16; 64];
    shared.fill(&mut block);
    // Halted: further callbacks are silent and decode is not retried.
    shared.fill(&mut block);
    assert_eq!(plugin.decode_calls.load(Ordering::SeqCst), 1);

    engine.tick();
    let notifications = drain(&events);
    assert_eq!(notifications.len(), 1);
    match &notifications[0] {
        Notification::Error(message) => assert!(message.contains("engine died")),
        other => panic!("expected Error, got {other:?}"),
    }
    assert_eq!(engine.status(), PlayStatus::NoFile);
    assert_eq!(plugin.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn unmatched_extension_is_a_defensive_no_op() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("single", &[".one"], 1))]);

    engine.load_file(Path::new("file.wav"), b"data", 1, false);
    assert!(drain(&events).is_empty());
    assert_eq!(engine.status(), PlayStatus::NoFile);
}

#[test]
fn stop_notifies_with_the_previous_session() {
    let (mut engine, events) =
        engine_with(vec![Arc::new(FakePlugin::new("single", &[".one"], 1))]);
    engine.load_file(Path::new("tune.one"), b"data", 1, false);
    drain(&events);

    engine.stop();
    let notifications = drain(&events);
    assert_eq!(notifications.len(), 1);
    assert!(matches!(notifications[0], Notification::Stopped { .. }));
    assert_eq!(engine.status(), PlayStatus::NoFile);

    // Stop without a session is a no-op.
    engine.stop();
    assert!(drain(&events).is_empty());
}

#[test]
fn subsong_switch_while_paused_stays_muted() {
    let plugin = Arc::new(FakePlugin::new("multi", &[".fou"], 4));
    let (mut engine, events) = engine_with(vec![Arc::clone(&plugin) as Arc<dyn DecoderPlugin>]);
    engine.load_file(Path::new("tune.fou"), b"data", 1, true);
    drain(&events);

    engine.next_subsong();
    let (status, track, _) = expect_state(&drain(&events)[0]);
    assert_eq!(status, PlayStatus::Paused);
    assert_eq!(track, 2);

    let shared = engine.render_shared();
    let mut block = vec![0i16; 64];
    shared.fill(&mut block);
    assert_eq!(plugin.decode_calls.load(Ordering::SeqCst), 0);
}
