//! Plugin-contract tests for the tracker adapter.

use chipdeck_common::{DecoderPlugin, OpenError, PluginContext};
use chipdeck_tracker::TrackerPlugin;

const HEADER_LEN: usize = 1084;

fn module_fixture() -> Vec<u8> {
    let mut data = vec![0u8; HEADER_LEN + 1024];
    data[..9].copy_from_slice(b"fixture 1");
    data[20 + 25] = 48; // sample 1 default volume
    data[950] = 1;
    data[1080..1084].copy_from_slice(b"M.K.");
    data[HEADER_LEN] = 0x11; // C-2, sample 1
    data[HEADER_LEN + 1] = 0xAC;
    data
}

fn plugin() -> TrackerPlugin {
    let plugin = TrackerPlugin::new(PluginContext::new("data"));
    plugin.setup().expect("tracker setup is stateless");
    plugin
}

#[test]
fn reports_identity_and_extensions() {
    let plugin = plugin();
    assert_eq!(plugin.name(), "tracker");
    assert!(plugin.version().starts_with("modplay"));
    assert_eq!(plugin.supported_extensions(), &[".mod", ".nst"]);
}

#[test]
fn open_reports_single_track() {
    let plugin = plugin();
    plugin.open(&module_fixture()).unwrap();
    assert_eq!(plugin.current_track(), 1);
    assert_eq!(plugin.track_count(), 1);
}

#[test]
fn close_resets_track_counters() {
    let plugin = plugin();
    plugin.open(&module_fixture()).unwrap();
    plugin.close();
    assert_eq!(plugin.current_track(), 0);
    assert_eq!(plugin.track_count(), 0);
}

#[test]
fn close_is_idempotent() {
    let plugin = plugin();
    plugin.close();
    plugin.close();
    assert_eq!(plugin.track_count(), 0);

    plugin.open(&module_fixture()).unwrap();
    plugin.close();
    plugin.close();
    assert_eq!(plugin.track_count(), 0);
}

#[test]
fn reopen_after_close_works() {
    let plugin = plugin();
    for _ in 0..3 {
        plugin.open(&module_fixture()).unwrap();
        assert_eq!(plugin.track_count(), 1);
        plugin.close();
    }
}

#[test]
fn garbage_is_a_format_error() {
    let plugin = plugin();
    let err = plugin.open(&[0u8; 64]).unwrap_err();
    assert!(matches!(err, OpenError::Format(_)));
    assert_eq!(plugin.track_count(), 0);
}

#[test]
fn wrong_signature_is_a_format_error() {
    let plugin = plugin();
    let mut data = module_fixture();
    data[1080..1084].copy_from_slice(b"8CHN");
    assert!(matches!(plugin.open(&data), Err(OpenError::Format(_))));
}

#[test]
fn truncated_patterns_are_a_load_error() {
    let plugin = plugin();
    let data = &module_fixture()[..HEADER_LEN + 100];
    assert!(matches!(plugin.open(data), Err(OpenError::Load(_))));
}

#[test]
fn decode_produces_audio_until_closed() {
    let plugin = plugin();
    plugin.open(&module_fixture()).unwrap();

    let mut block = vec![0i16; 4096];
    assert!(plugin.decode(&mut block).unwrap());
    assert!(block.iter().any(|&s| s != 0));

    plugin.close();
    assert!(!plugin.decode(&mut block).unwrap());
}

#[test]
fn out_of_range_subsong_is_a_no_op() {
    let plugin = plugin();
    plugin.open(&module_fixture()).unwrap();
    plugin.set_subsong(0);
    plugin.set_subsong(2);
    plugin.set_subsong(99);
    assert_eq!(plugin.current_track(), 1);
    assert_eq!(plugin.track_count(), 1);
}
