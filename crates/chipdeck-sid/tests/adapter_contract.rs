//! Plugin-contract tests for the SID adapter.

use std::sync::Arc;

use chipdeck_common::{DecoderPlugin, OpenError, PluginContext, SetupError, Settings, TextCatalog};
use chipdeck_sid::sidcore::{BASIC_LEN, CHARGEN_LEN, KERNAL_LEN};
use chipdeck_sid::{
    SidPlugin, FORCE_FIRST_TRACK_SETTING, REQUIRE_ROMS_SETTING, SAMPLING_METHOD_SETTING,
};

fn psid_fixture(songs: u16, start: u16) -> Vec<u8> {
    let mut data = vec![0u8; 128];
    data[0..4].copy_from_slice(b"PSID");
    data[4..6].copy_from_slice(&2u16.to_be_bytes());
    data[10..12].copy_from_slice(&0x1000u16.to_be_bytes());
    data[12..14].copy_from_slice(&0x1003u16.to_be_bytes());
    data[14..16].copy_from_slice(&songs.to_be_bytes());
    data[16..18].copy_from_slice(&start.to_be_bytes());
    data[22..29].copy_from_slice(b"Fixture");
    data[54..60].copy_from_slice(b"Nobody");
    data
}

fn context(configure: impl FnOnce(&Settings)) -> (tempfile::TempDir, PluginContext) {
    let dir = tempfile::tempdir().unwrap();
    let settings = Arc::new(Settings::default());
    configure(&settings);
    let ctx = PluginContext {
        settings,
        catalog: Arc::new(TextCatalog::default()),
        data_dir: dir.path().to_path_buf(),
    };
    (dir, ctx)
}

fn write_roms(dir: &std::path::Path) {
    std::fs::write(dir.join("kernal.bin"), vec![0u8; KERNAL_LEN]).unwrap();
    std::fs::write(dir.join("basic.bin"), vec![0u8; BASIC_LEN]).unwrap();
    std::fs::write(dir.join("chargen.bin"), vec![0u8; CHARGEN_LEN]).unwrap();
}

#[test]
fn setup_without_roms_degrades_by_default() {
    let (_dir, ctx) = context(|_| {});
    let plugin = SidPlugin::new(ctx);
    plugin.setup().expect("lenient ROM policy is the default");

    plugin.open(&psid_fixture(1, 1)).unwrap();
    assert!(plugin.render_stats().contains("degraded"));
}

#[test]
fn setup_without_roms_fails_in_strict_mode() {
    let (_dir, ctx) = context(|s| s.set_bool(REQUIRE_ROMS_SETTING, true));
    let plugin = SidPlugin::new(ctx);
    assert!(matches!(
        plugin.setup(),
        Err(SetupError::MissingResource { .. })
    ));
}

#[test]
fn setup_with_full_rom_set_reports_full_emulation() {
    let (dir, ctx) = context(|s| s.set_bool(REQUIRE_ROMS_SETTING, true));
    write_roms(dir.path());
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();

    plugin.open(&psid_fixture(2, 1)).unwrap();
    assert!(plugin.render_stats().contains("full"));
}

#[test]
fn unknown_sampling_method_fails_setup() {
    let (_dir, ctx) = context(|s| s.set_str(SAMPLING_METHOD_SETTING, "nearest"));
    let plugin = SidPlugin::new(ctx);
    assert!(matches!(plugin.setup(), Err(SetupError::EngineInit(_))));
}

#[test]
fn open_starts_on_the_default_tune() {
    let (_dir, ctx) = context(|_| {});
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();

    plugin.open(&psid_fixture(10, 4)).unwrap();
    assert_eq!(plugin.current_track(), 4);
    assert_eq!(plugin.track_count(), 10);
}

#[test]
fn force_first_track_overrides_the_default_tune() {
    let (_dir, ctx) = context(|s| s.set_bool(FORCE_FIRST_TRACK_SETTING, true));
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();

    plugin.open(&psid_fixture(10, 4)).unwrap();
    assert_eq!(plugin.current_track(), 1);
}

#[test]
fn track_zero_selects_the_default_tune() {
    let (_dir, ctx) = context(|_| {});
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();

    plugin.open(&psid_fixture(10, 4)).unwrap();
    plugin.set_subsong(7);
    assert_eq!(plugin.current_track(), 7);
    plugin.set_subsong(0);
    assert_eq!(plugin.current_track(), 4);
}

#[test]
fn out_of_range_subsong_is_a_no_op() {
    let (_dir, ctx) = context(|_| {});
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();

    plugin.open(&psid_fixture(3, 2)).unwrap();
    plugin.set_subsong(4);
    assert_eq!(plugin.current_track(), 2);
}

#[test]
fn close_resets_track_counters_and_is_idempotent() {
    let (_dir, ctx) = context(|_| {});
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();

    plugin.open(&psid_fixture(3, 1)).unwrap();
    plugin.close();
    plugin.close();
    assert_eq!(plugin.current_track(), 0);
    assert_eq!(plugin.track_count(), 0);
}

#[test]
fn garbage_is_a_format_error() {
    let (_dir, ctx) = context(|_| {});
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();

    assert!(matches!(plugin.open(&[0u8; 20]), Err(OpenError::Format(_))));
    assert!(matches!(
        plugin.open(&[0xFFu8; 200]),
        Err(OpenError::Format(_))
    ));
    assert_eq!(plugin.track_count(), 0);
}

#[test]
fn decode_never_ends_while_open() {
    let (_dir, ctx) = context(|_| {});
    let plugin = SidPlugin::new(ctx);
    plugin.setup().unwrap();
    plugin.open(&psid_fixture(1, 1)).unwrap();

    let mut block = vec![0i16; 4_096];
    for _ in 0..20 {
        assert!(plugin.decode(&mut block).unwrap());
    }
    assert!(block.iter().any(|&s| s != 0));

    plugin.close();
    assert!(!plugin.decode(&mut block).unwrap());
}

#[test]
fn concurrent_decode_and_subsong_switching_stay_consistent() {
    let (_dir, ctx) = context(|_| {});
    let plugin = Arc::new(SidPlugin::new(ctx));
    plugin.setup().unwrap();
    plugin.open(&psid_fixture(8, 1)).unwrap();

    let decoder = {
        let plugin = Arc::clone(&plugin);
        std::thread::spawn(move || {
            let mut block = vec![0i16; 4_096];
            for _ in 0..200 {
                plugin.decode(&mut block).unwrap();
            }
        })
    };

    for i in 0..200usize {
        plugin.set_subsong(i % 8 + 1);
        let track = plugin.current_track();
        assert!((1..=8).contains(&track), "track {track} out of range");
        assert_eq!(plugin.track_count(), 8);
    }
    decoder.join().unwrap();
}
