//! Command-line player over the chipdeck plugin subsystem.
//!
//! The CLI stands in for the GUI/browser collaborators: it bootstraps the
//! settings store and text catalog, configures the plugin registry,
//! requests file acquisition from the loader, and runs the control loop
//! that drains the mailboxes and dispatches notifications (here: prints
//! them).

mod args;

use std::io::BufRead;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::warn;

use chipdeck_common::{
    LoadRequest, Notification, PlayStatus, PluginContext, Settings, TextCatalog,
};
use chipdeck_gamemusic::GameMusicPlugin;
use chipdeck_loader::{LoadCoordinator, LoadOutcome};
use chipdeck_playback::{AudioSink, NullSink, PlaybackEngine, PluginRegistry, RodioSink};
use chipdeck_sid::SidPlugin;
use chipdeck_sndh::SndhPlugin;
use chipdeck_tracker::TrackerPlugin;

/// Control-loop tick cadence.
const TICK: Duration = Duration::from_millis(20);

/// Commands read from stdin.
enum Command {
    TogglePause,
    Stop,
    Next,
    Prev,
    Quit,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match args::CliArgs::parse() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}\n\n{}", args::CliArgs::help());
            std::process::exit(2);
        }
    };
    if args.show_help {
        println!("{}", args::CliArgs::help());
        return Ok(());
    }
    let Some(path) = args.path.clone() else {
        println!("{}", args::CliArgs::help());
        return Ok(());
    };

    // Shared read-only context for every plugin.
    let settings = Arc::new(Settings::default());
    if let Some(file) = &args.settings_file {
        let json = std::fs::read_to_string(file)
            .with_context(|| format!("reading settings '{}'", file.display()))?;
        settings
            .load_json(&json)
            .with_context(|| format!("parsing settings '{}'", file.display()))?;
    }
    let catalog = Arc::new(match &args.lang_file {
        Some(file) => TextCatalog::from_file(file)
            .with_context(|| format!("reading catalog '{}'", file.display()))?,
        None => TextCatalog::default(),
    });
    let ctx = PluginContext {
        settings,
        catalog: Arc::clone(&catalog),
        data_dir: args.data_dir.clone(),
    };

    let (registry, configured) = PluginRegistry::configure(vec![
        Arc::new(TrackerPlugin::new(ctx.clone())),
        Arc::new(GameMusicPlugin::new(ctx.clone())),
        Arc::new(SndhPlugin::new(ctx.clone())),
        Arc::new(SidPlugin::new(ctx.clone())),
    ]);
    let registry = Arc::new(registry);
    print_notification(&configured);

    // Real sink when a device exists, silent fallback otherwise.
    let sink: Box<dyn AudioSink> = Box::new(RodioSink::new());
    let engine = PlaybackEngine::new(
        Arc::clone(&registry),
        sink,
        Arc::clone(&catalog),
        Box::new(|n| print_notification(&n)),
    );
    let mut engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            warn!(error = %e, "audio device unavailable, running silent");
            PlaybackEngine::new(
                Arc::clone(&registry),
                Box::new(NullSink),
                Arc::clone(&catalog),
                Box::new(|n| print_notification(&n)),
            )?
        }
    };

    let mut loader = LoadCoordinator::new();
    if path.is_dir() {
        loader.request_listing(path, registry.supported_extensions());
    } else {
        loader.request_load(LoadRequest {
            path,
            start_track: args.start_track,
            start_paused: args.start_paused,
        });
    }

    let commands = spawn_stdin_reader();
    run_control_loop(&mut engine, &mut loader, &commands)?;

    registry.shutdown();
    Ok(())
}

/// Read single-letter commands from stdin on a dedicated thread.
fn spawn_stdin_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let command = match line.trim() {
                "p" => Command::TogglePause,
                "s" => Command::Stop,
                "n" => Command::Next,
                "b" => Command::Prev,
                "q" => Command::Quit,
                "" => continue,
                other => {
                    eprintln!("unknown command '{other}' (p/s/n/b/q)");
                    continue;
                }
            };
            if tx.send(command).is_err() {
                break;
            }
        }
    });
    rx
}

fn run_control_loop(
    engine: &mut PlaybackEngine,
    loader: &mut LoadCoordinator,
    commands: &mpsc::Receiver<Command>,
) -> anyhow::Result<()> {
    let mut file_requested = false;

    loop {
        // Loader outcomes feed the engine; errors surface as printed
        // notifications just like engine errors.
        match loader.poll() {
            Some(LoadOutcome::FileLoaded { request, data }) => {
                file_requested = true;
                engine.load_file(
                    &request.path,
                    &data,
                    request.start_track,
                    request.start_paused,
                );
            }
            Some(LoadOutcome::Listing { path, entries }) => {
                println!("{}:", path.display());
                for entry in entries {
                    let marker = if entry.is_dir { "/" } else { "" };
                    println!("  {}{marker}", entry.name);
                }
                return Ok(());
            }
            Some(LoadOutcome::Failed { path, message }) => {
                bail!("load of '{}' failed: {message}", path.display());
            }
            None => {}
        }

        engine.tick();

        // A finished or errored session ends the run.
        if file_requested && engine.status() == PlayStatus::NoFile {
            return Ok(());
        }

        match commands.try_recv() {
            Ok(Command::TogglePause) => match engine.status() {
                PlayStatus::Playing => engine.pause(),
                PlayStatus::Paused => engine.play(),
                PlayStatus::NoFile => {}
            },
            Ok(Command::Stop) => engine.stop(),
            Ok(Command::Next) => engine.next_subsong(),
            Ok(Command::Prev) => engine.prev_subsong(),
            Ok(Command::Quit) => {
                engine.stop();
                return Ok(());
            }
            Err(mpsc::TryRecvError::Empty) => {}
            Err(mpsc::TryRecvError::Disconnected) => {}
        }

        std::thread::sleep(TICK);
    }
}

fn print_notification(notification: &Notification) {
    match notification {
        Notification::RegistryConfigured(infos) => {
            println!("plugins:");
            for info in infos {
                println!(
                    "  {} {} ({})",
                    info.name,
                    info.version,
                    info.extensions.join(" ")
                );
            }
        }
        Notification::PlayStateChanged(state) => {
            println!(
                "[{:?}] {} - {} (track {}/{})",
                state.status,
                state.plugin_name,
                state.file_path,
                state.current_track,
                state.track_count
            );
        }
        Notification::Stopped {
            plugin_name,
            file_path,
        } => {
            println!("[Stopped] {plugin_name} - {file_path}");
        }
        Notification::NoNextSubsong => println!("(no next sub-song)"),
        Notification::NoPrevSubsong => println!("(no previous sub-song)"),
        Notification::Error(message) => eprintln!("error: {message}"),
    }
}
