use std::path::{Path, PathBuf};
use std::time::Duration;

use bevy::{
    diagnostic::FrameTimeDiagnosticsPlugin,
    input::keyboard::{Key, KeyboardInput},
    prelude::*,
    window::WindowFocused,
};
use clap::Parser;
use color_eyre::eyre::eyre;

use track_demos::config::{DemoConfig, Variant, VariantParams};
use track_demos::input::InputLatch;
use track_demos::lap::LapEvent;
use track_demos::session::{InputScript, Session};

mod hud;
mod scene;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Which demo to run.
    #[arg(value_enum, default_value_t = Variant::Circuit)]
    variant: Variant,

    /// TOML file replacing the built-in presets.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run headless against a TOML input script instead of opening a window.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Print the headless run summary as JSON.
    #[arg(long, requires = "script")]
    json: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    dump_config: bool,
}

#[derive(States, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DemoState {
    #[default]
    Driving,
    /// Win modal is up; the simulation is paused until it is dismissed.
    Victory,
}

/// Render hints for the running variant.
#[derive(Resource)]
pub struct DemoView(pub VariantParams);

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => DemoConfig::load(path).map_err(|e| eyre!(e))?,
        None => DemoConfig::default(),
    };
    if cli.dump_config {
        print!("{}", config.to_toml().map_err(|e| eyre!(e))?);
        return Ok(());
    }

    let setup = config.setup(cli.variant).map_err(|e| eyre!(e))?;
    if let Some(script) = &cli.script {
        return run_headless(Session::new(setup), script, cli.json);
    }

    App::new()
        .add_plugins((
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: format!("track-demos: {}", cli.variant.title()),
                    ..default()
                }),
                ..default()
            }),
            FrameTimeDiagnosticsPlugin::default(),
            scene::ScenePlugin,
            hud::HudPlugin,
        ))
        .init_state::<DemoState>()
        .insert_resource(Time::<Fixed>::from_duration(Duration::from_secs_f64(
            1.0 / config.tick_hz,
        )))
        .insert_resource(InputLatch::default())
        .insert_resource(Session::new(setup))
        .insert_resource(DemoView(config.params(cli.variant).clone()))
        // Keyboard latching: always active, the latch is cleared when the win modal opens
        .add_systems(Update, (latch_keyboard, release_on_focus_loss))
        .add_systems(OnEnter(DemoState::Victory), release_all_keys)
        .add_systems(
            FixedUpdate,
            advance_race.run_if(in_state(DemoState::Driving)),
        )
        .run();

    Ok(())
}

fn run_headless(mut session: Session, script_path: &Path, json: bool) -> color_eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "track_demos=info".into()),
        )
        .init();

    let script = InputScript::load(script_path).map_err(|e| eyre!(e))?;
    info!(
        variant = ?session.setup().variant,
        ticks = script.total_ticks(),
        "running input script"
    );
    let summary = session.run_script(&script);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("variant:  {}", summary.variant.title());
        println!("ticks:    {}", summary.ticks);
        println!(
            "position: ({:.3}, {:.3})",
            summary.position[0], summary.position[1]
        );
        println!("heading:  {:.3}", summary.heading);
        println!("speed:    {:.3}", summary.speed);
        println!("laps:     {}", summary.laps);
        println!("resets:   {}", summary.resets);
        println!("wins:     {}", summary.wins);
    }
    Ok(())
}

/// Name a key the way the demos bind it: arrows by name, printable keys by
/// their character.
fn key_name(key: &Key) -> Option<String> {
    let name = match key {
        Key::Character(text) => return Some(text.to_string()),
        Key::ArrowUp => "ArrowUp",
        Key::ArrowDown => "ArrowDown",
        Key::ArrowLeft => "ArrowLeft",
        Key::ArrowRight => "ArrowRight",
        Key::Space => " ",
        Key::Enter => "Enter",
        Key::Escape => "Escape",
        Key::Shift => "Shift",
        _ => return None,
    };
    Some(name.to_string())
}

fn latch_keyboard(
    mut keys: MessageReader<KeyboardInput>,
    mut latch: ResMut<InputLatch>,
    session: Res<Session>,
) {
    let key_case = session.setup().key_case;
    for event in keys.read() {
        if let Some(name) = key_name(&event.logical_key) {
            latch.set_key(key_case.normalize(&name), event.state.is_pressed());
        }
    }
}

// Key-up events that happen while the window is unfocused never arrive.
fn release_on_focus_loss(
    mut focus_events: MessageReader<WindowFocused>,
    mut latch: ResMut<InputLatch>,
) {
    if focus_events.read().any(|event| !event.focused) {
        latch.release_all();
    }
}

fn release_all_keys(mut latch: ResMut<InputLatch>) {
    latch.release_all();
}

fn advance_race(
    mut session: ResMut<Session>,
    latch: Res<InputLatch>,
    mut next_state: ResMut<NextState<DemoState>>,
) {
    // Several fixed ticks can run in one frame; stop once a win is pending.
    if matches!(*next_state, NextState::Pending(DemoState::Victory)) {
        return;
    }

    let report = session.tick(&latch);
    if let Some(LapEvent::Won { .. }) = report.lap {
        next_state.set(DemoState::Victory);
    }
}
