use bevy::{
    color::palettes::css::WHITE,
    diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin},
    prelude::*,
};

use track_demos::session::Session;

use crate::DemoState;

pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_hud)
            .add_systems(Update, (update_fps_counter, update_race_hud))
            .add_systems(OnEnter(DemoState::Victory), spawn_victory_modal)
            .add_systems(
                Update,
                dismiss_victory_modal.run_if(in_state(DemoState::Victory)),
            )
            .add_systems(OnExit(DemoState::Victory), despawn_victory_modal);
    }
}

#[derive(Component)]
struct FpsCounterText;
#[derive(Component)]
struct SpeedText;
#[derive(Component)]
struct LapText;
#[derive(Component)]
struct VictoryModal;
#[derive(Component)]
struct ContinueButton;

const PANEL_BG: Color = Color::srgba(0.0, 0.0, 0.0, 0.55);
const MODAL_SHADE: Color = Color::srgba(0.0, 0.0, 0.0, 0.6);
const MODAL_BG: Color = Color::srgba(0.08, 0.08, 0.12, 0.92);
const BTN_BG: Color = Color::srgb(0.15, 0.55, 0.2);
const TEXT_COLOR: Color = Color::srgb(0.9, 0.9, 0.9);

fn px(val: f32) -> Val {
    Val::Px(val)
}

fn text_font(size: f32) -> TextFont {
    TextFont {
        font_size: size,
        ..default()
    }
}

fn setup_hud(mut commands: Commands, session: Res<Session>) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            top: px(8.0),
            left: px(8.0),
            padding: UiRect::axes(px(8.0), px(4.0)),
            ..default()
        },
        BackgroundColor(PANEL_BG),
        Text::new("FPS: --"),
        text_font(18.0),
        TextColor(WHITE.into()),
        FpsCounterText,
    ));

    // Speed and lap readouts only exist for demos that count laps.
    if session.setup().laps.is_none() {
        return;
    }

    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                top: px(8.0),
                right: px(8.0),
                flex_direction: FlexDirection::Column,
                padding: UiRect::axes(px(10.0), px(6.0)),
                row_gap: px(4.0),
                ..default()
            },
            BackgroundColor(PANEL_BG),
        ))
        .with_children(|panel| {
            panel.spawn((
                Text::new("Speed: 0.00"),
                text_font(20.0),
                TextColor(TEXT_COLOR),
                SpeedText,
            ));
            panel.spawn((
                Text::new("Lap: 0"),
                text_font(20.0),
                TextColor(TEXT_COLOR),
                LapText,
            ));
        });
}

fn update_fps_counter(
    diagnostics: Res<DiagnosticsStore>,
    mut query: Query<&mut Text, With<FpsCounterText>>,
) {
    let Ok(mut text) = query.single_mut() else {
        return;
    };

    if let Some(fps) = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|value| value.smoothed())
    {
        text.0 = format!("FPS: {fps:>3.0}");
    }
}

fn update_race_hud(
    session: Res<Session>,
    mut speed_query: Query<&mut Text, (With<SpeedText>, Without<LapText>)>,
    mut lap_query: Query<&mut Text, (With<LapText>, Without<SpeedText>)>,
) {
    if !session.is_changed() {
        return;
    }
    let state = session.state();

    if let Ok(mut text) = speed_query.single_mut() {
        text.0 = format!("Speed: {:.2}", state.car.speed);
    }
    if let Ok(mut text) = lap_query.single_mut() {
        text.0 = match session.setup().laps {
            Some(rules) => format!("Lap: {} / {}", state.laps.laps, rules.laps_to_win),
            None => format!("Lap: {}", state.laps.laps),
        };
    }
}

fn spawn_victory_modal(mut commands: Commands, session: Res<Session>) {
    let laps = session
        .setup()
        .laps
        .map(|rules| rules.laps_to_win)
        .unwrap_or_default();

    commands
        .spawn((
            VictoryModal,
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(MODAL_SHADE),
        ))
        .with_children(|shade| {
            shade
                .spawn((
                    Node {
                        flex_direction: FlexDirection::Column,
                        align_items: AlignItems::Center,
                        padding: UiRect::all(px(24.0)),
                        row_gap: px(12.0),
                        ..default()
                    },
                    BackgroundColor(MODAL_BG),
                ))
                .with_children(|dialog| {
                    dialog.spawn((
                        Text::new("You win!"),
                        text_font(36.0),
                        TextColor(TEXT_COLOR),
                    ));
                    dialog.spawn((
                        Text::new(format!("{laps} laps completed")),
                        text_font(18.0),
                        TextColor(TEXT_COLOR),
                    ));
                    dialog
                        .spawn((
                            Button,
                            ContinueButton,
                            Node {
                                padding: UiRect::axes(px(14.0), px(6.0)),
                                justify_content: JustifyContent::Center,
                                align_items: AlignItems::Center,
                                ..default()
                            },
                            BackgroundColor(BTN_BG),
                        ))
                        .with_children(|button| {
                            button.spawn((
                                Text::new("Continue (Enter)"),
                                text_font(16.0),
                                TextColor(TEXT_COLOR),
                            ));
                        });
                });
        });
}

fn dismiss_victory_modal(
    keyboard: Res<ButtonInput<KeyCode>>,
    button_query: Query<&Interaction, (Changed<Interaction>, With<ContinueButton>)>,
    mut next_state: ResMut<NextState<DemoState>>,
) {
    let clicked = button_query
        .iter()
        .any(|interaction| *interaction == Interaction::Pressed);
    let confirmed = keyboard.any_just_pressed([KeyCode::Enter, KeyCode::Space, KeyCode::Escape]);
    if clicked || confirmed {
        next_state.set(DemoState::Driving);
    }
}

fn despawn_victory_modal(mut commands: Commands, modal_query: Query<Entity, With<VictoryModal>>) {
    for entity in &modal_query {
        commands.entity(entity).despawn();
    }
}
