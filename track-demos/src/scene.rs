use std::f32::consts::{PI, TAU};

use bevy::prelude::*;

use track_demos::drive::DriveModel;
use track_demos::track::Track;
use track_demos::session::Session;

use crate::DemoView;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup_camera, setup_track, setup_car))
            .add_systems(Startup, set_view_scale.after(setup_camera))
            .add_systems(Update, (sync_car, follow_car.after(sync_car), spin_track));
    }
}

#[derive(Component)]
struct CarBody;

/// Visual-only rotation applied every frame.
#[derive(Component)]
struct TrackSpin(f32);

const GROUND: Color = Color::srgb(0.2, 0.6, 0.2);
const ASPHALT: Color = Color::srgb(0.3, 0.3, 0.3);
const WALL: Color = Color::srgb(0.55, 0.5, 0.45);
const CAR: Color = Color::srgb(0.9, 0.1, 0.1);
const CAR_NOSE: Color = Color::srgb(0.95, 0.95, 0.95);
const START_ZONE: Color = Color::srgba(1.0, 1.0, 1.0, 0.25);
const SPOKE: Color = Color::srgb(0.1, 0.9, 0.1);

/// Driving-plane y (canvas y, scene z) maps to screen -y.
fn to_screen(point: Vec2) -> Vec2 {
    Vec2::new(point.x, -point.y)
}

/// Screen rotation for a car heading, so the nose points along travel.
fn screen_rotation(drive: &DriveModel, heading: f32) -> Quat {
    match drive {
        // Arrow-key demos ignore heading; "forward" is straight up the screen.
        DriveModel::Axis { .. } => Quat::IDENTITY,
        DriveModel::Heading { .. } => Quat::from_rotation_z(PI + heading),
    }
}

fn setup_camera(mut commands: Commands, session: Res<Session>) {
    let center = to_screen(session.setup().track.center());
    commands.spawn((Camera2d, Transform::from_xyz(center.x, center.y, 0.0)));
}

fn set_view_scale(mut camera_query: Query<&mut Projection, With<Camera2d>>, view: Res<DemoView>) {
    let Ok(mut projection) = camera_query.single_mut() else {
        return;
    };

    if let Projection::Orthographic(ref mut ortho) = *projection {
        ortho.scale = view.0.view_scale;
    }
}

fn setup_track(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    session: Res<Session>,
    view: Res<DemoView>,
) {
    let setup = session.setup();
    let center = to_screen(setup.track.center());
    let ground_size = setup.track.extent() * 3.0;

    commands.spawn((
        Mesh2d(meshes.add(Rectangle::new(ground_size, ground_size))),
        MeshMaterial2d(materials.add(GROUND)),
        Transform::from_xyz(center.x, center.y, -1.0),
    ));

    match &setup.track {
        Track::Ring {
            inner_radius,
            outer_radius,
            ..
        } => {
            let mut ring = commands.spawn((
                Mesh2d(meshes.add(Annulus::new(*inner_radius, *outer_radius))),
                MeshMaterial2d(materials.add(ASPHALT)),
                Transform::from_xyz(center.x, center.y, 0.0),
                TrackSpin(view.0.track_spin),
            ));

            // Radial spokes make the spin visible.
            let spoke_length = outer_radius - inner_radius;
            let spoke_radius = (inner_radius + outer_radius) * 0.5;
            let spoke = meshes.add(Rectangle::new(spoke_length, spoke_length * 0.03));
            let spoke_material = materials.add(SPOKE);
            ring.with_children(|parent| {
                for i in 0..16 {
                    let angle = i as f32 / 16.0 * TAU;
                    parent.spawn((
                        Mesh2d(spoke.clone()),
                        MeshMaterial2d(spoke_material.clone()),
                        Transform::from_xyz(
                            spoke_radius * angle.cos(),
                            spoke_radius * angle.sin(),
                            0.1,
                        )
                        .with_rotation(Quat::from_rotation_z(angle)),
                    ));
                }
            });
        }
        Track::Walled { interior, walls } => {
            commands.spawn((
                Mesh2d(meshes.add(Rectangle::from_size(interior.size()))),
                MeshMaterial2d(materials.add(ASPHALT)),
                Transform::from_xyz(center.x, center.y, 0.0),
            ));

            let wall_material = materials.add(WALL);
            for wall in walls {
                let position = to_screen(Vec2::from(wall.center));
                commands.spawn((
                    Mesh2d(meshes.add(Rectangle::from_size(wall.size()))),
                    MeshMaterial2d(wall_material.clone()),
                    Transform::from_xyz(position.x, position.y, 0.1),
                ));
            }
        }
    }

    if let Some(laps) = &setup.laps {
        let zone = to_screen(Vec2::from(laps.start_zone.center));
        commands.spawn((
            Mesh2d(meshes.add(Rectangle::from_size(laps.start_zone.size()))),
            MeshMaterial2d(materials.add(START_ZONE)),
            Transform::from_xyz(zone.x, zone.y, 0.2),
        ));

        let line = to_screen(Vec2::new(laps.start_zone.center[0], laps.exit_line));
        commands.spawn((
            Mesh2d(meshes.add(Rectangle::new(laps.half_width * 2.0, 0.2))),
            MeshMaterial2d(materials.add(CAR_NOSE)),
            Transform::from_xyz(line.x, line.y, 0.2),
        ));
    }
}

fn setup_car(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    view: Res<DemoView>,
    session: Res<Session>,
) {
    let [width, length] = view.0.car_size;
    let car = session.state().car;
    let position = to_screen(car.position);

    commands
        .spawn((
            Mesh2d(meshes.add(Rectangle::new(width, length))),
            MeshMaterial2d(materials.add(CAR)),
            Transform::from_xyz(position.x, position.y, 1.0)
                .with_rotation(screen_rotation(&session.setup().drive, car.heading)),
            CarBody,
        ))
        .with_children(|parent| {
            parent.spawn((
                Mesh2d(meshes.add(Rectangle::new(width * 0.8, length * 0.2))),
                MeshMaterial2d(materials.add(CAR_NOSE)),
                Transform::from_xyz(0.0, length * 0.35, 0.1),
            ));
        });
}

fn sync_car(session: Res<Session>, mut car_query: Query<&mut Transform, With<CarBody>>) {
    let Ok(mut transform) = car_query.single_mut() else {
        return;
    };

    let car = session.state().car;
    let position = to_screen(car.position);
    transform.translation.x = position.x;
    transform.translation.y = position.y;
    transform.rotation = screen_rotation(&session.setup().drive, car.heading);
}

/// Chase camera: sits over the rig's eye point, turned so the car drives up the screen.
fn follow_car(
    session: Res<Session>,
    mut camera_query: Query<&mut Transform, (With<Camera2d>, Without<CarBody>)>,
) {
    let Some(rig) = session.setup().camera else {
        return;
    };
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let car = session.state().car;
    let eye = to_screen(rig.follow(&car).plane_eye());
    camera_transform.translation.x = eye.x;
    camera_transform.translation.y = eye.y;
    camera_transform.rotation = screen_rotation(&session.setup().drive, car.heading);
}

fn spin_track(mut track_query: Query<(&mut Transform, &TrackSpin)>) {
    for (mut transform, spin) in &mut track_query {
        if spin.0 != 0.0 {
            transform.rotate_z(spin.0);
        }
    }
}
