//! KNOWLEDGE GARDEN - Answer polls, grow plants!
//! Desktop companion for the EnGauge classroom polling backend.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use rand::Rng;
use tokio::runtime::Runtime;

mod api;
mod effects;
mod garden;
mod poll;
mod state;
mod store;

// SETTINGS
pub const WINDOW_WIDTH: f32 = 1280.0;
pub const WINDOW_HEIGHT: f32 = 720.0;

// COLORS
const BG_COLOR: Color = Color::srgb(0.05, 0.08, 0.06);

// Resources
#[derive(Resource, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum View {
    #[default]
    Poll,
    Garden,
}

#[derive(Resource)]
pub struct TokioRuntime(pub Runtime);

#[derive(Resource)]
pub struct SessionId(pub String);

/// Gates the developer keyboard shortcuts on the garden screen.
#[derive(Resource)]
pub struct DebugMode(pub bool);

/// Rebuild request for a screen, fired on startup, on Tab switches and
/// after a garden reset.
#[derive(Event)]
pub struct BuildView(pub View);

#[derive(Component)]
pub(crate) struct BgShape {
    spin_speed: f32,
    pulse_speed: f32,
    phase: f32,
}

/// Creates a rounded rectangle mesh for cells, packets and buttons
pub(crate) fn create_rounded_rect_mesh(width: f32, height: f32, radius: f32) -> Mesh {
    use bevy::render::mesh::{Indices, PrimitiveTopology};

    let hw = width / 2.0;
    let hh = height / 2.0;
    let r = radius.min(hw).min(hh); // Clamp radius
    let segments = 8; // Segments per corner

    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut uvs: Vec<[f32; 2]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    // Center vertex
    positions.push([0.0, 0.0, 0.0]);
    uvs.push([0.5, 0.5]);

    // Generate vertices around the rounded rectangle
    let corners = [
        (hw - r, hh - r, 0.0),
        (-hw + r, hh - r, std::f32::consts::FRAC_PI_2),
        (-hw + r, -hh + r, std::f32::consts::PI),
        (hw - r, -hh + r, std::f32::consts::PI * 1.5),
    ];

    for (cx, cy, start_angle) in corners {
        for i in 0..=segments {
            let angle = start_angle + (i as f32 / segments as f32) * std::f32::consts::FRAC_PI_2;
            let x = cx + r * angle.cos();
            let y = cy + r * angle.sin();
            positions.push([x, y, 0.0]);
            uvs.push([(x / width) + 0.5, (y / height) + 0.5]);
        }
    }

    // Generate triangle fan indices
    let num_outer = positions.len() as u32 - 1;
    for i in 1..=num_outer {
        let next = if i == num_outer { 1 } else { i + 1 };
        indices.extend_from_slice(&[0, i, next]);
    }

    Mesh::new(PrimitiveTopology::TriangleList, default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
        .with_inserted_indices(Indices::U32(indices))
}

/// Cursor position in world coordinates, when the cursor is in the window.
pub fn cursor_world(
    windows: &Query<&Window, With<PrimaryWindow>>,
    cam: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Vec2> {
    let win = windows.get_single().ok()?;
    let (camera, cam_t) = cam.get_single().ok()?;
    let cursor = win.cursor_position()?;
    camera.viewport_to_world_2d(cam_t, cursor).ok()
}

pub fn hit_rect(point: Vec2, center: Vec2, w: f32, h: f32) -> bool {
    point.x >= center.x - w / 2.0
        && point.x <= center.x + w / 2.0
        && point.y >= center.y - h / 2.0
        && point.y <= center.y + h / 2.0
}

fn main() {
    // Load env vars
    let _ = dotenvy::dotenv();

    // Tokio runtime for the poll backend calls
    let runtime = Runtime::new().expect("Failed to create Tokio runtime");

    let debug = std::env::var("GARDEN_DEBUG")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let mut app = App::new();
    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "KNOWLEDGE GARDEN".into(),
            resolution: (WINDOW_WIDTH, WINDOW_HEIGHT).into(),
            ..default()
        }),
        ..default()
    }))
    .insert_resource(ClearColor(BG_COLOR));

    let store = store::GardenStore::from_env();
    app.insert_resource(TokioRuntime(runtime))
        .insert_resource(SessionId(uuid::Uuid::new_v4().to_string()))
        .insert_resource(DebugMode(debug))
        .insert_resource(api::ApiClient::from_env())
        .insert_resource(garden::Garden(store.load().garden_state()))
        .init_resource::<api::PollFetchSlot>()
        .init_resource::<api::SubmitSlot>()
        .init_resource::<View>()
        .init_resource::<poll::PollPhase>()
        .init_resource::<garden::DragState>()
        .init_resource::<garden::SyncTimer>()
        .add_event::<BuildView>()
        .add_event::<effects::ShowNotification>()
        .add_event::<effects::ParticleBurst>()
        .add_event::<effects::GardenCelebration>()
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (switch_view, animate_bg_shapes, effects::animate_pulse),
        )
        .add_systems(
            Update,
            (
                poll::build_poll_view,
                poll::handle_poll_fetch,
                poll::hover_choices,
                poll::click_choices,
                poll::handle_submit_result,
                poll::update_choice_dim,
            ),
        )
        .add_systems(
            Update,
            (
                garden::build_garden_view,
                garden::water_on_click,
                garden::start_seed_drag,
                garden::drag_seed,
                garden::drop_seed,
                garden::sync_points_from_ledger,
                garden::handle_reset,
                garden::debug_keys,
                garden::tick_grow_pulse,
                garden::update_cell_visuals,
                garden::update_seed_packets,
                garden::update_water_bar,
                garden::update_stats,
            ),
        )
        .add_systems(
            Update,
            (
                effects::spawn_notifications,
                effects::tick_notifications,
                effects::spawn_bursts,
                effects::tick_burst_particles,
                effects::start_celebration,
                effects::tick_barrage,
                effects::tick_celebration_banners,
                effects::celebration_shake,
            ),
        );

    // Change subscription on the store file; without it the garden falls
    // back to its sync timer.
    if let Some(watcher) = store::StoreWatcher::new(&store) {
        app.insert_non_send_resource(watcher);
    }
    app.insert_resource(store);

    app.run();
}

fn setup(
    mut cmd: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
    mut build: EventWriter<BuildView>,
    session: Res<SessionId>,
    debug: Res<DebugMode>,
) {
    // Camera
    cmd.spawn(Camera2d);

    // Soft leafy shapes drifting in the background
    let mut rng = rand::rng();
    for i in 0..12 {
        let size = rng.random_range(180.0..620.0);
        let x = rng.random_range(-900.0..900.0);
        let y = rng.random_range(-500.0..500.0);
        let a = rng.random_range(0.02..0.06);
        let hue = 90.0 + (i as f32 / 12.0) * 80.0;
        let c = Color::hsla(hue, 0.45, 0.40, a);
        let sides = [3, 4, 5, 6, 8][rng.random_range(0..5)];
        let mesh = meshes.add(RegularPolygon::new(size, sides));
        cmd.spawn((
            Mesh2d(mesh),
            MeshMaterial2d(mats.add(ColorMaterial::from(c))),
            Transform::from_xyz(x, y, -10.0),
            BgShape {
                spin_speed: rng.random_range(-0.15..0.15),
                pulse_speed: rng.random_range(0.3..0.8),
                phase: rng.random_range(0.0..std::f32::consts::TAU),
            },
        ));
    }

    build.send(BuildView(View::Poll));
    let debug_suffix = if debug.0 { " (debug mode)" } else { "" };
    info!("Session {} started{}", session.0, debug_suffix);
}

fn switch_view(
    keys: Res<ButtonInput<KeyCode>>,
    mut cmd: Commands,
    mut view: ResMut<View>,
    mut build: EventWriter<BuildView>,
    poll_ui: Query<Entity, With<poll::PollUi>>,
    garden_ui: Query<Entity, With<garden::GardenUi>>,
) {
    if !keys.just_pressed(KeyCode::Tab) {
        return;
    }

    // Leaving a screen tears it down completely; entering one is a fresh
    // page load.
    match *view {
        View::Poll => {
            for entity in poll_ui.iter() {
                cmd.entity(entity).despawn();
            }
            *view = View::Garden;
        }
        View::Garden => {
            for entity in garden_ui.iter() {
                cmd.entity(entity).despawn();
            }
            *view = View::Poll;
        }
    }
    build.send(BuildView(*view));
    info!("Switched to {:?} view", *view);
}

fn animate_bg_shapes(time: Res<Time>, mut shapes: Query<(&mut Transform, &BgShape)>) {
    let t_secs = time.elapsed_secs();

    for (mut t, s) in shapes.iter_mut() {
        t.rotation = Quat::from_rotation_z(t_secs * s.spin_speed + s.phase);
        let pulse = 1.0 + (t_secs * s.pulse_speed + s.phase).sin() * 0.1;
        t.scale = Vec3::splat(pulse);
    }
}
