//! Garden screen: the 6-cell grid, seed packets, watering gauge and reset.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::effects::{GardenCelebration, ParticleBurst, ShowNotification};
use crate::state::{stage_emoji, GardenState, MAX_STAGE};
use crate::store::{GardenStore, StoreWatcher};
use crate::{
    create_rounded_rect_mesh, cursor_world, hit_rect, BuildView, DebugMode, View,
};

// Layout
const CELL_SIZE: f32 = 150.0;
const CELL_PITCH: f32 = 174.0;
const GRID_CENTER: Vec2 = Vec2::new(70.0, 60.0);
const PACKET_W: f32 = 90.0;
const PACKET_H: f32 = 110.0;
const PACKET_X: f32 = -470.0;
const PACKET_YS: [f32; 3] = [160.0, 30.0, -100.0];
const BAR_CENTER: Vec2 = Vec2::new(70.0, -230.0);
const BAR_W: f32 = 420.0;
const BAR_H: f32 = 26.0;
const RESET_POS: Vec2 = Vec2::new(470.0, -320.0);
const RESET_W: f32 = 180.0;
const RESET_H: f32 = 44.0;
const SYNC_INTERVAL: f32 = 3.0;
const GROW_TIME: f32 = 0.8;

// Colors
const CELL_EMPTY: Color = Color::srgb(0.32, 0.24, 0.17);
const CELL_DRAG_OVER: Color = Color::srgb(0.58, 0.49, 0.22);
const STAGE_GREENS: [Color; 4] = [
    Color::srgb(0.28, 0.40, 0.22),
    Color::srgb(0.28, 0.48, 0.24),
    Color::srgb(0.29, 0.56, 0.26),
    Color::srgb(0.36, 0.64, 0.32),
];
const WATER_BLUE: Color = Color::srgb(0.25, 0.60, 1.0);
const GAUGE_FULL_GOLD: Color = Color::srgb(1.0, 0.84, 0.0);
const BAR_BG: Color = Color::srgb(0.10, 0.13, 0.11);
const PACKET_TAN: Color = Color::srgb(0.78, 0.64, 0.40);
const PACKET_USED: Color = Color::srgb(0.33, 0.31, 0.28);
const RESET_RED: Color = Color::srgb(0.55, 0.22, 0.20);
const DIALOG_BG: Color = Color::srgb(0.12, 0.15, 0.13);
const CONFIRM_RED: Color = Color::srgb(0.74, 0.25, 0.22);
const CANCEL_GRAY: Color = Color::srgb(0.30, 0.33, 0.31);
const HINT_WHITE: Color = Color::srgba(1.0, 1.0, 1.0, 0.45);

// Components
#[derive(Component)]
pub struct GardenUi;

#[derive(Component)]
pub(crate) struct PlantCell {
    index: usize,
}

#[derive(Component)]
pub(crate) struct CellSprite {
    index: usize,
}

#[derive(Component)]
pub(crate) struct SeedPacket {
    index: usize,
    home: Vec3,
}

#[derive(Component)]
pub(crate) struct SeedPacketLabel {
    index: usize,
}

#[derive(Component)]
pub(crate) struct WaterBarFill;
#[derive(Component)]
pub(crate) struct WaterBarLabel;
#[derive(Component)]
pub(crate) struct TotalXpText;
#[derive(Component)]
pub(crate) struct BloomingText;
#[derive(Component)]
pub(crate) struct ReadyMessage;
#[derive(Component)]
pub(crate) struct ResetButton;
#[derive(Component)]
pub(crate) struct ConfirmDialog;
#[derive(Component)]
pub(crate) struct ConfirmResetButton;
#[derive(Component)]
pub(crate) struct CancelResetButton;

/// Short grow animation on a cell after planting or watering.
#[derive(Component)]
pub(crate) struct GrowPulse {
    ttl: f32,
}

// Resources
#[derive(Resource, Default)]
pub struct Garden(pub GardenState);

#[derive(Resource, Default)]
pub struct DragState {
    seed: Option<Entity>,
}

/// Fallback sync cadence when the store watcher is unavailable.
#[derive(Resource)]
pub struct SyncTimer(pub Timer);

impl Default for SyncTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(SYNC_INTERVAL, TimerMode::Repeating))
    }
}

fn cell_pos(index: usize) -> Vec2 {
    let col = (index % 3) as f32;
    let row = (index / 3) as f32;
    Vec2::new(
        GRID_CENTER.x + (col - 1.0) * CELL_PITCH,
        GRID_CENTER.y + (0.5 - row) * CELL_PITCH,
    )
}

/// Persist the keys the garden screen owns. The ledger belongs to the poll
/// screen and stays untouched here.
fn save_garden(store: &GardenStore, garden: &GardenState) {
    store.update(|s| {
        s.plants = garden.plants;
        s.seeds_used = garden.seeds_used;
        s.current_water_xp = garden.current_water_points;
    });
}

pub fn build_garden_view(
    mut cmd: Commands,
    mut events: EventReader<BuildView>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
    old: Query<Entity, With<GardenUi>>,
) {
    if !events.read().any(|e| e.0 == View::Garden) {
        return;
    }
    for entity in old.iter() {
        cmd.entity(entity).despawn();
    }

    cmd.spawn((
        Text2d::new("Knowledge Garden"),
        TextFont {
            font_size: 44.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, 320.0, 10.0),
        GardenUi,
        crate::effects::Pulse { speed: 3.0 },
    ));

    // Plant cells
    let cell_mesh = meshes.add(create_rounded_rect_mesh(CELL_SIZE, CELL_SIZE, 18.0));
    for index in 0..crate::state::GRID_SIZE {
        let pos = cell_pos(index);
        cmd.spawn((
            Mesh2d(cell_mesh.clone()),
            MeshMaterial2d(mats.add(ColorMaterial::from(CELL_EMPTY))),
            Transform::from_xyz(pos.x, pos.y, 0.0),
            GardenUi,
            PlantCell { index },
        ));
        cmd.spawn((
            Text2d::new(""),
            TextFont {
                font_size: 56.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_xyz(pos.x, pos.y, 1.0),
            GardenUi,
            CellSprite { index },
        ));
    }

    // Seed packets
    let packet_mesh = meshes.add(create_rounded_rect_mesh(PACKET_W, PACKET_H, 14.0));
    for (index, y) in PACKET_YS.into_iter().enumerate() {
        let home = Vec3::new(PACKET_X, y, 2.0);
        cmd.spawn((
            Mesh2d(packet_mesh.clone()),
            MeshMaterial2d(mats.add(ColorMaterial::from(PACKET_TAN))),
            Transform::from_translation(home),
            GardenUi,
            SeedPacket { index, home },
        ));
        cmd.spawn((
            Text2d::new("🌱"),
            TextFont {
                font_size: 40.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_xyz(PACKET_X, y, 3.0),
            GardenUi,
            SeedPacketLabel { index },
        ));
    }
    cmd.spawn((
        Text2d::new("Seeds"),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(HINT_WHITE),
        Transform::from_xyz(PACKET_X, 240.0, 2.0),
        GardenUi,
    ));

    // Watering gauge
    cmd.spawn((
        Mesh2d(meshes.add(Rectangle::new(BAR_W, BAR_H))),
        MeshMaterial2d(mats.add(ColorMaterial::from(BAR_BG))),
        Transform::from_xyz(BAR_CENTER.x, BAR_CENTER.y, 1.0),
        GardenUi,
    ));
    cmd.spawn((
        Mesh2d(meshes.add(Rectangle::new(BAR_W, BAR_H - 6.0))),
        MeshMaterial2d(mats.add(ColorMaterial::from(WATER_BLUE))),
        Transform::from_xyz(BAR_CENTER.x, BAR_CENTER.y, 2.0).with_scale(Vec3::new(
            0.0, 1.0, 1.0,
        )),
        GardenUi,
        WaterBarFill,
    ));
    cmd.spawn((
        Text2d::new("💧 0 / 50"),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(BAR_CENTER.x, BAR_CENTER.y + 32.0, 2.0),
        GardenUi,
        WaterBarLabel,
    ));
    cmd.spawn((
        Text2d::new("💧 Ready to water! Click a plant to grow it!"),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(GAUGE_FULL_GOLD),
        Transform::from_xyz(BAR_CENTER.x, BAR_CENTER.y - 38.0, 2.0),
        Visibility::Hidden,
        GardenUi,
        ReadyMessage,
    ));

    // Stats
    cmd.spawn((
        Text2d::new("Total XP: 0"),
        TextFont {
            font_size: 24.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(440.0, 300.0, 2.0),
        GardenUi,
        TotalXpText,
    ));
    cmd.spawn((
        Text2d::new("Blooming: 0 / 6"),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(HINT_WHITE),
        Transform::from_xyz(440.0, 264.0, 2.0),
        GardenUi,
        BloomingText,
    ));

    // Reset control
    cmd.spawn((
        Mesh2d(meshes.add(create_rounded_rect_mesh(RESET_W, RESET_H, 12.0))),
        MeshMaterial2d(mats.add(ColorMaterial::from(RESET_RED))),
        Transform::from_xyz(RESET_POS.x, RESET_POS.y, 2.0),
        GardenUi,
        ResetButton,
    ));
    cmd.spawn((
        Text2d::new("Reset Garden"),
        TextFont {
            font_size: 20.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(RESET_POS.x, RESET_POS.y, 3.0),
        GardenUi,
    ));

    cmd.spawn((
        Text2d::new("Drag a seed into an empty pot · Tab: answer polls"),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(HINT_WHITE),
        Transform::from_xyz(-260.0, -330.0, 2.0),
        GardenUi,
    ));
}

/// Watering by clicking a planted cell.
pub fn water_on_click(
    mut cmd: Commands,
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    view: Res<View>,
    drag: Res<DragState>,
    dialog: Query<(), With<ConfirmDialog>>,
    mut garden: ResMut<Garden>,
    store: Res<GardenStore>,
    cells: Query<(Entity, &PlantCell, &Transform)>,
    mut notes: EventWriter<ShowNotification>,
    mut bursts: EventWriter<ParticleBurst>,
    mut celebration: EventWriter<GardenCelebration>,
) {
    if *view != View::Garden
        || !mouse.just_pressed(MouseButton::Left)
        || drag.seed.is_some()
        || !dialog.is_empty()
    {
        return;
    }
    let Some(cursor) = cursor_world(&windows, &cam) else {
        return;
    };

    for (entity, cell, t) in cells.iter() {
        let pos = t.translation.truncate();
        if !hit_rect(cursor, pos, CELL_SIZE, CELL_SIZE) {
            continue;
        }
        use crate::state::WaterOutcome::*;
        match garden.0.water(cell.index) {
            Grown {
                new_stage,
                garden_complete,
            } => {
                save_garden(&store, &garden.0);
                cmd.entity(entity).insert(GrowPulse { ttl: GROW_TIME });
                bursts.send(ParticleBurst { pos, count: 12 });
                info!("Watered plant {} to stage {}", cell.index + 1, new_stage);
                if garden_complete {
                    celebration.send(GardenCelebration);
                    info!("Garden complete, all plants blooming");
                }
            }
            NeedMorePoints => {
                notes.send(ShowNotification::info(
                    "Need 50 XP to water! Answer more questions! 💧",
                ));
            }
            Ignored => {}
        }
        return;
    }
}

/// Grab an unused seed packet under the cursor.
pub fn start_seed_drag(
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    view: Res<View>,
    dialog: Query<(), With<ConfirmDialog>>,
    garden: Res<Garden>,
    mut drag: ResMut<DragState>,
    packets: Query<(Entity, &SeedPacket, &Transform)>,
) {
    if *view != View::Garden || !mouse.just_pressed(MouseButton::Left) || !dialog.is_empty() {
        return;
    }
    let Some(cursor) = cursor_world(&windows, &cam) else {
        return;
    };

    for (entity, packet, t) in packets.iter() {
        if !hit_rect(cursor, t.translation.truncate(), PACKET_W, PACKET_H) {
            continue;
        }
        // Spent packets stay in the rack as inert husks.
        if packet.index < garden.0.seeds_used as usize {
            return;
        }
        drag.seed = Some(entity);
        return;
    }
}

/// A grabbed packet rides the cursor.
pub fn drag_seed(
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    drag: Res<DragState>,
    mut packets: Query<&mut Transform, With<SeedPacket>>,
) {
    let Some(entity) = drag.seed else {
        return;
    };
    let Some(cursor) = cursor_world(&windows, &cam) else {
        return;
    };
    if let Ok(mut t) = packets.get_mut(entity) {
        t.translation.x = cursor.x;
        t.translation.y = cursor.y;
        t.translation.z = 20.0;
        t.scale = Vec3::splat(1.1);
    }
}

/// Dropping a packet over an empty cell plants the seed; anywhere else the
/// packet snaps back to the rack.
pub fn drop_seed(
    mut cmd: Commands,
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    mut drag: ResMut<DragState>,
    mut garden: ResMut<Garden>,
    store: Res<GardenStore>,
    cells: Query<(Entity, &PlantCell, &Transform)>,
    mut notes: EventWriter<ShowNotification>,
    mut bursts: EventWriter<ParticleBurst>,
) {
    if !mouse.just_released(MouseButton::Left) {
        return;
    }
    // Clearing the drag lets the packet snap back to its rack position on
    // the next frame.
    if drag.seed.take().is_none() {
        return;
    }

    if let Some(cursor) = cursor_world(&windows, &cam) {
        for (entity, cell, t) in cells.iter() {
            let pos = t.translation.truncate();
            if !hit_rect(cursor, pos, CELL_SIZE, CELL_SIZE) {
                continue;
            }
            use crate::state::PlantOutcome::*;
            match garden.0.plant(cell.index) {
                Planted {
                    seeds_left,
                    last_seed,
                } => {
                    save_garden(&store, &garden.0);
                    cmd.entity(entity).insert(GrowPulse { ttl: GROW_TIME });
                    bursts.send(ParticleBurst { pos, count: 5 });
                    if last_seed {
                        notes.send(ShowNotification::info(
                            "Last seed planted! Water your plants to grow them! 🌱💧",
                        ));
                    } else {
                        notes.send(ShowNotification::info(format!(
                            "Seed planted! {} seed{} left. 🌱",
                            seeds_left,
                            if seeds_left > 1 { "s" } else { "" }
                        )));
                    }
                    info!("Planted seed in slot {}", cell.index + 1);
                }
                OutOfSeeds => {
                    notes.send(ShowNotification::info("All seeds used! 🌱"));
                }
                SlotOccupied => {}
            }
            break;
        }
    }
}

/// Ledger sync: watcher-driven when available, timer-driven otherwise.
/// Only positive deltas flow into the gauge, capped at the threshold.
pub fn sync_points_from_ledger(
    time: Res<Time>,
    mut timer: ResMut<SyncTimer>,
    watcher: Option<NonSend<StoreWatcher>>,
    store: Res<GardenStore>,
    mut garden: ResMut<Garden>,
    mut notes: EventWriter<ShowNotification>,
) {
    let due = match &watcher {
        Some(w) => w.changed(),
        None => timer.0.tick(time.delta()).just_finished(),
    };
    if !due {
        return;
    }

    let ledger_total = store.load().total_xp;
    if let Some(gained) = garden.0.sync_points(ledger_total) {
        save_garden(&store, &garden.0);
        notes.send(ShowNotification::info(format!("+{} XP earned! 💧", gained)));
        info!(
            "Ledger at {}, watering gauge at {}",
            garden.0.total_points, garden.0.current_water_points
        );
    }
}

/// Reset button and its confirmation dialog.
pub fn handle_reset(
    mut cmd: Commands,
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    view: Res<View>,
    mut garden: ResMut<Garden>,
    store: Res<GardenStore>,
    mut build: EventWriter<BuildView>,
    reset_btn: Query<&Transform, With<ResetButton>>,
    dialog: Query<Entity, With<ConfirmDialog>>,
    confirm_btn: Query<&Transform, (With<ConfirmResetButton>, Without<ResetButton>)>,
    cancel_btn: Query<
        &Transform,
        (
            With<CancelResetButton>,
            Without<ResetButton>,
            Without<ConfirmResetButton>,
        ),
    >,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    if *view != View::Garden || !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(cursor) = cursor_world(&windows, &cam) else {
        return;
    };

    if dialog.is_empty() {
        let Ok(t) = reset_btn.get_single() else {
            return;
        };
        if hit_rect(cursor, t.translation.truncate(), RESET_W, RESET_H) {
            spawn_confirm_dialog(&mut cmd, &mut meshes, &mut mats);
        }
        return;
    }

    // Dialog open: only its two buttons react.
    if let Ok(t) = confirm_btn.get_single() {
        if hit_rect(cursor, t.translation.truncate(), 160.0, 48.0) {
            garden.0.reset();
            store.reset();
            build.send(BuildView(View::Garden));
            info!("Garden reset to initial state");
            return;
        }
    }
    if let Ok(t) = cancel_btn.get_single() {
        if hit_rect(cursor, t.translation.truncate(), 160.0, 48.0) {
            for entity in dialog.iter() {
                cmd.entity(entity).despawn();
            }
        }
    }
}

fn spawn_confirm_dialog(
    cmd: &mut Commands,
    meshes: &mut Assets<Mesh>,
    mats: &mut Assets<ColorMaterial>,
) {
    cmd.spawn((
        Mesh2d(meshes.add(create_rounded_rect_mesh(640.0, 260.0, 20.0))),
        MeshMaterial2d(mats.add(ColorMaterial::from(DIALOG_BG))),
        Transform::from_xyz(0.0, 0.0, 70.0),
        GardenUi,
        ConfirmDialog,
    ));
    cmd.spawn((
        Text2d::new("Reset your entire garden?\nThis will delete all plants and XP!"),
        TextFont {
            font_size: 26.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, 45.0, 71.0),
        GardenUi,
        ConfirmDialog,
    ));
    for (x, color, label, confirm) in [
        (-120.0, CONFIRM_RED, "Reset", true),
        (120.0, CANCEL_GRAY, "Keep", false),
    ] {
        let mut button = cmd.spawn((
            Mesh2d(meshes.add(create_rounded_rect_mesh(160.0, 48.0, 12.0))),
            MeshMaterial2d(mats.add(ColorMaterial::from(color))),
            Transform::from_xyz(x, -60.0, 71.0),
            GardenUi,
            ConfirmDialog,
        ));
        if confirm {
            button.insert(ConfirmResetButton);
        } else {
            button.insert(CancelResetButton);
        }
        cmd.spawn((
            Text2d::new(label),
            TextFont {
                font_size: 22.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_xyz(x, -60.0, 72.0),
            GardenUi,
            ConfirmDialog,
        ));
    }
}

/// Developer shortcuts, registered only in debug mode: G cycles the next
/// occupied slot's stage (blooming wraps to removal), X grants 10 XP to the
/// ledger and the gauge.
pub fn debug_keys(
    keys: Res<ButtonInput<KeyCode>>,
    debug: Res<DebugMode>,
    view: Res<View>,
    mut garden: ResMut<Garden>,
    store: Res<GardenStore>,
    mut notes: EventWriter<ShowNotification>,
) {
    if !debug.0 || *view != View::Garden {
        return;
    }

    if keys.just_pressed(KeyCode::KeyG) {
        use crate::state::DebugCycleOutcome::*;
        match garden.0.debug_cycle() {
            NoPlants => {
                notes.send(ShowNotification::info(
                    "No plants to cycle! Plant some seeds first.",
                ));
            }
            Removed { slot } => {
                save_garden(&store, &garden.0);
                notes.send(ShowNotification::info(format!(
                    "🔧 DEBUG: Plant {} removed",
                    slot + 1
                )));
            }
            Advanced { slot, new_stage } => {
                save_garden(&store, &garden.0);
                notes.send(ShowNotification::info(format!(
                    "Plant {} → Stage {}",
                    slot + 1,
                    new_stage
                )));
            }
        }
    }

    if keys.just_pressed(KeyCode::KeyX) {
        garden.0.debug_grant();
        let total = garden.0.total_points;
        store.update(|s| {
            s.total_xp = total;
            s.plants = garden.0.plants;
            s.seeds_used = garden.0.seeds_used;
            s.current_water_xp = garden.0.current_water_points;
        });
        notes.send(ShowNotification::info("QUESTION CORRECT: +10 XP added"));
    }
}

pub fn tick_grow_pulse(
    time: Res<Time>,
    mut cmd: Commands,
    mut cells: Query<(Entity, &mut GrowPulse, &mut Transform)>,
) {
    for (entity, mut pulse, mut t) in cells.iter_mut() {
        pulse.ttl -= time.delta_secs();
        if pulse.ttl <= 0.0 {
            t.scale = Vec3::ONE;
            cmd.entity(entity).remove::<GrowPulse>();
            continue;
        }
        let progress = 1.0 - pulse.ttl / GROW_TIME;
        t.scale = Vec3::splat(1.0 + (std::f32::consts::PI * progress).sin() * 0.15);
    }
}

pub fn update_cell_visuals(
    time: Res<Time>,
    garden: Res<Garden>,
    drag: Res<DragState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    cells: Query<(&PlantCell, &Transform, &MeshMaterial2d<ColorMaterial>)>,
    mut sprites: Query<
        (&CellSprite, &mut Text2d, &mut Transform, &mut TextColor),
        Without<PlantCell>,
    >,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    let cursor = if drag.seed.is_some() {
        cursor_world(&windows, &cam)
    } else {
        None
    };
    let can_water = garden.0.can_water();

    for (cell, t, material) in cells.iter() {
        let stage = garden.0.plants[cell.index];
        let drag_over = cursor.is_some_and(|c| {
            stage.is_none() && hit_rect(c, t.translation.truncate(), CELL_SIZE, CELL_SIZE)
        });

        let color = match stage {
            None if drag_over => CELL_DRAG_OVER,
            None => CELL_EMPTY,
            Some(stage) => {
                let base = STAGE_GREENS[(stage - 1).min(MAX_STAGE - 1) as usize];
                if can_water && stage < MAX_STAGE {
                    base.mix(&WATER_BLUE, 0.3)
                } else {
                    base
                }
            }
        };
        if let Some(mat) = mats.get_mut(&material.0) {
            mat.color = color;
        }
    }

    for (sprite, mut text, mut t, mut color) in sprites.iter_mut() {
        match garden.0.plants[sprite.index] {
            None => {
                text.0 = stage_emoji(0).to_string();
                color.0 = Color::srgba(1.0, 1.0, 1.0, 0.4);
                t.scale = Vec3::splat(0.9);
            }
            Some(stage) => {
                text.0 = stage_emoji(stage).to_string();
                color.0 = Color::WHITE;
                let mut scale = 0.85 + stage as f32 * 0.12;
                if stage == MAX_STAGE {
                    scale +=
                        (time.elapsed_secs() * 2.5 + sprite.index as f32).sin() * 0.05;
                }
                t.scale = Vec3::splat(scale);
            }
        }
    }
}

pub fn update_seed_packets(
    garden: Res<Garden>,
    drag: Res<DragState>,
    mut packets: Query<(Entity, &SeedPacket, &mut Transform, &MeshMaterial2d<ColorMaterial>)>,
    mut labels: Query<
        (&SeedPacketLabel, &mut Transform, &mut TextColor),
        Without<SeedPacket>,
    >,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    for (entity, packet, mut t, material) in packets.iter_mut() {
        let used = packet.index < garden.0.seeds_used as usize;
        if drag.seed != Some(entity) {
            t.translation = packet.home;
            t.scale = Vec3::ONE;
        }
        if let Some(mat) = mats.get_mut(&material.0) {
            mat.color = if used { PACKET_USED } else { PACKET_TAN };
        }

        for (label, mut lt, mut lc) in labels.iter_mut() {
            if label.index == packet.index {
                lt.translation = t.translation + Vec3::Z;
                lt.scale = t.scale;
                lc.0 = if used {
                    Color::srgba(1.0, 1.0, 1.0, 0.35)
                } else {
                    Color::WHITE
                };
            }
        }
    }
}

pub fn update_water_bar(
    garden: Res<Garden>,
    mut mats: ResMut<Assets<ColorMaterial>>,
    mut fill: Query<(&mut Transform, &MeshMaterial2d<ColorMaterial>), With<WaterBarFill>>,
    mut label: Query<&mut Text2d, With<WaterBarLabel>>,
    mut ready: Query<&mut Visibility, With<ReadyMessage>>,
) {
    let frac =
        (garden.0.current_water_points as f32 / crate::state::XP_TO_WATER as f32).clamp(0.0, 1.0);

    for (mut t, material) in fill.iter_mut() {
        t.scale.x = frac;
        t.translation.x = BAR_CENTER.x - BAR_W / 2.0 + BAR_W * frac / 2.0;
        if let Some(mat) = mats.get_mut(&material.0) {
            mat.color = if garden.0.can_water() {
                GAUGE_FULL_GOLD
            } else {
                WATER_BLUE
            };
        }
    }
    for mut text in label.iter_mut() {
        text.0 = format!(
            "💧 {} / {}",
            garden.0.current_water_points,
            crate::state::XP_TO_WATER
        );
    }
    for mut vis in ready.iter_mut() {
        *vis = if garden.0.can_water() {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
    }
}

pub fn update_stats(
    garden: Res<Garden>,
    mut total: Query<&mut Text2d, With<TotalXpText>>,
    mut blooming: Query<&mut Text2d, (With<BloomingText>, Without<TotalXpText>)>,
) {
    for mut text in total.iter_mut() {
        text.0 = format!("Total XP: {}", garden.0.total_points);
    }
    for mut text in blooming.iter_mut() {
        text.0 = format!(
            "Blooming: {} / {}",
            garden.0.blooming_count(),
            crate::state::GRID_SIZE
        );
    }
}
