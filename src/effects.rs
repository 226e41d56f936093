//! Shared juice: notification banners, particle bursts and celebrations.

use bevy::prelude::*;
use rand::Rng;

use crate::{WINDOW_HEIGHT, WINDOW_WIDTH};

// Banner colors
const NOTE_INFO: Color = Color::srgb(0.40, 0.45, 0.92);
const NOTE_SUCCESS: Color = Color::srgb(0.28, 0.73, 0.47);
const CELEBRATION_GOLD: Color = Color::srgb(1.0, 0.84, 0.0);
const CELEBRATION_TEXT: Color = Color::srgb(0.40, 0.26, 0.13);

// Sparkle palette for bursts
const SPARKLE_COLORS: [Color; 4] = [
    Color::srgb(1.0, 0.9, 0.4),
    Color::srgb(0.4, 0.7, 1.0),
    Color::srgb(1.0, 1.0, 1.0),
    Color::srgb(1.0, 0.75, 0.2),
];

const NOTE_Y: f32 = 300.0;
const FADE_TIME: f32 = 0.3;
const BARRAGE_BURSTS: u32 = 50;

#[derive(Clone, Copy, PartialEq)]
pub enum NoteKind {
    Info,
    Success,
}

#[derive(Event)]
pub struct ShowNotification {
    pub text: String,
    pub kind: NoteKind,
}

impl ShowNotification {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoteKind::Info,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NoteKind::Success,
        }
    }
}

#[derive(Event)]
pub struct ParticleBurst {
    pub pos: Vec2,
    pub count: u32,
}

/// Fired once, by the watering action that brings the whole grid to bloom.
#[derive(Event)]
pub struct GardenCelebration;

#[derive(Component)]
pub(crate) struct Notification {
    ttl: f32,
    max_ttl: f32,
    base: Color,
}

#[derive(Component)]
pub(crate) struct BurstParticle {
    vel: Vec2,
    spin: f32,
    ttl: f32,
    base: Color,
}

#[derive(Component)]
pub(crate) struct CelebrationBanner {
    ttl: f32,
}

/// Staggered burst driver for the full-garden celebration.
#[derive(Component)]
pub(crate) struct Barrage {
    remaining: u32,
    timer: Timer,
}

/// Gentle breathing scale, for headline text.
#[derive(Component)]
pub struct Pulse {
    pub speed: f32,
}

pub fn spawn_notifications(
    mut cmd: Commands,
    mut events: EventReader<ShowNotification>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    for event in events.read() {
        let (color, ttl) = match event.kind {
            NoteKind::Info => (NOTE_INFO, 3.0),
            NoteKind::Success => (NOTE_SUCCESS, 2.0),
        };
        let width = event.text.chars().count() as f32 * 11.0 + 64.0;

        cmd.spawn((
            Mesh2d(meshes.add(Rectangle::new(width, 52.0))),
            MeshMaterial2d(mats.add(ColorMaterial::from(color))),
            Transform::from_xyz(0.0, NOTE_Y, 50.0),
            Notification {
                ttl,
                max_ttl: ttl,
                base: color,
            },
        ));
        cmd.spawn((
            Text2d::new(event.text.clone()),
            TextFont {
                font_size: 22.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_xyz(0.0, NOTE_Y, 51.0),
            Notification {
                ttl,
                max_ttl: ttl,
                base: Color::WHITE,
            },
        ));
    }
}

pub fn tick_notifications(
    time: Res<Time>,
    mut cmd: Commands,
    mut mats: ResMut<Assets<ColorMaterial>>,
    mut notes: Query<(
        Entity,
        &mut Notification,
        Option<&MeshMaterial2d<ColorMaterial>>,
        Option<&mut TextColor>,
    )>,
) {
    for (entity, mut note, material, text_color) in notes.iter_mut() {
        note.ttl -= time.delta_secs();
        if note.ttl <= 0.0 {
            cmd.entity(entity).despawn();
            continue;
        }

        // Pop in for the first instants, fade out at the end.
        let lived = note.max_ttl - note.ttl;
        let alpha = (lived / 0.2).min(note.ttl / FADE_TIME).clamp(0.0, 1.0);
        let faded = note.base.with_alpha(alpha);

        if let Some(handle) = material {
            if let Some(mat) = mats.get_mut(&handle.0) {
                mat.color = faded;
            }
        }
        if let Some(mut text_color) = text_color {
            text_color.0 = faded;
        }
    }
}

pub fn spawn_bursts(
    mut cmd: Commands,
    mut events: EventReader<ParticleBurst>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    let mut rng = rand::rng();
    for burst in events.read() {
        for i in 0..burst.count {
            let angle = std::f32::consts::TAU * i as f32 / burst.count as f32;
            let speed = rng.random_range(60.0..130.0);
            let vel = Vec2::new(angle.cos(), angle.sin()) * speed;
            let radius = rng.random_range(3.0..7.0);
            let color = SPARKLE_COLORS[rng.random_range(0..SPARKLE_COLORS.len())];

            cmd.spawn((
                Mesh2d(meshes.add(Circle::new(radius))),
                MeshMaterial2d(mats.add(ColorMaterial::from(color))),
                Transform::from_xyz(burst.pos.x, burst.pos.y, 40.0),
                BurstParticle {
                    vel,
                    spin: rng.random_range(-3.0..3.0),
                    ttl: 1.5,
                    base: color,
                },
            ));
        }
    }
}

pub fn tick_burst_particles(
    time: Res<Time>,
    mut cmd: Commands,
    mut mats: ResMut<Assets<ColorMaterial>>,
    mut particles: Query<(
        Entity,
        &mut Transform,
        &mut BurstParticle,
        &MeshMaterial2d<ColorMaterial>,
    )>,
) {
    let dt = time.delta_secs();
    for (entity, mut t, mut p, material) in particles.iter_mut() {
        p.ttl -= dt;
        if p.ttl <= 0.0 {
            cmd.entity(entity).despawn();
            continue;
        }

        t.translation.x += p.vel.x * dt;
        t.translation.y += p.vel.y * dt;
        p.vel *= 1.0 - 2.0 * dt;
        t.rotation = Quat::from_rotation_z(p.ttl * p.spin);

        let life = p.ttl / 1.5;
        t.scale = Vec3::splat(life.max(0.2));
        if let Some(mat) = mats.get_mut(&material.0) {
            mat.color = p.base.with_alpha(life);
        }
    }
}

pub fn start_celebration(
    mut cmd: Commands,
    mut events: EventReader<GardenCelebration>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    for _ in events.read() {
        cmd.spawn((
            Mesh2d(meshes.add(Rectangle::new(560.0, 220.0))),
            MeshMaterial2d(mats.add(ColorMaterial::from(CELEBRATION_GOLD))),
            Transform::from_xyz(0.0, 0.0, 60.0),
            CelebrationBanner { ttl: 5.0 },
        ));
        cmd.spawn((
            Text2d::new("🎉🌸🎉\nGarden Complete!\n🎉🌸🎉"),
            TextFont {
                font_size: 38.0,
                ..default()
            },
            TextColor(CELEBRATION_TEXT),
            Transform::from_xyz(0.0, 0.0, 61.0),
            CelebrationBanner { ttl: 5.0 },
        ));
        cmd.spawn(Barrage {
            remaining: BARRAGE_BURSTS,
            timer: Timer::from_seconds(0.1, TimerMode::Repeating),
        });
    }
}

pub fn tick_barrage(
    time: Res<Time>,
    mut cmd: Commands,
    mut barrages: Query<(Entity, &mut Barrage)>,
    mut bursts: EventWriter<ParticleBurst>,
) {
    let mut rng = rand::rng();
    for (entity, mut barrage) in barrages.iter_mut() {
        if !barrage.timer.tick(time.delta()).just_finished() {
            continue;
        }
        let pos = Vec2::new(
            rng.random_range(-WINDOW_WIDTH / 2.0..WINDOW_WIDTH / 2.0),
            rng.random_range(-WINDOW_HEIGHT / 2.0..WINDOW_HEIGHT / 2.0),
        );
        bursts.send(ParticleBurst { pos, count: 8 });

        barrage.remaining -= 1;
        if barrage.remaining == 0 {
            cmd.entity(entity).despawn();
        }
    }
}

pub fn tick_celebration_banners(
    time: Res<Time>,
    mut cmd: Commands,
    mut banners: Query<(Entity, &mut CelebrationBanner, &mut Transform)>,
) {
    for (entity, mut banner, mut t) in banners.iter_mut() {
        banner.ttl -= time.delta_secs();
        if banner.ttl <= 0.0 {
            cmd.entity(entity).despawn();
            continue;
        }
        let pulse = 1.0 + (banner.ttl * 4.0).sin() * 0.03;
        t.scale = Vec3::splat(pulse);
    }
}

pub fn animate_pulse(time: Res<Time>, mut q: Query<(&mut Transform, &Pulse)>) {
    for (mut t, p) in q.iter_mut() {
        let s = 1.0 + (time.elapsed_secs() * p.speed).sin() * 0.05;
        t.scale = Vec3::splat(s);
    }
}

/// Rattle the camera while a celebration barrage is running.
pub fn celebration_shake(
    barrages: Query<&Barrage>,
    mut cam: Query<&mut Transform, With<Camera2d>>,
) {
    let mut rng = rand::rng();
    for mut t in cam.iter_mut() {
        if !barrages.is_empty() {
            t.translation.x = rng.random_range(-3.0..3.0);
            t.translation.y = rng.random_range(-3.0..3.0);
        } else {
            t.translation.x *= 0.85;
            t.translation.y *= 0.85;
        }
    }
}
