//! Poll screen: fetch the active poll, submit one answer, show the award
//! and the coarse garden-level indicator.
//!
//! The level indicator and the garden grid are derived independently from
//! the same XP ledger and may disagree; both stay as they are.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::api::{take_slot, ApiClient, PollFetchSlot, SubmitSlot};
use crate::effects::ShowNotification;
use crate::state::{plant_level, stage_emoji, MAX_STAGE};
use crate::store::GardenStore;
use crate::{
    create_rounded_rect_mesh, cursor_world, hit_rect, BuildView, SessionId, TokioRuntime, View,
};

const NO_ACTIVE_POLL: &str = "No active poll at the moment. Please wait for your instructor.";

const CHOICE_W: f32 = 520.0;
const CHOICE_H: f32 = 70.0;
const CHOICE_TOP_Y: f32 = 120.0;
const CHOICE_STEP: f32 = 90.0;
const HOVER_SCALE: f32 = 1.05;

const CHOICE_INDIGO: Color = Color::srgb(0.40, 0.45, 0.92);
const AWARD_GREEN: Color = Color::srgb(0.28, 0.73, 0.47);
const HINT_WHITE: Color = Color::srgba(1.0, 1.0, 1.0, 0.45);

// Components
#[derive(Component)]
pub struct PollUi;

#[derive(Component)]
pub(crate) struct StatusText;

#[derive(Component)]
pub(crate) struct QuestionText;

#[derive(Component)]
pub(crate) struct ChoiceButton {
    index: usize,
    choice: String,
}

#[derive(Component)]
pub(crate) struct ChoiceLabel {
    index: usize,
}

#[derive(Component)]
pub(crate) struct PlantVisual;

#[derive(Component)]
pub(crate) struct PlantLevelText;

#[derive(Resource, Default, Clone, Copy)]
pub enum PollPhase {
    #[default]
    Loading,
    NoPoll,
    Ready {
        poll_id: i64,
    },
    Submitting {
        poll_id: i64,
    },
    Submitted,
}

pub fn build_poll_view(
    mut cmd: Commands,
    mut events: EventReader<BuildView>,
    runtime: Res<TokioRuntime>,
    api: Res<ApiClient>,
    fetch: Res<PollFetchSlot>,
    submit: Res<SubmitSlot>,
    session: Res<SessionId>,
    store: Res<GardenStore>,
    mut phase: ResMut<PollPhase>,
    old: Query<Entity, With<PollUi>>,
) {
    if !events.read().any(|e| e.0 == View::Poll) {
        return;
    }
    for entity in old.iter() {
        cmd.entity(entity).despawn();
    }

    // A fresh view means a fresh fetch; stale results from a previous visit
    // are dropped on the floor.
    let _ = take_slot(&fetch.0);
    let _ = take_slot(&submit.0);
    *phase = PollPhase::Loading;

    cmd.spawn((
        Text2d::new("Quick Poll"),
        TextFont {
            font_size: 44.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, 320.0, 10.0),
        PollUi,
        crate::effects::Pulse { speed: 3.0 },
    ));
    cmd.spawn((
        Text2d::new("Loading poll..."),
        TextFont {
            font_size: 26.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, 180.0, 10.0),
        PollUi,
        StatusText,
    ));

    // Coarse garden-level indicator, always visible at the bottom.
    let total = store.load().total_xp;
    let level = plant_level(total);
    cmd.spawn((
        Text2d::new(stage_emoji(level)),
        TextFont {
            font_size: 72.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, -200.0, 10.0),
        PollUi,
        PlantVisual,
    ));
    cmd.spawn((
        Text2d::new(format!("Garden level {} / {}", level, MAX_STAGE)),
        TextFont {
            font_size: 22.0,
            ..default()
        },
        TextColor(HINT_WHITE),
        Transform::from_xyz(0.0, -270.0, 10.0),
        PollUi,
        PlantLevelText,
    ));
    cmd.spawn((
        Text2d::new("Answer polls to grow your garden · Tab: visit your garden"),
        TextFont {
            font_size: 18.0,
            ..default()
        },
        TextColor(HINT_WHITE),
        Transform::from_xyz(0.0, -330.0, 10.0),
        PollUi,
    ));

    let api = api.clone();
    let slot = fetch.0.clone();
    info!("Fetching active poll (session {})", session.0);
    runtime.0.spawn(async move {
        let result = api.fetch_active_poll().await;
        *slot.lock().await = Some(result);
    });
}

pub fn handle_poll_fetch(
    mut cmd: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
    view: Res<View>,
    fetch: Res<PollFetchSlot>,
    mut phase: ResMut<PollPhase>,
    mut status: Query<(&mut Text2d, &mut Visibility), With<StatusText>>,
) {
    if *view != View::Poll || !matches!(*phase, PollPhase::Loading) {
        return;
    }
    let Some(result) = take_slot(&fetch.0) else {
        return;
    };

    let mut show_status = |message: &str| {
        for (mut text, mut vis) in status.iter_mut() {
            text.0 = message.to_string();
            *vis = Visibility::Visible;
        }
    };

    let poll = match result {
        Ok(poll) => poll,
        Err(e) => {
            warn!("Failed to load poll: {}", e);
            show_status(NO_ACTIVE_POLL);
            *phase = PollPhase::NoPoll;
            return;
        }
    };

    // A well-formed body can still carry a server-side error; it is shown
    // verbatim.
    if let Some(error) = poll.error {
        show_status(&error);
        *phase = PollPhase::NoPoll;
        return;
    }
    let (Some(poll_id), Some(question), Some(choices)) = (poll.id, poll.question, poll.choices)
    else {
        show_status(NO_ACTIVE_POLL);
        *phase = PollPhase::NoPoll;
        return;
    };

    for (_, mut vis) in status.iter_mut() {
        *vis = Visibility::Hidden;
    }

    cmd.spawn((
        Text2d::new(question),
        TextFont {
            font_size: 32.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, 230.0, 10.0),
        PollUi,
        QuestionText,
    ));

    let button_mesh = meshes.add(create_rounded_rect_mesh(CHOICE_W, CHOICE_H, 16.0));
    for (index, choice) in choices.normalize().into_iter().enumerate() {
        let y = CHOICE_TOP_Y - index as f32 * CHOICE_STEP;
        cmd.spawn((
            Mesh2d(button_mesh.clone()),
            MeshMaterial2d(mats.add(ColorMaterial::from(CHOICE_INDIGO))),
            Transform::from_xyz(0.0, y, 5.0),
            PollUi,
            ChoiceButton {
                index,
                choice: choice.clone(),
            },
        ));
        cmd.spawn((
            Text2d::new(choice),
            TextFont {
                font_size: 26.0,
                ..default()
            },
            TextColor(Color::WHITE),
            Transform::from_xyz(0.0, y, 6.0),
            PollUi,
            ChoiceLabel { index },
        ));
    }

    *phase = PollPhase::Ready { poll_id };
    info!("Active poll {} loaded", poll_id);
}

pub fn hover_choices(
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    phase: Res<PollPhase>,
    mut buttons: Query<(&ChoiceButton, &mut Transform)>,
    mut labels: Query<(&ChoiceLabel, &mut Transform), Without<ChoiceButton>>,
) {
    let interactive = matches!(*phase, PollPhase::Ready { .. });
    let cursor = cursor_world(&windows, &cam);

    for (button, mut t) in buttons.iter_mut() {
        let hovered = interactive
            && cursor
                .is_some_and(|c| hit_rect(c, t.translation.truncate(), CHOICE_W, CHOICE_H));
        let target = if hovered { HOVER_SCALE } else { 1.0 };
        t.scale = t.scale.lerp(Vec3::splat(target), 12.0 * time.delta_secs());

        for (label, mut lt) in labels.iter_mut() {
            if label.index == button.index {
                lt.scale = t.scale;
            }
        }
    }
}

pub fn click_choices(
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cam: Query<(&Camera, &GlobalTransform)>,
    view: Res<View>,
    mut phase: ResMut<PollPhase>,
    buttons: Query<(&ChoiceButton, &Transform)>,
    runtime: Res<TokioRuntime>,
    api: Res<ApiClient>,
    submit: Res<SubmitSlot>,
    session: Res<SessionId>,
) {
    if *view != View::Poll || !mouse.just_pressed(MouseButton::Left) {
        return;
    }
    let PollPhase::Ready { poll_id } = *phase else {
        return;
    };
    let Some(cursor) = cursor_world(&windows, &cam) else {
        return;
    };

    for (button, t) in buttons.iter() {
        if !hit_rect(cursor, t.translation.truncate(), CHOICE_W, CHOICE_H) {
            continue;
        }

        // Entering the submitting phase disables every button until the
        // response lands; nothing cancels the request itself.
        *phase = PollPhase::Submitting { poll_id };
        info!(
            "Submitting answer \"{}\" for poll {} (session {})",
            button.choice, poll_id, session.0
        );

        let api = api.clone();
        let slot = submit.0.clone();
        let choice = button.choice.clone();
        runtime.0.spawn(async move {
            let result = api.submit_answer(poll_id, &choice).await;
            *slot.lock().await = Some(result);
        });
        return;
    }
}

pub fn handle_submit_result(
    mut cmd: Commands,
    view: Res<View>,
    mut phase: ResMut<PollPhase>,
    submit: Res<SubmitSlot>,
    store: Res<GardenStore>,
    mut notes: EventWriter<ShowNotification>,
    question: Query<Entity, With<QuestionText>>,
    buttons: Query<Entity, With<ChoiceButton>>,
    labels: Query<Entity, With<ChoiceLabel>>,
    mut visual: Query<&mut Text2d, With<PlantVisual>>,
    mut level_text: Query<&mut Text2d, (With<PlantLevelText>, Without<PlantVisual>)>,
) {
    let PollPhase::Submitting { poll_id } = *phase else {
        return;
    };
    let Some(result) = take_slot(&submit.0) else {
        return;
    };

    let response = match result {
        Ok(response) if response.success => response,
        Ok(response) => {
            let reason = response.error.unwrap_or_else(|| "Unknown error".to_string());
            notes.send(ShowNotification::info(format!(
                "Failed to submit answer: {}",
                reason
            )));
            // Back to the choices for another try.
            *phase = if *view == View::Poll {
                PollPhase::Ready { poll_id }
            } else {
                PollPhase::NoPoll
            };
            return;
        }
        Err(e) => {
            warn!("Failed to submit answer: {}", e);
            notes.send(ShowNotification::info(
                "Failed to submit answer. Please try again.",
            ));
            *phase = if *view == View::Poll {
                PollPhase::Ready { poll_id }
            } else {
                PollPhase::NoPoll
            };
            return;
        }
    };

    // Award lands in the shared ledger; the garden picks it up through its
    // own sync.
    let awarded = response.awarded_xp();
    let stored = store.update(|s| s.total_xp += awarded);
    let total = stored.total_xp;
    info!("Poll {} answered, +{} XP (total {})", poll_id, awarded, total);

    // One-shot level-up celebration, persisted only when the level rises.
    let level = plant_level(total);
    if level > stored.plant_level {
        store.update(|s| s.plant_level = level);
        notes.send(ShowNotification::success("🎉 Your garden grew!"));
    }

    *phase = PollPhase::Submitted;
    if *view != View::Poll {
        return;
    }

    for entity in question.iter().chain(buttons.iter()).chain(labels.iter()) {
        cmd.entity(entity).despawn();
    }
    cmd.spawn((
        Text2d::new(format!("+{} XP earned! 🌱", awarded)),
        TextFont {
            font_size: 40.0,
            ..default()
        },
        TextColor(AWARD_GREEN),
        Transform::from_xyz(0.0, 160.0, 10.0),
        PollUi,
    ));
    cmd.spawn((
        Text2d::new(format!("Total XP: {}", total)),
        TextFont {
            font_size: 26.0,
            ..default()
        },
        TextColor(Color::WHITE),
        Transform::from_xyz(0.0, 100.0, 10.0),
        PollUi,
    ));

    for mut text in visual.iter_mut() {
        text.0 = stage_emoji(level).to_string();
    }
    for mut text in level_text.iter_mut() {
        text.0 = format!("Garden level {} / {}", level, MAX_STAGE);
    }
}

/// Dim the choices while a submission is in flight.
pub fn update_choice_dim(
    phase: Res<PollPhase>,
    buttons: Query<&MeshMaterial2d<ColorMaterial>, With<ChoiceButton>>,
    mut labels: Query<&mut TextColor, With<ChoiceLabel>>,
    mut mats: ResMut<Assets<ColorMaterial>>,
) {
    let dimmed = matches!(*phase, PollPhase::Submitting { .. });
    let alpha = if dimmed { 0.5 } else { 1.0 };

    for material in buttons.iter() {
        if let Some(mat) = mats.get_mut(&material.0) {
            mat.color = CHOICE_INDIGO.with_alpha(alpha);
        }
    }
    for mut color in labels.iter_mut() {
        color.0 = Color::WHITE.with_alpha(alpha);
    }
}
