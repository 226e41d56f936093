//! Garden state machine: the 6-slot grid, the seed inventory and the
//! watering gate. Pure logic, no rendering.
//!
//! Both progress displays (the grid here, the coarse level on the poll
//! screen) derive from the same XP ledger total; [`plant_level`] is the one
//! shared derivation for the coarse indicator.

pub const GRID_SIZE: usize = 6;
pub const MAX_STAGE: u8 = 4;
pub const MAX_SEEDS: u8 = 3;
pub const XP_PER_ANSWER: i64 = 10;
pub const XP_TO_WATER: i64 = 50;

/// Display name + emoji per growth stage, index 0 = empty pot.
pub const STAGE_INFO: [(&str, &str); 5] = [
    ("Empty Pot", "🪴"),
    ("Planted Seed", "🌱"),
    ("Sprout", "🌿"),
    ("Seedling", "☘️"),
    ("Blooming", "🌸"),
];

pub fn stage_emoji(stage: u8) -> &'static str {
    STAGE_INFO[stage.min(MAX_STAGE) as usize].1
}

/// Coarse 0-4 level shown on the poll screen. Derived from the ledger only,
/// independent of the grid.
pub fn plant_level(total_points: i64) -> u8 {
    (total_points / XP_TO_WATER).clamp(0, MAX_STAGE as i64) as u8
}

#[derive(Clone, Debug, PartialEq)]
pub struct GardenState {
    /// None = empty slot, Some(stage) with stage in 1..=4.
    pub plants: [Option<u8>; GRID_SIZE],
    /// Last seen ledger total. Monotone while the app runs.
    pub total_points: i64,
    /// Watering gauge, 0..=50. Resets to 0 on every successful watering.
    pub current_water_points: i64,
    /// Seeds consumed so far, 0..=3. Only a full reset gives them back.
    pub seeds_used: u8,
    debug_cursor: usize,
}

impl Default for GardenState {
    fn default() -> Self {
        Self {
            plants: [None; GRID_SIZE],
            total_points: 0,
            current_water_points: 0,
            seeds_used: 0,
            debug_cursor: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlantOutcome {
    Planted { seeds_left: u8, last_seed: bool },
    /// Silent no-op.
    SlotOccupied,
    /// Rejected with a notification.
    OutOfSeeds,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WaterOutcome {
    Grown { new_stage: u8, garden_complete: bool },
    /// Slot is a valid target but the gauge is below the threshold.
    NeedMorePoints,
    /// Empty or already blooming slot. Silent no-op.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DebugCycleOutcome {
    Advanced { slot: usize, new_stage: u8 },
    Removed { slot: usize },
    NoPlants,
}

impl GardenState {
    /// Rebuild from persisted keys. The stored ledger total becomes the
    /// last-seen total.
    pub fn from_saved(
        plants: [Option<u8>; GRID_SIZE],
        total_points: i64,
        current_water_points: i64,
        seeds_used: u8,
    ) -> Self {
        Self {
            plants,
            total_points,
            current_water_points,
            seeds_used,
            ..Self::default()
        }
    }

    /// Derived, never stored: the gauge is the single source of truth.
    pub fn can_water(&self) -> bool {
        self.current_water_points >= XP_TO_WATER
    }

    pub fn occupied_count(&self) -> usize {
        self.plants.iter().filter(|s| s.is_some()).count()
    }

    pub fn blooming_count(&self) -> usize {
        self.plants.iter().filter(|s| **s == Some(MAX_STAGE)).count()
    }

    pub fn seeds_left(&self) -> u8 {
        MAX_SEEDS - self.seeds_used
    }

    /// Put a seed into an empty slot.
    pub fn plant(&mut self, slot: usize) -> PlantOutcome {
        if self.plants[slot].is_some() {
            return PlantOutcome::SlotOccupied;
        }
        if self.seeds_used >= MAX_SEEDS {
            return PlantOutcome::OutOfSeeds;
        }
        self.plants[slot] = Some(1);
        self.seeds_used += 1;
        let seeds_left = self.seeds_left();
        PlantOutcome::Planted {
            seeds_left,
            last_seed: seeds_left == 0,
        }
    }

    /// Spend the full gauge to grow one plant by a stage.
    pub fn water(&mut self, slot: usize) -> WaterOutcome {
        let stage = match self.plants[slot] {
            Some(stage) if stage < MAX_STAGE => stage,
            _ => return WaterOutcome::Ignored,
        };
        if !self.can_water() {
            return WaterOutcome::NeedMorePoints;
        }
        let new_stage = (stage + 1).min(MAX_STAGE);
        self.plants[slot] = Some(new_stage);
        self.current_water_points = 0;
        WaterOutcome::Grown {
            new_stage,
            garden_complete: new_stage == MAX_STAGE && self.blooming_count() == GRID_SIZE,
        }
    }

    /// Fold a fresh ledger read into the gauge. Only positive deltas count,
    /// and the gauge caps at the watering threshold. Returns the gained
    /// amount when anything changed.
    pub fn sync_points(&mut self, ledger_total: i64) -> Option<i64> {
        if ledger_total <= self.total_points {
            return None;
        }
        let gained = ledger_total - self.total_points;
        self.total_points = ledger_total;
        self.current_water_points = (self.current_water_points + gained).min(XP_TO_WATER);
        Some(gained)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Test hook: +10 XP to both the ledger and the gauge.
    pub fn debug_grant(&mut self) {
        self.total_points += XP_PER_ANSWER;
        self.current_water_points = (self.current_water_points + XP_PER_ANSWER).min(XP_TO_WATER);
    }

    /// Test hook: advance the next occupied slot by one stage, wrapping a
    /// blooming plant back to an empty slot. The cursor steps before each
    /// occupancy check, at most one full lap around the grid.
    pub fn debug_cycle(&mut self) -> DebugCycleOutcome {
        let mut found = false;
        for _ in 0..GRID_SIZE {
            self.debug_cursor = (self.debug_cursor + 1) % GRID_SIZE;
            if self.plants[self.debug_cursor].is_some() {
                found = true;
                break;
            }
        }
        let slot = self.debug_cursor;
        let stage = match self.plants[slot] {
            Some(stage) if found => stage,
            _ => return DebugCycleOutcome::NoPlants,
        };
        let next = (stage + 1) % (MAX_STAGE + 1);
        if next == 0 {
            self.plants[slot] = None;
            DebugCycleOutcome::Removed { slot }
        } else {
            self.plants[slot] = Some(next);
            DebugCycleOutcome::Advanced {
                slot,
                new_stage: next,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planting_consumes_seeds_and_stops_at_three() {
        let mut g = GardenState::default();

        assert_eq!(
            g.plant(0),
            PlantOutcome::Planted { seeds_left: 2, last_seed: false }
        );
        assert_eq!(
            g.plant(3),
            PlantOutcome::Planted { seeds_left: 1, last_seed: false }
        );
        assert_eq!(
            g.plant(5),
            PlantOutcome::Planted { seeds_left: 0, last_seed: true }
        );
        assert_eq!(g.seeds_used, MAX_SEEDS);
        assert_eq!(g.occupied_count(), 3);

        // Fourth seed is rejected, state unchanged.
        let before = g.clone();
        assert_eq!(g.plant(1), PlantOutcome::OutOfSeeds);
        assert_eq!(g, before);
    }

    #[test]
    fn occupied_slots_never_exceed_seeds_used() {
        let mut g = GardenState::default();
        for slot in [0, 0, 1, 1, 2, 4, 5] {
            let _ = g.plant(slot);
            assert!(g.occupied_count() <= g.seeds_used as usize);
            assert!(g.seeds_used <= MAX_SEEDS);
        }
    }

    #[test]
    fn planting_occupied_slot_is_a_silent_noop() {
        let mut g = GardenState::default();
        let _ = g.plant(2);
        let before = g.clone();
        assert_eq!(g.plant(2), PlantOutcome::SlotOccupied);
        assert_eq!(g, before);
        assert_eq!(g.seeds_used, 1);
    }

    #[test]
    fn watering_needs_a_full_gauge() {
        let mut g = GardenState::default();
        let _ = g.plant(0);
        g.current_water_points = XP_TO_WATER - 1;

        assert_eq!(g.water(0), WaterOutcome::NeedMorePoints);
        assert_eq!(g.plants[0], Some(1));
        assert_eq!(g.current_water_points, XP_TO_WATER - 1);
    }

    #[test]
    fn watering_grows_one_stage_and_drains_the_gauge() {
        let mut g = GardenState::default();
        g.plants[1] = Some(2);
        g.current_water_points = XP_TO_WATER;
        assert!(g.can_water());

        assert_eq!(
            g.water(1),
            WaterOutcome::Grown { new_stage: 3, garden_complete: false }
        );
        assert_eq!(g.plants[1], Some(3));
        assert_eq!(g.current_water_points, 0);
        assert!(!g.can_water());
    }

    #[test]
    fn watering_empty_or_blooming_slots_is_a_noop() {
        let mut g = GardenState::default();
        g.plants[3] = Some(MAX_STAGE);
        g.current_water_points = XP_TO_WATER;
        let before = g.clone();

        assert_eq!(g.water(0), WaterOutcome::Ignored);
        assert_eq!(g.water(3), WaterOutcome::Ignored);
        assert_eq!(g, before);
    }

    #[test]
    fn stages_are_monotone_and_capped() {
        let mut g = GardenState::default();
        let _ = g.plant(0);
        for _ in 0..10 {
            let prev = g.plants[0];
            g.current_water_points = XP_TO_WATER;
            let _ = g.water(0);
            assert!(g.plants[0] >= prev);
            assert!(g.plants[0] <= Some(MAX_STAGE));
        }
        assert_eq!(g.plants[0], Some(MAX_STAGE));
    }

    #[test]
    fn sync_adds_only_positive_deltas_and_caps_the_gauge() {
        let mut g = GardenState::default();

        assert_eq!(g.sync_points(30), Some(30));
        assert_eq!(g.current_water_points, 30);
        assert!(!g.can_water());

        assert_eq!(g.sync_points(60), Some(30));
        assert_eq!(g.current_water_points, XP_TO_WATER);
        assert!(g.can_water());
        assert_eq!(g.total_points, 60);

        // Same or lower totals change nothing.
        assert_eq!(g.sync_points(60), None);
        assert_eq!(g.sync_points(10), None);
        assert_eq!(g.total_points, 60);
        assert_eq!(g.current_water_points, XP_TO_WATER);
    }

    #[test]
    fn gauge_threshold_is_exact() {
        let mut g = GardenState::default();
        g.current_water_points = XP_TO_WATER - 1;
        assert!(!g.can_water());
        g.current_water_points = XP_TO_WATER;
        assert!(g.can_water());
    }

    #[test]
    fn garden_completes_exactly_once_on_the_finishing_action() {
        let mut g = GardenState::default();
        g.plants = [Some(MAX_STAGE); GRID_SIZE];
        g.plants[4] = Some(3);
        g.current_water_points = XP_TO_WATER;

        match g.water(4) {
            WaterOutcome::Grown { garden_complete, .. } => assert!(garden_complete),
            other => panic!("expected growth, got {:?}", other),
        }

        // Re-watering the finished garden stays a no-op, no second fire.
        g.current_water_points = XP_TO_WATER;
        for slot in 0..GRID_SIZE {
            assert_eq!(g.water(slot), WaterOutcome::Ignored);
        }
    }

    #[test]
    fn growing_a_plant_to_max_in_a_sparse_garden_does_not_complete() {
        let mut g = GardenState::default();
        g.plants[0] = Some(3);
        g.current_water_points = XP_TO_WATER;
        assert_eq!(
            g.water(0),
            WaterOutcome::Grown { new_stage: MAX_STAGE, garden_complete: false }
        );
    }

    #[test]
    fn plant_level_is_floor_of_fifty_capped_at_four() {
        assert_eq!(plant_level(0), 0);
        assert_eq!(plant_level(49), 0);
        assert_eq!(plant_level(50), 1);
        assert_eq!(plant_level(149), 2);
        assert_eq!(plant_level(200), 4);
        assert_eq!(plant_level(10_000), 4);
    }

    #[test]
    fn debug_cycle_skips_empty_slots_and_wraps_to_removal() {
        let mut g = GardenState::default();
        assert_eq!(g.debug_cycle(), DebugCycleOutcome::NoPlants);

        g.plants[2] = Some(3);
        assert_eq!(
            g.debug_cycle(),
            DebugCycleOutcome::Advanced { slot: 2, new_stage: 4 }
        );
        assert_eq!(g.debug_cycle(), DebugCycleOutcome::Removed { slot: 2 });
        assert_eq!(g.plants[2], None);
        assert_eq!(g.debug_cycle(), DebugCycleOutcome::NoPlants);
    }

    #[test]
    fn debug_grant_raises_ledger_and_capped_gauge_together() {
        let mut g = GardenState::default();
        g.current_water_points = 45;
        g.total_points = 45;

        g.debug_grant();
        assert_eq!(g.total_points, 55);
        assert_eq!(g.current_water_points, XP_TO_WATER);
        assert!(g.can_water());
    }

    #[test]
    fn reset_returns_to_the_initial_empty_garden() {
        let mut g = GardenState::default();
        let _ = g.plant(0);
        let _ = g.sync_points(120);
        g.reset();
        assert_eq!(g, GardenState::default());
    }
}
