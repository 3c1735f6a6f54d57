//! Exercise Catalog
//!
//! Static, read-only exercise records used to label workouts and history rows,
//! together with the recommended rest time for each kind of exercise.

use serde::{Deserialize, Serialize};

use crate::core::constants::{
    BODYWEIGHT_REST_SECONDS, COMPOUND_REST_SECONDS, DEFAULT_REST_SECONDS, DUMBBELL_REST_SECONDS,
    ISOLATION_REST_SECONDS,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Cable,
    Bodyweight,
    Machine,
    Kettlebell,
    Bands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Chest,
    Back,
    Legs,
    Shoulders,
    Arms,
    Core,
    Glutes,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Lats,
    Rhomboids,
    Traps,
    LowerBack,
    FrontDelts,
    SideDelts,
    RearDelts,
    Biceps,
    Triceps,
    Forearms,
    Abs,
    Obliques,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    HipFlexors,
    Adductors,
    Abductors,
}

/// How sets of an exercise are recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingType {
    #[default]
    WeightReps,
    Time,
    DistanceTime,
    RepsOnly,
}

/// An exercise as referenced by workouts and history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub equipment: Equipment,
    pub primary_muscles: Vec<MuscleGroup>,
    #[serde(default)]
    pub secondary_muscles: Vec<MuscleGroup>,
    #[serde(default)]
    pub tracking_type: TrackingType,
}

impl Exercise {
    /// Recommended rest between sets of this exercise, in seconds.
    pub fn default_rest_seconds(&self) -> u32 {
        default_rest_seconds(self.category, self.equipment)
    }
}

/// Static catalog row.
#[derive(Debug)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub equipment: Equipment,
    pub primary: &'static [MuscleGroup],
    pub secondary: &'static [MuscleGroup],
}

impl CatalogEntry {
    pub fn to_exercise(&self) -> Exercise {
        Exercise {
            id: self.id.to_string(),
            name: self.name.to_string(),
            category: self.category,
            equipment: self.equipment,
            primary_muscles: self.primary.to_vec(),
            secondary_muscles: self.secondary.to_vec(),
            tracking_type: TrackingType::default(),
        }
    }
}

macro_rules! entry {
    ($id:literal, $name:literal, $cat:ident, $eq:ident, [$($p:ident),*], [$($s:ident),*]) => {
        CatalogEntry {
            id: $id,
            name: $name,
            category: Category::$cat,
            equipment: Equipment::$eq,
            primary: &[$(MuscleGroup::$p),*],
            secondary: &[$(MuscleGroup::$s),*],
        }
    };
}

pub static EXERCISES: &[CatalogEntry] = &[
    entry!("1", "Barbell Bench Press", Chest, Barbell, [Chest], [FrontDelts, Triceps]),
    entry!("2", "Incline Barbell Press", Chest, Barbell, [Chest], [FrontDelts, Triceps]),
    entry!("4", "Dumbbell Bench Press", Chest, Dumbbell, [Chest], [FrontDelts, Triceps]),
    entry!("7", "Dumbbell Flyes", Chest, Dumbbell, [Chest], [FrontDelts]),
    entry!("9", "Cable Flyes", Chest, Cable, [Chest], [FrontDelts]),
    entry!("12", "Push-ups", Chest, Bodyweight, [Chest], [Triceps, FrontDelts]),
    entry!("16", "Chest Dips", Chest, Bodyweight, [Chest], [Triceps, FrontDelts]),
    entry!("18", "Chest Press Machine", Chest, Machine, [Chest], [Triceps, FrontDelts]),
    entry!("21", "Pull-ups", Back, Bodyweight, [Lats, Rhomboids], [Biceps, RearDelts]),
    entry!("22", "Chin-ups", Back, Bodyweight, [Lats, Biceps], [Rhomboids]),
    entry!("25", "Lat Pulldown", Back, Cable, [Lats], [Biceps, Rhomboids]),
    entry!("29", "Barbell Row", Back, Barbell, [Rhomboids, Lats], [Biceps, RearDelts]),
    entry!("33", "Dumbbell Row", Back, Dumbbell, [Lats, Rhomboids], [Biceps]),
    entry!("35", "Cable Row", Back, Cable, [Rhomboids, Lats], [Biceps]),
    entry!("36", "Face Pulls", Back, Cable, [RearDelts, Rhomboids], [Traps]),
    entry!("37", "Deadlift", Back, Barbell, [LowerBack, Glutes, Hamstrings], [Traps, Lats, Quads]),
    entry!("39", "Romanian Deadlift", Back, Barbell, [Hamstrings, Glutes, LowerBack], []),
    entry!("44", "Overhead Press", Shoulders, Barbell, [FrontDelts, SideDelts], [Triceps, Traps]),
    entry!("46", "Dumbbell Shoulder Press", Shoulders, Dumbbell, [FrontDelts, SideDelts], [Triceps]),
    entry!("48", "Lateral Raises", Shoulders, Dumbbell, [SideDelts], []),
    entry!("56", "Barbell Curl", Arms, Barbell, [Biceps], [Forearms]),
    entry!("58", "Hammer Curl", Arms, Dumbbell, [Biceps, Forearms], []),
    entry!("62", "Cable Curl", Arms, Cable, [Biceps], []),
    entry!("67", "Tricep Pushdown", Arms, Cable, [Triceps], []),
    entry!("69", "Back Squat", Legs, Barbell, [Quads, Glutes], [Hamstrings, LowerBack]),
    entry!("70", "Front Squat", Legs, Barbell, [Quads], [Glutes, Abs]),
    entry!("72", "Goblet Squat", Legs, Dumbbell, [Quads, Glutes], [Abs]),
    entry!("73", "Bulgarian Split Squat", Legs, Dumbbell, [Quads, Glutes], [Hamstrings]),
    entry!("76", "Leg Press", Legs, Machine, [Quads], [Glutes, Hamstrings]),
    entry!("79", "Leg Curl", Legs, Machine, [Hamstrings], []),
    entry!("81", "Hip Thrust", Glutes, Barbell, [Glutes], [Hamstrings]),
    entry!("82", "Glute Bridge", Glutes, Bodyweight, [Glutes], [Hamstrings]),
    entry!("84", "Standing Calf Raise", Legs, Machine, [Calves], []),
    entry!("87", "Plank", Core, Bodyweight, [Abs], [Obliques]),
    entry!("92", "Leg Raises", Core, Bodyweight, [Abs], [HipFlexors]),
    entry!("96", "Cable Crunches", Core, Cable, [Abs], []),
    entry!("103", "Power Clean", Legs, Barbell, [Quads, Glutes, Traps], [LowerBack]),
];

/// `default_rest_seconds` function.
///
/// Recommended rest for an exercise kind: compound barbell and leg work gets the
/// longest break, isolation work the shortest.
pub fn default_rest_seconds(category: Category, equipment: Equipment) -> u32 {
    match (category, equipment) {
        (_, Equipment::Barbell) | (Category::Legs, _) => COMPOUND_REST_SECONDS,
        (_, Equipment::Dumbbell) => DUMBBELL_REST_SECONDS,
        (_, Equipment::Bodyweight) => BODYWEIGHT_REST_SECONDS,
        (_, Equipment::Cable) | (Category::Arms, _) => ISOLATION_REST_SECONDS,
        _ => DEFAULT_REST_SECONDS,
    }
}

/// Looks an exercise up by its catalog id.
pub fn find_exercise(id: &str) -> Option<Exercise> {
    EXERCISES
        .iter()
        .find(|entry| entry.id == id)
        .map(CatalogEntry::to_exercise)
}

/// All catalog exercises of a category, in catalog order.
pub fn exercises_in(category: Category) -> Vec<Exercise> {
    EXERCISES
        .iter()
        .filter(|entry| entry.category == category)
        .map(CatalogEntry::to_exercise)
        .collect()
}

/// Case-insensitive name search. An empty query matches everything.
pub fn search_exercises(query: &str) -> Vec<Exercise> {
    let needle = query.trim().to_lowercase();
    EXERCISES
        .iter()
        .filter(|entry| entry.name.to_lowercase().contains(&needle))
        .map(CatalogEntry::to_exercise)
        .collect()
}
