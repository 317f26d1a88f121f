//! Personal records, derived from set history on every read.
//!
//! Nothing is stored: deleting or editing a set can never leave a stale
//! record behind.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Serialize;

use super::workout_set::WorkoutSetWithExercise;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalRecord {
    pub exercise_id: String,
    pub exercise_name: String,
    pub set_id: String,
    pub workout_id: String,
    pub weight_kg: f64,
    pub reps: i64,
    pub estimated_one_rep_max: f64,
    pub performed_on: NaiveDate,
}

impl PersonalRecord {
    fn from_set(set: &WorkoutSetWithExercise) -> Self {
        Self {
            exercise_id: set.exercise_id.clone(),
            exercise_name: set.exercise_name.clone(),
            set_id: set.id.clone(),
            workout_id: set.workout_id.clone(),
            weight_kg: set.weight_kg,
            reps: set.reps,
            estimated_one_rep_max: estimated_one_rep_max(set.weight_kg, set.reps),
            performed_on: set.performed_on,
        }
    }
}

/// Epley estimate; a single rep is the weight itself.
pub fn estimated_one_rep_max(weight_kg: f64, reps: i64) -> f64 {
    if reps <= 1 {
        weight_kg
    } else {
        weight_kg * (1.0 + reps as f64 / 30.0)
    }
}

/// Heavier wins, then more reps, then the earlier date.
pub fn beats(candidate: &WorkoutSetWithExercise, current: &WorkoutSetWithExercise) -> bool {
    if candidate.weight_kg != current.weight_kg {
        return candidate.weight_kg > current.weight_kg;
    }
    if candidate.reps != current.reps {
        return candidate.reps > current.reps;
    }
    candidate.performed_on < current.performed_on
}

/// Best set per exercise, heaviest first.
pub fn compute_records(history: &[WorkoutSetWithExercise]) -> Vec<PersonalRecord> {
    let mut best: HashMap<&str, &WorkoutSetWithExercise> = HashMap::new();

    for set in history {
        match best.get(set.exercise_id.as_str()) {
            Some(current) if !beats(set, current) => {}
            _ => {
                best.insert(set.exercise_id.as_str(), set);
            }
        }
    }

    let mut records: Vec<_> = best.values().map(|set| PersonalRecord::from_set(set)).collect();
    records.sort_by(|a, b| {
        b.weight_kg
            .total_cmp(&a.weight_kg)
            .then_with(|| a.exercise_name.cmp(&b.exercise_name))
    });
    records
}

pub fn record_for_exercise(
    history: &[WorkoutSetWithExercise],
    exercise_id: &str,
) -> Option<PersonalRecord> {
    history
        .iter()
        .filter(|set| set.exercise_id == exercise_id)
        .fold(None::<&WorkoutSetWithExercise>, |best, set| match best {
            Some(current) if !beats(set, current) => Some(current),
            _ => Some(set),
        })
        .map(PersonalRecord::from_set)
}

pub fn record_set_ids(records: &[PersonalRecord]) -> HashSet<String> {
    records.iter().map(|r| r.set_id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(id: &str, exercise: &str, weight: f64, reps: i64, day: u32) -> WorkoutSetWithExercise {
        WorkoutSetWithExercise {
            id: id.to_string(),
            workout_id: format!("w{}", day),
            exercise_id: exercise.to_string(),
            exercise_name: format!("Exercise {}", exercise),
            performed_on: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            set_number: 1,
            reps,
            weight_kg: weight,
            rest_seconds: None,
        }
    }

    #[test]
    fn test_estimated_one_rep_max() {
        assert_eq!(estimated_one_rep_max(100.0, 1), 100.0);
        assert!((estimated_one_rep_max(100.0, 10) - 133.333_333).abs() < 1e-3);
    }

    #[test]
    fn test_heaviest_set_wins() {
        let history = vec![
            set("a", "bench", 100.0, 5, 1),
            set("b", "bench", 105.0, 1, 2),
            set("c", "bench", 95.0, 10, 3),
        ];
        let records = compute_records(&history);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].set_id, "b");
    }

    #[test]
    fn test_ties_prefer_more_reps_then_earlier_date() {
        let history = vec![
            set("late", "squat", 140.0, 5, 20),
            set("more_reps", "squat", 140.0, 6, 25),
            set("early", "squat", 140.0, 6, 10),
        ];
        let record = record_for_exercise(&history, "squat").unwrap();
        assert_eq!(record.set_id, "early");
    }

    #[test]
    fn test_records_sorted_heaviest_first() {
        let history = vec![
            set("a", "curl", 20.0, 10, 1),
            set("b", "deadlift", 200.0, 3, 1),
            set("c", "bench", 100.0, 5, 1),
        ];
        let names: Vec<_> = compute_records(&history)
            .into_iter()
            .map(|r| r.exercise_id)
            .collect();
        assert_eq!(names, vec!["deadlift", "bench", "curl"]);
    }

    #[test]
    fn test_record_for_missing_exercise() {
        let history = vec![set("a", "curl", 20.0, 10, 1)];
        assert!(record_for_exercise(&history, "bench").is_none());
        assert!(compute_records(&[]).is_empty());
    }

    #[test]
    fn test_record_set_ids() {
        let history = vec![set("a", "curl", 20.0, 10, 1), set("b", "curl", 22.0, 8, 2)];
        let ids = record_set_ids(&compute_records(&history));
        assert!(ids.contains("b"));
        assert!(!ids.contains("a"));
    }
}
