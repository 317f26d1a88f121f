use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub category: String,
}

impl Exercise {
    pub fn category_label(&self) -> &'static str {
        category_label(&self.category)
    }
}

impl FromSqliteRow for Exercise {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            category: row.get("category")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ExerciseForm {
    pub name: String,
    pub category: String,
}

impl ExerciseForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Exercise name is required");
        }
        if self.name.trim().chars().count() > 80 {
            return Err("Exercise name must be at most 80 characters");
        }
        if !CATEGORIES.iter().any(|c| c.name == self.category) {
            return Err("Unknown category");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseCategory {
    pub name: &'static str,
    pub display_name: &'static str,
}

pub const CATEGORIES: &[ExerciseCategory] = &[
    ExerciseCategory { name: "chest", display_name: "Chest" },
    ExerciseCategory { name: "back", display_name: "Back" },
    ExerciseCategory { name: "legs", display_name: "Legs" },
    ExerciseCategory { name: "shoulders", display_name: "Shoulders" },
    ExerciseCategory { name: "arms", display_name: "Arms" },
    ExerciseCategory { name: "core", display_name: "Core" },
    ExerciseCategory { name: "cardio", display_name: "Cardio" },
];

/// Library every new account starts with.
pub const DEFAULT_EXERCISES: &[(&str, &str)] = &[
    ("Bench Press", "chest"),
    ("Incline Dumbbell Press", "chest"),
    ("Deadlift", "back"),
    ("Barbell Row", "back"),
    ("Pull Up", "back"),
    ("Back Squat", "legs"),
    ("Romanian Deadlift", "legs"),
    ("Overhead Press", "shoulders"),
    ("Lateral Raise", "shoulders"),
    ("Barbell Curl", "arms"),
    ("Triceps Pushdown", "arms"),
    ("Plank", "core"),
    ("Rowing Machine", "cardio"),
];

pub fn category_label(name: &str) -> &'static str {
    CATEGORIES
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.display_name)
        .unwrap_or("Other")
}
