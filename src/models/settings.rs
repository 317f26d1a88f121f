use std::borrow::Borrow;

use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

pub const KG_PER_LB: f64 = 0.453_592_37;
pub const MAX_REST_SECONDS: i64 = 3600;
pub const DEFAULT_REST_SECONDS: i64 = 90;
pub const DISPLAY_NAME_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    #[default]
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "lb" => WeightUnit::Lb,
            _ => WeightUnit::Kg,
        }
    }

    /// Convert a weight entered in this unit to kilograms.
    pub fn to_kg(&self, value: f64) -> f64 {
        match self {
            WeightUnit::Kg => value,
            WeightUnit::Lb => value * KG_PER_LB,
        }
    }

    /// Convert a stored kilogram weight into this unit.
    pub fn from_kg(&self, kg: f64) -> f64 {
        match self {
            WeightUnit::Kg => kg,
            WeightUnit::Lb => kg / KG_PER_LB,
        }
    }

    /// Display a stored kilogram weight, e.g. "102.5 kg".
    /// Accepts `f64` or `&f64`; templates pass fields by reference.
    pub fn format(&self, kg: impl Borrow<f64>) -> String {
        let value = self.from_kg(*kg.borrow());
        let rounded = (value * 10.0).round() / 10.0;
        if rounded.fract() == 0.0 {
            format!("{:.0} {}", rounded, self.as_str())
        } else {
            format!("{:.1} {}", rounded, self.as_str())
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSettings {
    pub user_id: String,
    pub display_name: String,
    pub weight_unit: WeightUnit,
    pub default_rest_seconds: i64,
    pub share_by_default: bool,
}

impl UserSettings {
    pub fn defaults_for(user_id: &str, username: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            display_name: username.to_string(),
            weight_unit: WeightUnit::Kg,
            default_rest_seconds: DEFAULT_REST_SECONDS,
            share_by_default: false,
        }
    }
}

impl FromSqliteRow for UserSettings {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let unit: String = row.get("weight_unit")?;
        Ok(Self {
            user_id: row.get("user_id")?,
            display_name: row.get("display_name")?,
            weight_unit: WeightUnit::parse(&unit),
            default_rest_seconds: row.get("default_rest_seconds")?,
            share_by_default: row.get("share_by_default")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    pub display_name: String,
    pub weight_unit: String,
    pub default_rest_seconds: i64,
    // Unchecked checkboxes are absent from the form body.
    #[serde(default)]
    pub share_by_default: Option<String>,
}

impl SettingsForm {
    pub fn validate(&self) -> Result<(), &'static str> {
        let name = self.display_name.trim();
        if name.is_empty() {
            return Err("Display name is required");
        }
        if name.chars().count() > DISPLAY_NAME_MAX_LEN {
            return Err("Display name must be at most 50 characters");
        }
        if !(0..=MAX_REST_SECONDS).contains(&self.default_rest_seconds) {
            return Err("Default rest must be between 0 and 3600 seconds");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
}
