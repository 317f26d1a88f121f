use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalKind {
    WeeklyWorkouts,
    ExerciseWeight,
    MonthlyVolume,
}

impl GoalKind {
    pub const ALL: [GoalKind; 3] = [
        GoalKind::WeeklyWorkouts,
        GoalKind::ExerciseWeight,
        GoalKind::MonthlyVolume,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::WeeklyWorkouts => "weekly_workouts",
            GoalKind::ExerciseWeight => "exercise_weight",
            GoalKind::MonthlyVolume => "monthly_volume",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn label(&self) -> &'static str {
        match self {
            GoalKind::WeeklyWorkouts => "Workouts this week",
            GoalKind::ExerciseWeight => "Lift a target weight",
            GoalKind::MonthlyVolume => "Volume this month",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    pub kind: GoalKind,
    pub exercise_id: Option<String>,
    pub target_value: f64,
    pub deadline: Option<NaiveDate>,
    pub achieved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FromSqliteRow for Goal {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind: String = row.get("kind")?;
        let kind = GoalKind::parse(&kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown goal kind: {}", kind).into(),
            )
        })?;
        Ok(Self {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            kind,
            exercise_id: row.get("exercise_id")?,
            target_value: row.get("target_value")?,
            deadline: row.get("deadline")?,
            achieved_at: row.get("achieved_at")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GoalForm {
    pub kind: String,
    #[serde(default)]
    pub exercise_id: Option<String>,
    #[serde(default)]
    pub target_value: Option<String>,
    #[serde(default)]
    pub deadline: Option<String>,
}

impl GoalForm {
    /// A finite, positive target. Blank or unparseable input is rejected
    /// with the same message.
    pub fn target_value(&self) -> Result<f64, &'static str> {
        self.target_value
            .as_deref()
            .map(str::trim)
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value > 0.0)
            .ok_or("Target must be positive")
    }

    pub fn exercise_id(&self) -> Option<&str> {
        self.exercise_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Blank means no deadline; anything else must be `YYYY-MM-DD`.
    pub fn deadline(&self) -> Result<Option<NaiveDate>, &'static str> {
        match self.deadline.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Some)
                .map_err(|_| "Deadline must be a date"),
        }
    }
}

/// Current values every goal kind is measured against.
#[derive(Debug, Clone, Default)]
pub struct GoalMetrics {
    pub workouts_this_week: i64,
    pub volume_this_month: f64,
    pub best_weight_by_exercise: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub goal: Goal,
    pub title: String,
    pub current_value: f64,
    pub percent: u8,
}

impl GoalProgress {
    pub fn compute(goal: Goal, title: String, metrics: &GoalMetrics) -> Self {
        let current_value = match goal.kind {
            GoalKind::WeeklyWorkouts => metrics.workouts_this_week as f64,
            GoalKind::MonthlyVolume => metrics.volume_this_month,
            GoalKind::ExerciseWeight => goal
                .exercise_id
                .as_ref()
                .and_then(|id| metrics.best_weight_by_exercise.get(id))
                .copied()
                .unwrap_or(0.0),
        };
        let percent = progress_percent(current_value, goal.target_value);
        Self {
            goal,
            title,
            current_value,
            percent,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.percent >= 100
    }
}

/// `min(100, current / target * 100)`, rounded down.
pub fn progress_percent(current: f64, target: f64) -> u8 {
    if target <= 0.0 || !current.is_finite() {
        return 0;
    }
    let percent = (current / target * 100.0).floor();
    percent.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(kind: GoalKind, exercise_id: Option<&str>, target: f64) -> Goal {
        Goal {
            id: "g1".to_string(),
            user_id: "u1".to_string(),
            kind,
            exercise_id: exercise_id.map(str::to_string),
            target_value: target,
            deadline: None,
            achieved_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(0.0, 4.0), 0);
        assert_eq!(progress_percent(1.0, 3.0), 33);
        assert_eq!(progress_percent(4.0, 4.0), 100);
        assert_eq!(progress_percent(9.0, 4.0), 100);
        assert_eq!(progress_percent(5.0, 0.0), 0);
    }

    #[test]
    fn test_compute_for_each_kind() {
        let mut metrics = GoalMetrics {
            workouts_this_week: 2,
            volume_this_month: 15_000.0,
            ..Default::default()
        };
        metrics
            .best_weight_by_exercise
            .insert("bench".to_string(), 90.0);

        let weekly = GoalProgress::compute(goal(GoalKind::WeeklyWorkouts, None, 4.0), String::new(), &metrics);
        assert_eq!(weekly.percent, 50);

        let volume = GoalProgress::compute(goal(GoalKind::MonthlyVolume, None, 10_000.0), String::new(), &metrics);
        assert!(volume.is_complete());

        let lift = GoalProgress::compute(goal(GoalKind::ExerciseWeight, Some("bench"), 100.0), String::new(), &metrics);
        assert_eq!(lift.current_value, 90.0);
        assert_eq!(lift.percent, 90);

        let unknown = GoalProgress::compute(goal(GoalKind::ExerciseWeight, Some("squat"), 100.0), String::new(), &metrics);
        assert_eq!(unknown.percent, 0);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(GoalKind::parse("monthly_volume"), Some(GoalKind::MonthlyVolume));
        assert_eq!(GoalKind::parse("yearly"), None);
    }

    #[test]
    fn test_form_deadline() {
        let mut form = GoalForm {
            kind: "weekly_workouts".to_string(),
            exercise_id: Some("".to_string()),
            target_value: Some("3".to_string()),
            deadline: Some("".to_string()),
        };
        assert_eq!(form.deadline(), Ok(None));
        assert_eq!(form.exercise_id(), None);

        form.deadline = Some("2024-12-31".to_string());
        assert_eq!(form.deadline(), Ok(NaiveDate::from_ymd_opt(2024, 12, 31)));

        form.deadline = Some("soon".to_string());
        assert!(form.deadline().is_err());
    }

    #[test]
    fn test_form_target_value() {
        let mut form = GoalForm {
            kind: "monthly_volume".to_string(),
            exercise_id: None,
            target_value: Some(" 2500.5 ".to_string()),
            deadline: None,
        };
        assert_eq!(form.target_value(), Ok(2500.5));

        for raw in ["", "   ", "lots", "0", "-10", "NaN", "inf"] {
            form.target_value = Some(raw.to_string());
            assert_eq!(form.target_value(), Err("Target must be positive"), "{raw:?}");
        }

        form.target_value = None;
        assert!(form.target_value().is_err());
    }
}
