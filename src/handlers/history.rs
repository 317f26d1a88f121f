use std::collections::HashMap;

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::NaiveDate;
use serde::Deserialize;

use super::render;
use crate::error::Result;
use crate::middleware::AuthUser;
use crate::models::calendar::{month_after, parse_month, MonthCalendar};
use crate::models::Workout;
use crate::progress::{local_today, month_start};
use crate::repositories::WorkoutRepository;

#[derive(Clone)]
pub struct HistoryState {
    pub workout_repo: WorkoutRepository,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    month: Option<String>,
}

/// Workouts of one day, listed under the calendar.
pub struct DayEntry {
    pub date: NaiveDate,
    pub workouts: Vec<Workout>,
}

#[derive(Template)]
#[template(path = "history/index.html")]
struct HistoryTemplate {
    user: AuthUser,
    calendar: MonthCalendar,
    days: Vec<DayEntry>,
}

/// Group workouts (oldest first) into per-day entries.
pub fn group_by_day(workouts: Vec<Workout>) -> Vec<DayEntry> {
    let mut days: Vec<DayEntry> = Vec::new();
    for workout in workouts {
        match days.last_mut() {
            Some(day) if day.date == workout.performed_on => day.workouts.push(workout),
            _ => days.push(DayEntry {
                date: workout.performed_on,
                workouts: vec![workout],
            }),
        }
    }
    days
}

pub async fn index(
    State(state): State<HistoryState>,
    auth_user: AuthUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Response> {
    let today = local_today();
    let first_day = query
        .month
        .as_deref()
        .and_then(parse_month)
        .unwrap_or_else(|| month_start(today));

    let workouts = state
        .workout_repo
        .find_by_user_between(&auth_user.id, first_day, month_after(first_day))
        .await?;

    let mut counts: HashMap<NaiveDate, usize> = HashMap::new();
    for workout in &workouts {
        *counts.entry(workout.performed_on).or_default() += 1;
    }

    render(&HistoryTemplate {
        user: auth_user,
        calendar: MonthCalendar::build(first_day, today, &counts),
        days: group_by_day(workouts),
    })
}
