pub mod api;
pub mod auth;
pub mod community;
pub mod dashboard;
pub mod exercises;
pub mod goals;
pub mod health;
pub mod history;
pub mod photos;
pub mod progress;
pub mod settings;
pub mod workouts;

use askama::Template;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::error::Result;

pub const PAGE_SIZE: i64 = 10;

/// Highest page whose offset still fits in an `i64`.
const MAX_PAGE: i64 = i64::MAX / PAGE_SIZE;

pub(crate) fn render<T: Template>(template: &T) -> Result<Response> {
    Ok(Html(template.render()?).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<i64>,
}

impl PageQuery {
    /// 1-based page number, clamped to `1..=MAX_PAGE`.
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(PAGE_SIZE)
    }
}

pub fn total_pages(total: i64) -> i64 {
    ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1)
}
