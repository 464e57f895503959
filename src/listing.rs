use serde::Serialize;

use crate::models::{Project, ProjectSummary};

pub const PROJECTS_PER_PAGE: usize = 6;

/// One page of a user's projects after name filtering.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectSummary>,
    /// Projects the user owns before filtering.
    pub owned: usize,
    /// Projects matching the search term.
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
    pub per_page: usize,
}

/// Case-insensitive substring search on the name, then a 1-based page.
/// Out-of-range pages are clamped into `1..=total_pages`.
pub fn paginate(projects: &[Project], search: &str, page: usize) -> ProjectPage {
    let owned = projects.len();
    let needle = search.trim().to_lowercase();
    let matching: Vec<&Project> = projects
        .iter()
        .filter(|p| needle.is_empty() || p.project_name.to_lowercase().contains(&needle))
        .collect();

    let total = matching.len();
    let total_pages = total.div_ceil(PROJECTS_PER_PAGE);
    let page = page.clamp(1, total_pages.max(1));

    let page_items = matching
        .into_iter()
        .skip((page - 1) * PROJECTS_PER_PAGE)
        .take(PROJECTS_PER_PAGE)
        .map(|p| p.summary())
        .collect();

    ProjectPage {
        projects: page_items,
        owned,
        total,
        page,
        total_pages,
        per_page: PROJECTS_PER_PAGE,
    }
}
