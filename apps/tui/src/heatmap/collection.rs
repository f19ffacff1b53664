use crate::domain::Report;
use std::collections::VecDeque;

/// In-memory reports, newest first.
///
/// Only grows for the lifetime of a session; live inserts are prepended in
/// delivery order.
#[derive(Debug, Clone, Default)]
pub struct ReportCollection {
    reports: VecDeque<Report>,
}

impl ReportCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from a list already ordered newest first, as returned by the
    /// store.
    pub fn from_newest_first(reports: Vec<Report>) -> Self {
        Self {
            reports: reports.into(),
        }
    }

    pub fn prepend(&mut self, report: Report) {
        self.reports.push_front(report);
    }

    /// Swaps the whole collection for a fresh listing.
    pub fn replace(&mut self, reports: Vec<Report>) {
        self.reports = reports.into();
    }

    pub fn get(&self, index: usize) -> Option<&Report> {
        self.reports.get(index)
    }

    pub fn newest(&self) -> Option<&Report> {
        self.reports.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
