//! This module turns a pace and a number of remaining pages into a dated,
//! day-by-day reading schedule, via the `project` function.
//!
//! Projection is cheap and has no side effects, so callers recompute the
//! whole schedule whenever an input changes rather than patching an old
//! one. `ScheduleMemo` skips the recomputation when nothing changed.

use std::cmp;

use chrono::{Days, NaiveDate};
use serde::Serialize;

/// The most entries a single projection will ever produce.
///
/// A pace of one page a day on a very long book would otherwise run for
/// years; one year of entries is plenty for a reading plan.
pub const MAX_PROJECTED_DAYS: usize = 365;

/// A single planned day of reading.
///
/// Entries are produced fresh by every projection and carry no identity
/// beyond their position in the schedule.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    date: NaiveDate,
    pages_planned_today: u32,
    /// First page read on this day (1-based, inclusive)
    start_page: u32,
    /// Last page read on this day (1-based, inclusive)
    end_page: u32,
    cumulative_pages_read: u32,
    percent_complete: u8,
}

impl ScheduleEntry {
    /// Returns the calendar date of this entry.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the number of pages to read on this day.
    pub fn pages_planned_today(&self) -> u32 {
        self.pages_planned_today
    }

    /// Returns the first page to read on this day.
    pub fn start_page(&self) -> u32 {
        self.start_page
    }

    /// Returns the last page to read on this day.
    pub fn end_page(&self) -> u32 {
        self.end_page
    }

    /// Returns the total number of pages read once this day is done.
    pub fn cumulative_pages_read(&self) -> u32 {
        self.cumulative_pages_read
    }

    /// Returns how much of the book is read once this day is done, as a
    /// whole percentage.
    pub fn percent_complete(&self) -> u8 {
        self.percent_complete
    }
}

/// Projects a reading schedule.
///
/// The schedule starts on `reference_date` if `starts_today` is set and on
/// the following day otherwise, and has one entry for every calendar day
/// until the book is finished. Each day covers `daily_pace` pages, except
/// the last, which covers whatever is left.
///
/// An empty schedule is returned when there is nothing left to read or
/// when `daily_pace` is not positive. At most `MAX_PROJECTED_DAYS` entries
/// are produced, so the last entry may fall short of `total_pages`.
pub fn project(pages_read: u32,
               total_pages: u32,
               daily_pace: i32,
               starts_today: bool,
               reference_date: NaiveDate)
               -> Vec<ScheduleEntry> {
    let remaining = total_pages.saturating_sub(pages_read);
    if remaining == 0 || daily_pace <= 0 {
        return Vec::new();
    }
    let pace = daily_pace as u32;

    let days_needed = (remaining / pace + if remaining % pace == 0 { 0 } else { 1 }) as usize;
    let mut entries = Vec::with_capacity(cmp::min(days_needed, MAX_PROJECTED_DAYS));
    let mut cumulative = pages_read;
    let mut offset = if starts_today { 0 } else { 1 };

    while cumulative < total_pages && entries.len() < MAX_PROJECTED_DAYS {
        // Only reachable at the very end of chrono's date range
        let date = match reference_date.checked_add_days(Days::new(offset)) {
            Some(d) => d,
            None => break,
        };
        let pages = cmp::min(pace, total_pages - cumulative);

        entries.push(ScheduleEntry {
            date: date,
            pages_planned_today: pages,
            start_page: cumulative + 1,
            end_page: cumulative + pages,
            cumulative_pages_read: cumulative + pages,
            percent_complete: percent_complete(cumulative + pages, total_pages),
        });

        cumulative += pages;
        offset += 1;
    }

    if cumulative < total_pages {
        warn!("schedule truncated after {} days with {} pages still unplanned",
              entries.len(),
              total_pages - cumulative);
    }

    entries
}

/// Returns `cumulative` as a percentage of `total`, rounded to the nearest
/// whole number with halves rounded up, and capped at 100.
///
/// A `total` of zero gives 0.
pub fn percent_complete(cumulative: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let (cumulative, total) = (cumulative as u64, total as u64);
    // round(c / t * 100) == floor((200c + t) / 2t) for non-negative values
    let percent = (cumulative * 200 + total) / (total * 2);
    cmp::min(percent, 100) as u8
}

/// Returns the date on which the schedule finishes the book, or `None` if
/// the schedule is empty or was cut short by the safety cap.
pub fn finish_date(entries: &[ScheduleEntry], total_pages: u32) -> Option<NaiveDate> {
    entries.last()
        .filter(|e| e.cumulative_pages_read == total_pages)
        .map(|e| e.date)
}

/// Returns whether the schedule stops before reaching `total_pages`.
pub fn is_truncated(entries: &[ScheduleEntry], total_pages: u32) -> bool {
    match entries.last() {
        Some(e) => e.cumulative_pages_read < total_pages,
        None => false,
    }
}

/// Everything a projection depends on, bundled so that two runs can be
/// compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionInputs {
    pub pages_read: u32,
    pub total_pages: u32,
    pub daily_pace: i32,
    pub starts_today: bool,
    pub reference_date: NaiveDate,
}

impl ProjectionInputs {
    /// Runs `project` on these inputs.
    pub fn project(&self) -> Vec<ScheduleEntry> {
        project(self.pages_read,
                self.total_pages,
                self.daily_pace,
                self.starts_today,
                self.reference_date)
    }
}

/// Remembers the most recent projection so that asking again with the
/// same inputs does not recompute it.
#[derive(Debug, Default)]
pub struct ScheduleMemo {
    last: Option<ProjectionInputs>,
    entries: Vec<ScheduleEntry>,
    runs: usize,
}

impl ScheduleMemo {
    /// Returns an empty memo.
    pub fn new() -> ScheduleMemo {
        ScheduleMemo::default()
    }

    /// Returns the schedule for `inputs`, projecting it from scratch
    /// unless the previous call used the same inputs.
    pub fn schedule(&mut self, inputs: ProjectionInputs) -> &[ScheduleEntry] {
        if self.last != Some(inputs) {
            self.entries = inputs.project();
            self.last = Some(inputs);
            self.runs += 1;
        }
        &self.entries
    }

    /// Returns how many projections this memo has actually run.
    pub fn runs(&self) -> usize {
        self.runs
    }
}
