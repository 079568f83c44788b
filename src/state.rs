//! This module provides the `ReadingPlanState` type: the one book being
//! read, how far along the reader is, and how fast they mean to go.
//!
//! The state is changed through `Edit`s. Editing the target date or either
//! page count re-solves the daily pace for that date; editing the pace
//! directly leaves the date alone. Pace never flows back into the date.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::advice::AdviceRequest;
use super::errors::*;
use super::pace;
use super::schedule::ProjectionInputs;

/// The record version written by this program.
///
/// Version 1 records have no `startsToday` field.
pub const CURRENT_VERSION: u32 = 2;

/// How far ahead the target date of a new plan is set, in days.
pub const DEFAULT_HORIZON_DAYS: u64 = 21;

/// The daily pace of a new plan, in pages.
pub const DEFAULT_DAILY_PACE: i32 = 20;

fn legacy_version() -> u32 {
    1
}

fn default_daily_pace() -> i32 {
    DEFAULT_DAILY_PACE
}

/// The reader's plan for a single book.
///
/// This is also the persisted record, so every field has a default and
/// records written before a field existed still load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingPlanState {
    #[serde(default = "legacy_version")]
    version: u32,
    #[serde(default)]
    title: String,
    /// Zero means no book has been configured yet
    #[serde(default)]
    total_pages: u32,
    /// May exceed `total_pages`; this just means nothing is left
    #[serde(default)]
    pages_read: u32,
    #[serde(default)]
    target_date: Option<NaiveDate>,
    /// Zero or negative disables the schedule
    #[serde(default = "default_daily_pace")]
    daily_pace: i32,
    #[serde(default)]
    starts_today: bool,
}

/// A single change made by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Title(String),
    TotalPages(u32),
    PagesRead(u32),
    TargetDate(NaiveDate),
    DailyPace(i32),
    StartsToday(bool),
}

impl Edit {
    /// Returns whether this edit should re-solve the daily pace.
    pub fn solves_pace(&self) -> bool {
        match *self {
            Edit::TargetDate(_) | Edit::TotalPages(_) | Edit::PagesRead(_) => true,
            Edit::Title(_) | Edit::DailyPace(_) | Edit::StartsToday(_) => false,
        }
    }
}

impl ReadingPlanState {
    /// Returns a fresh plan with no book, a default pace, and a target date
    /// a few weeks after `today`.
    pub fn new(today: NaiveDate) -> ReadingPlanState {
        ReadingPlanState {
            version: CURRENT_VERSION,
            title: String::new(),
            total_pages: 0,
            pages_read: 0,
            target_date: today.checked_add_days(Days::new(DEFAULT_HORIZON_DAYS)),
            daily_pace: DEFAULT_DAILY_PACE,
            starts_today: false,
        }
    }

    /// Brings a freshly loaded record up to the current version.
    ///
    /// Missing fields have already been defaulted by deserialization, so
    /// this only rejects records from a newer program.
    pub fn upgrade(mut self) -> Result<ReadingPlanState> {
        if self.version > CURRENT_VERSION {
            return Err(ErrorKind::UnsupportedVersion(self.version).into());
        }
        if self.version < CURRENT_VERSION {
            debug!("upgrading plan record from version {} to {}",
                   self.version,
                   CURRENT_VERSION);
            self.version = CURRENT_VERSION;
        }
        Ok(self)
    }

    /// Applies an edit.
    ///
    /// If the edit changes the target date or a page count, the pace is
    /// re-solved for the target date as seen from `today`. Returns the new
    /// pace if it was changed this way.
    pub fn apply(&mut self, edit: Edit, today: NaiveDate) -> Option<i32> {
        let solves_pace = edit.solves_pace();
        match edit {
            Edit::Title(t) => self.title = t,
            Edit::TotalPages(n) => self.total_pages = n,
            Edit::PagesRead(n) => self.pages_read = n,
            Edit::TargetDate(d) => self.target_date = Some(d),
            Edit::DailyPace(p) => self.daily_pace = p,
            Edit::StartsToday(b) => self.starts_today = b,
        }

        if !solves_pace {
            return None;
        }
        let suggestion = self.pace_suggestion(today);
        if let Some(p) = suggestion {
            self.daily_pace = p;
        }
        suggestion
    }

    /// Returns the pace needed to meet the target date, without applying it.
    pub fn pace_suggestion(&self, today: NaiveDate) -> Option<i32> {
        self.target_date.and_then(|target| {
            pace::derive_pace(target,
                              self.total_pages,
                              self.pages_read,
                              self.starts_today,
                              today)
        })
    }

    /// Returns everything `schedule::project` needs, with `today` as the
    /// reference date.
    pub fn projection_inputs(&self, today: NaiveDate) -> ProjectionInputs {
        ProjectionInputs {
            pages_read: self.pages_read,
            total_pages: self.total_pages,
            daily_pace: self.daily_pace,
            starts_today: self.starts_today,
            reference_date: today,
        }
    }

    /// Returns the read-only snapshot handed to an advice provider.
    pub fn advice_request(&self) -> AdviceRequest {
        AdviceRequest::new(&self.title, self.pages_remaining(), self.daily_pace)
    }

    /// Returns the number of pages left, never less than zero.
    pub fn pages_remaining(&self) -> u32 {
        self.total_pages.saturating_sub(self.pages_read)
    }

    /// Returns whether a book is configured and fully read.
    pub fn is_finished(&self) -> bool {
        self.total_pages > 0 && self.pages_remaining() == 0
    }

    /// Returns the record version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Returns the title of the book.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the length of the book in pages.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Returns the number of pages read so far.
    pub fn pages_read(&self) -> u32 {
        self.pages_read
    }

    /// Returns the day the reader wants to be finished by, if any.
    pub fn target_date(&self) -> Option<NaiveDate> {
        self.target_date
    }

    /// Returns the daily pace in pages.
    pub fn daily_pace(&self) -> i32 {
        self.daily_pace
    }

    /// Returns whether the schedule starts today rather than tomorrow.
    pub fn starts_today(&self) -> bool {
        self.starts_today
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn book(total: u32, read: u32) -> ReadingPlanState {
        let mut s = ReadingPlanState::new(today());
        s.apply(Edit::Title("Middlemarch".into()), today());
        s.apply(Edit::TotalPages(total), today());
        s.apply(Edit::PagesRead(read), today());
        s
    }

    #[test]
    fn new_state_defaults() {
        let s = ReadingPlanState::new(today());
        assert_eq!(s.version(), CURRENT_VERSION);
        assert_eq!(s.total_pages(), 0);
        assert_eq!(s.daily_pace(), DEFAULT_DAILY_PACE);
        assert_eq!(s.target_date(), Some(today() + Days::new(21)));
        assert!(!s.starts_today());
        assert!(!s.is_finished());
        assert!(s.projection_inputs(today()).project().is_empty());
    }

    #[test]
    fn page_edits_solve_pace() {
        // 21 days to read 210 pages, starting tomorrow
        let s = book(210, 0);
        assert_eq!(s.daily_pace(), 10);

        let mut s = s;
        assert_eq!(s.apply(Edit::PagesRead(168), today()), Some(2));
        assert_eq!(s.daily_pace(), 2);
    }

    #[test]
    fn target_date_edit_solves_pace() {
        let mut s = book(100, 0);
        let suggestion = s.apply(Edit::TargetDate(today() + Days::new(4)), today());
        assert_eq!(suggestion, Some(25));
        assert_eq!(s.daily_pace(), 25);
    }

    #[test]
    fn pace_edit_does_not_move_target_or_resolve() {
        let mut s = book(100, 0);
        let target = s.target_date();

        assert_eq!(s.apply(Edit::DailyPace(3), today()), None);
        assert_eq!(s.daily_pace(), 3);
        assert_eq!(s.target_date(), target);
    }

    #[test]
    fn start_mode_and_title_edits_do_not_resolve() {
        let mut s = book(100, 0);
        s.apply(Edit::DailyPace(7), today());

        assert_eq!(s.apply(Edit::StartsToday(true), today()), None);
        assert_eq!(s.apply(Edit::Title("Emma".into()), today()), None);
        assert_eq!(s.daily_pace(), 7);
        assert!(s.starts_today());
        assert_eq!(s.title(), "Emma");
    }

    #[test]
    fn no_suggestion_keeps_existing_pace() {
        let mut s = book(100, 0);
        s.apply(Edit::DailyPace(9), today());

        assert_eq!(s.apply(Edit::TargetDate(today() - Days::new(1)), today()), None);
        assert_eq!(s.daily_pace(), 9);

        assert_eq!(s.apply(Edit::PagesRead(100), today()), None);
        assert_eq!(s.daily_pace(), 9);
        assert!(s.is_finished());
    }

    #[test]
    fn pages_remaining_never_negative() {
        let s = book(100, 250);
        assert_eq!(s.pages_remaining(), 0);
        assert!(s.projection_inputs(today()).project().is_empty());
    }

    #[test]
    fn advice_request_snapshot() {
        let s = book(300, 120);
        let req = s.advice_request();
        assert_eq!(req.title(), "Middlemarch");
        assert_eq!(req.pages_remaining(), 180);
        assert_eq!(req.daily_pace(), s.daily_pace());
    }

    #[test]
    fn version_one_record_defaults_starts_today() {
        let json = r#"{"version":1,"title":"Dune","totalPages":412,"pagesRead":12,
                       "targetDate":"2024-04-01","dailyPace":15}"#;
        let s: ReadingPlanState = serde_json::from_str(json).unwrap();
        let s = s.upgrade().unwrap();

        assert_eq!(s.version(), CURRENT_VERSION);
        assert!(!s.starts_today());
        assert_eq!(s.title(), "Dune");
        assert_eq!(s.daily_pace(), 15);
        assert_eq!(s.target_date(), NaiveDate::from_ymd_opt(2024, 4, 1));
    }

    #[test]
    fn empty_record_takes_all_defaults() {
        let s: ReadingPlanState = serde_json::from_str("{}").unwrap();
        assert_eq!(s.version(), 1);
        assert_eq!(s.daily_pace(), DEFAULT_DAILY_PACE);
        assert_eq!(s.target_date(), None);
        assert_eq!(s.pace_suggestion(today()), None);
    }

    #[test]
    fn newer_record_is_rejected() {
        let s: ReadingPlanState = serde_json::from_str(r#"{"version":99}"#).unwrap();
        match s.upgrade() {
            Err(Error(ErrorKind::UnsupportedVersion(99), _)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn record_uses_camel_case_fields() {
        let mut s = book(10, 0);
        s.apply(Edit::StartsToday(true), today());
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["startsToday"], true);
        assert_eq!(value["totalPages"], 10);
        assert_eq!(value["targetDate"], "2024-03-22");
    }
}
