//! Works a schedule backwards: given the day the reader wants to be done,
//! how many pages a day does that take?
//!
//! The result only ever feeds the pace that `schedule::project` consumes.
//! Nothing here looks at the pace itself, so a changed pace can never move
//! the target date.

use std::convert::TryFrom;

use chrono::NaiveDate;

use super::errors::*;

/// The date format used for all user-facing dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .chain_err(|| ErrorKind::InvalidDate(s.to_owned()))
}

/// Returns the smallest daily pace that finishes the book by `target_date`,
/// or `None` if there is no sensible suggestion.
///
/// Reading days run up to and including `target_date`, starting with
/// `reference_date` itself if `starts_today` is set and with the day after
/// it otherwise. The pace is rounded up so that the deadline is always met.
///
/// No suggestion is made if the deadline leaves no reading days, if there
/// are no pages left, or if the pace would not fit in an `i32`.
pub fn derive_pace(target_date: NaiveDate,
                   total_pages: u32,
                   pages_read: u32,
                   starts_today: bool,
                   reference_date: NaiveDate)
                   -> Option<i32> {
    let days_available = target_date.signed_duration_since(reference_date).num_days() +
                         if starts_today { 1 } else { 0 };
    let pages_remaining = total_pages.saturating_sub(pages_read) as i64;

    if days_available <= 0 || pages_remaining <= 0 {
        return None;
    }

    let pace = (pages_remaining + days_available - 1) / days_available;
    i32::try_from(pace).ok()
}

/// Like `derive_pace`, but takes the target date as text, as it arrives
/// from the user. A malformed date produces no suggestion.
pub fn derive_pace_from_str(target_date: &str,
                            total_pages: u32,
                            pages_read: u32,
                            starts_today: bool,
                            reference_date: NaiveDate)
                            -> Option<i32> {
    match parse_date(target_date) {
        Ok(date) => derive_pace(date, total_pages, pages_read, starts_today, reference_date),
        Err(e) => {
            debug!("no pace suggestion: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn ten_reading_days_starting_today() {
        // Today plus the nine days after it
        let target = today() + Days::new(9);
        assert_eq!(derive_pace(target, 95, 0, true, today()), Some(10));
        assert_eq!(derive_pace(target, 195, 100, true, today()), Some(10));
    }

    #[test]
    fn starting_tomorrow_loses_a_day() {
        let target = today() + Days::new(10);
        assert_eq!(derive_pace(target, 100, 0, false, today()), Some(10));
        assert_eq!(derive_pace(target, 100, 0, true, today()), Some(10)); // ceil(100 / 11)
        assert_eq!(derive_pace(target, 110, 0, true, today()), Some(10));
        assert_eq!(derive_pace(target, 111, 0, true, today()), Some(11));
    }

    #[test]
    fn pace_rounds_up() {
        let target = today() + Days::new(3);
        assert_eq!(derive_pace(target, 10, 0, false, today()), Some(4));
    }

    #[test]
    fn deadline_today() {
        assert_eq!(derive_pace(today(), 40, 0, true, today()), Some(40));
        assert_eq!(derive_pace(today(), 40, 0, false, today()), None);
    }

    #[test]
    fn past_deadline_gives_no_suggestion() {
        let target = today() - Days::new(5);
        assert_eq!(derive_pace(target, 100, 0, true, today()), None);
    }

    #[test]
    fn finished_book_gives_no_suggestion() {
        let target = today() + Days::new(5);
        assert_eq!(derive_pace(target, 100, 100, true, today()), None);
        assert_eq!(derive_pace(target, 100, 120, true, today()), None);
        assert_eq!(derive_pace(target, 0, 0, true, today()), None);
    }

    #[test]
    fn result_feeds_projection_to_meet_deadline() {
        let target = today() + Days::new(13);
        let pace = derive_pace(target, 451, 17, false, today()).unwrap();
        let entries = crate::schedule::project(17, 451, pace, false, today());
        assert!(entries.last().unwrap().date() <= target);
    }

    #[test]
    fn malformed_date_gives_no_suggestion() {
        assert_eq!(derive_pace_from_str("next tuesday", 100, 0, true, today()), None);
        assert_eq!(derive_pace_from_str("2024-02-30", 100, 0, true, today()), None);
        assert_eq!(derive_pace_from_str("", 100, 0, true, today()), None);
        assert_eq!(derive_pace_from_str("2024-03-05", 100, 0, true, today()), Some(20));
    }

    #[test]
    fn parse_date_reports_input() {
        let err = parse_date("soon").unwrap_err();
        match *err.kind() {
            ErrorKind::InvalidDate(ref s) => assert_eq!(s, "soon"),
            ref k => panic!("unexpected error kind: {:?}", k),
        }
    }
}
