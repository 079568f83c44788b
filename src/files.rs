//! This module provides functions for storing the reading plan on disk.
//! The location is determined by the `app_dirs2` crate, which will return
//! a path based on the operating system (Windows, OS X, or Linux).
//!
//! There is only ever one plan, kept as pretty-printed JSON in
//! `plan.json` in the user's data directory. Every function that touches
//! that file has a `_from`/`_to` variant taking an explicit path.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use app_dirs2::{self, AppDataType, AppDirsError, AppInfo};
use chrono::NaiveDate;

use super::errors::*;
use super::state::ReadingPlanState;

/// The information for app_dirs
const APP_INFO: AppInfo = AppInfo {
    name: "readpace",
    author: "Ian Johnson",
};

/// The file name of the stored plan
const PLAN_FILE: &str = "plan.json";

/// Returns the program's directory of the given type, if possible.
/// The directory is not created.
pub fn app_dir(t: AppDataType) -> Result<PathBuf> {
    match app_dirs2::get_app_root(t, &APP_INFO) {
        Ok(p) => Ok(p),
        Err(AppDirsError::NotSupported) => Err(ErrorKind::CannotLocateConfig.into()),
        Err(AppDirsError::Io(e)) => Err(e).chain_err(|| ErrorKind::Io("could not find app directory".into())),
        // `APP_INFO` is a constant, so this can't happen unless `app_dirs2`
        // changes in a breaking way.
        Err(AppDirsError::InvalidAppInfo) => panic!("invalid app info"),
    }
}

/// Returns the location of the stored plan.
pub fn state_path() -> Result<PathBuf> {
    let mut path = app_dir(AppDataType::UserData)?;
    path.push(PLAN_FILE);
    Ok(path)
}

/// Reads the stored plan, or returns a new plan for `today` if there isn't
/// one yet.
pub fn load_state(today: NaiveDate) -> Result<ReadingPlanState> {
    load_state_from(&state_path()?, today)
}

/// Reads the plan stored at `path`, or returns a new plan for `today` if
/// the file doesn't exist.
///
/// Older records are upgraded; missing fields take their defaults.
pub fn load_state_from(path: &Path, today: NaiveDate) -> Result<ReadingPlanState> {
    if !path.exists() {
        debug!("no plan at {}; starting a new one", path.display());
        return Ok(ReadingPlanState::new(today));
    }
    let f = File::open(path).chain_err(|| ErrorKind::Io(format!("could not open plan file '{}'", path.display())))?;

    let state: ReadingPlanState =
        serde_json::from_reader(f).chain_err(|| ErrorKind::Json(format!("json error in plan file '{}'", path.display())))?;
    debug!("loaded plan from {}", path.display());
    state.upgrade()
}

/// Writes the plan to the user's data directory, replacing any stored plan.
pub fn save_state(state: &ReadingPlanState) -> Result<()> {
    save_state_to(&state_path()?, state)
}

/// Writes the plan to `path`, creating its directory if needed and
/// replacing any existing file.
pub fn save_state_to(path: &Path, state: &ReadingPlanState) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.is_dir() {
            fs::create_dir_all(dir).chain_err(|| ErrorKind::Io("could not create plan directory".into()))?;
        }
    }
    let mut f = File::create(path).chain_err(|| ErrorKind::Io(format!("could not write plan file '{}'", path.display())))?;

    serde_json::to_writer_pretty(&mut f, state).chain_err(|| ErrorKind::Json("could not serialize plan to json".into()))?;
    debug!("saved plan to {}", path.display());
    Ok(())
}

/// Removes the stored plan. Returns whether there was one to remove.
pub fn remove_state() -> Result<bool> {
    remove_state_at(&state_path()?)
}

/// Removes the plan stored at `path`. Returns whether there was one.
pub fn remove_state_at(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).chain_err(|| ErrorKind::Io("could not remove plan file".into()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Edit, CURRENT_VERSION};

    use tempfile::tempdir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn missing_file_gives_new_plan() {
        let dir = tempdir().unwrap();
        let state = load_state_from(&dir.path().join(PLAN_FILE), today()).unwrap();
        assert_eq!(state, ReadingPlanState::new(today()));
    }

    #[test]
    fn saved_plan_loads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(PLAN_FILE);

        let mut state = ReadingPlanState::new(today());
        state.apply(Edit::Title("Bleak House".into()), today());
        state.apply(Edit::TotalPages(1017), today());
        state.apply(Edit::StartsToday(true), today());
        save_state_to(&path, &state).unwrap();

        assert_eq!(load_state_from(&path, today()).unwrap(), state);
    }

    #[test]
    fn old_record_is_upgraded_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PLAN_FILE);
        fs::write(&path,
                  r#"{"version":1,"title":"Kim","totalPages":300,"pagesRead":40,"dailyPace":12}"#)
            .unwrap();

        let state = load_state_from(&path, today()).unwrap();
        assert_eq!(state.version(), CURRENT_VERSION);
        assert!(!state.starts_today());
        assert_eq!(state.pages_read(), 40);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PLAN_FILE);
        fs::write(&path, "[1, 2").unwrap();

        match load_state_from(&path, today()) {
            Err(Error(ErrorKind::Json(_), _)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn remove_reports_whether_plan_existed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(PLAN_FILE);

        assert!(!remove_state_at(&path).unwrap());
        save_state_to(&path, &ReadingPlanState::new(today())).unwrap();
        assert!(remove_state_at(&path).unwrap());
        assert!(!path.exists());
    }
}
