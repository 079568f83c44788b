// For `error_chain!`
#![recursion_limit = "1024"]

extern crate app_dirs2;
extern crate chrono;
extern crate serde;
extern crate serde_json;
extern crate ureq;

#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

pub mod errors {
    error_chain!{
        errors {
            /// The user's data or config directory could not be found or deduced.
            CannotLocateConfig {
                description("cannot locate config directory")
            }
            /// A date given by the user could not be parsed (includes the input).
            InvalidDate(t: String) {
                description("invalid date")
                display("invalid date '{}' (expected YYYY-MM-DD)", t)
            }
            /// A stored plan was written by a newer version of the program.
            UnsupportedVersion(v: u32) {
                description("unsupported plan version")
                display("plan record version {} is newer than this program supports", v)
            }
            /// A failure talking to the advisory text service.
            /// These never leave the `advice` module.
            Advice(t: String) {
                description("advice error")
                display("advice error: {}", t)
            }
            /// An IO error (usually caused by `std::io::Error`).
            Io(t: String) {
                description("io error")
                display("{}", t)
            }
            /// A JSON error (usually caused by `serde_json::Error`).
            Json(t: String) {
                description("json error")
                display("{}", t)
            }
        }
    }
}

pub use errors::*;

pub mod advice;
pub mod config;
pub mod files;
pub mod pace;
pub mod schedule;
pub mod state;

pub use pace::derive_pace;
pub use schedule::{project, ScheduleEntry};
pub use state::{Edit, ReadingPlanState};
