extern crate readpace;

extern crate ansi_term;
extern crate chrono;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;
extern crate serde_json;

use std::time::Duration;

use ansi_term::{Colour, Style};
use chrono::{Local, NaiveDate};
use clap::{App, AppSettings, Arg, ArgGroup, ArgMatches, SubCommand};

use readpace::advice::{self, PendingAdvice};
use readpace::config::{self, AdviceConfig};
use readpace::errors::*;
use readpace::pace::{parse_date, DATE_FORMAT};
use readpace::schedule::{self, ScheduleMemo};
use readpace::{files, Edit, ReadingPlanState};

/// Environment variable holding the log filter
const LOG_ENV: &str = "READPACE_LOG";

/// Describes all the styles that can be used in printing text.
/// Mostly just good for disabling custom formatting.
#[derive(Debug, Clone)]
struct StyleSet {
    /// Normal text
    normal: Style,
    /// Title text
    title: Style,
    /// Description (or label) text
    description: Style,
    /// Highlighted numbers, like the finish date
    emphasis: Style,
    /// Error text
    error: Style,
}

impl StyleSet {
    /// Preset for the --no-ansi option (no style)
    fn no_ansi() -> StyleSet {
        StyleSet {
            normal: Style::new(),
            title: Style::new(),
            description: Style::new(),
            emphasis: Style::new(),
            error: Style::new(),
        }
    }

    /// Preset for the normal "fancy" style
    fn fancy() -> StyleSet {
        StyleSet {
            normal: Style::new(),
            title: Colour::White.bold(),
            description: Style::new().italic(),
            emphasis: Colour::Green.bold(),
            error: Colour::Red.normal(),
        }
    }
}

/// Returns styled text (using a format string syntax)
macro_rules! style {
    ($style:expr, $($arg:tt)*) => {
        {{
            $style.paint(format!( $($arg)*) )
        }}
    }
}

/// Prints a line of text in the given style
macro_rules! styleln {
    ($style:expr, $($arg:tt)*) => {
        println!("{}", style!($style, $($arg)*))
    }
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or(LOG_ENV, "warn")).init();

    let matches = App::new("readpace")
        .version("0.1.0")
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("Plans how many pages to read each day to finish a book")
        .setting(AppSettings::ColoredHelp)
        .arg(Arg::with_name("no-ansi")
            .help("Disables fancy text output")
            .short("n")
            .long("no-ansi")
            .global(true))
        .arg(Arg::with_name("today")
            .help("Plans as if today were this date (YYYY-MM-DD)")
            .long("today")
            .value_name("DATE")
            .takes_value(true)
            .global(true))
        .subcommand(SubCommand::with_name("show")
            .about("Shows the plan and its day-by-day schedule")
            .arg(Arg::with_name("count")
                .short("c")
                .long("count")
                .value_name("COUNT")
                .default_value("14")
                .help("The number of days of the schedule to show")
                .takes_value(true))
            .arg(Arg::with_name("all")
                .short("a")
                .long("all")
                .help("Shows every day of the schedule"))
            .arg(Arg::with_name("json")
                .long("json")
                .help("Prints the schedule as JSON instead"))
            .arg(Arg::with_name("no-advice")
                .long("no-advice")
                .help("Skips asking the advice service")))
        .subcommand(SubCommand::with_name("set")
            .about("Changes the plan")
            .arg(Arg::with_name("title")
                .short("t")
                .long("title")
                .value_name("TITLE")
                .help("The title of the book")
                .takes_value(true))
            .arg(Arg::with_name("total")
                .long("total")
                .value_name("PAGES")
                .help("The number of pages in the book")
                .takes_value(true))
            .arg(Arg::with_name("read")
                .short("r")
                .long("read")
                .value_name("PAGES")
                .help("The number of pages read so far")
                .takes_value(true))
            .arg(Arg::with_name("target")
                .long("target")
                .value_name("DATE")
                .help("The date to finish by (YYYY-MM-DD); recalculates the pace")
                .takes_value(true))
            .arg(Arg::with_name("pace")
                .short("p")
                .long("pace")
                .value_name("PAGES")
                .help("The number of pages to read each day")
                .allow_hyphen_values(true)
                .takes_value(true))
            .arg(Arg::with_name("starts-today")
                .long("starts-today")
                .help("Starts the schedule today"))
            .arg(Arg::with_name("starts-tomorrow")
                .long("starts-tomorrow")
                .help("Starts the schedule tomorrow"))
            .group(ArgGroup::with_name("start").args(&["starts-today", "starts-tomorrow"]))
            .after_help("Changing the total, the pages read, or the target date recalculates \
                         the daily pace needed to finish by the target date. Changing the \
                         pace directly never moves the target date. Options are applied in \
                         the order listed above."))
        .subcommand(SubCommand::with_name("read")
            .about("Records pages read")
            .arg(Arg::with_name("PAGES")
                .help("The number of pages just read")
                .required(true)))
        .subcommand(SubCommand::with_name("reset").about("Forgets the current plan"))
        .after_help("readpace keeps a plan for one book. To get started, use `readpace set \
                     --title TITLE --total PAGES`, then `readpace show` to see the schedule.")
        .get_matches();

    // Whether we should disable the fancy ANSI terminal text
    let no_ansi = matches.is_present("no-ansi") ||
                  matches.subcommand().1.map_or(false, |s| s.is_present("no-ansi"));
    // The style to use
    let style_set = if no_ansi {
        StyleSet::no_ansi()
    } else {
        StyleSet::fancy()
    };

    // Handle errors nicely
    if let Err(ref e) = run(&matches, &style_set) {
        styleln!(style_set.error, "Error: {}", e);

        for e in e.iter().skip(1) {
            styleln!(style_set.error, "Caused by: {}", e);
        }

        if let Some(backtrace) = e.backtrace() {
            styleln!(style_set.error, "Backtrace: {:?}", backtrace);
        }

        std::process::exit(1);
    }
}

/// The main program logic.
/// Each subcommand should do its own printing, except for errors, which are returned.
fn run(m: &ArgMatches, style_set: &StyleSet) -> Result<()> {
    // Global options may be given before or after the subcommand
    let today_arg = m.value_of("today").or_else(|| m.subcommand().1.and_then(|s| s.value_of("today")));
    let today = match today_arg {
        Some(d) => parse_date(d).chain_err(|| "invalid argument to `--today`")?,
        None => Local::now().date_naive(),
    };
    debug!("planning with today = {}", today);

    // Run the appropriate subcommand
    match m.subcommand() {
        ("show", Some(sub_m)) => show(sub_m, style_set, today),
        ("set", Some(sub_m)) => set(sub_m, style_set, today),
        ("read", Some(sub_m)) => read(sub_m, style_set, today),
        ("reset", Some(_)) => reset(style_set),
        _ => show(&ArgMatches::default(), style_set, today),
    }
}

/// Parses a numeric argument, naming the option in the error.
fn number_arg<T: std::str::FromStr>(m: &ArgMatches, name: &str) -> Result<Option<T>>
    where T::Err: std::error::Error + Send + 'static
{
    match m.value_of(name) {
        Some(v) => {
            let n = v.trim().parse().chain_err(|| format!("invalid numeric argument to `--{}`", name))?;
            Ok(Some(n))
        }
        None => Ok(None),
    }
}

/// The `show` subcommand logic
fn show(m: &ArgMatches, style_set: &StyleSet, today: NaiveDate) -> Result<()> {
    let count: usize = if m.is_present("all") {
        schedule::MAX_PROJECTED_DAYS
    } else {
        number_arg(m, "count")?.unwrap_or(14)
    };

    let state = files::load_state(today).chain_err(|| "could not read plan")?;

    // Kick off the advice request first so that it overlaps with the rest
    let pending = if m.is_present("no-advice") || m.is_present("json") || state.pages_remaining() == 0 {
        None
    } else {
        Some(start_advice(&state))
    };

    let mut memo = ScheduleMemo::new();
    let entries = memo.schedule(state.projection_inputs(today));

    if m.is_present("json") {
        let out = serde_json::to_string_pretty(entries).chain_err(|| ErrorKind::Json("could not serialize schedule".into()))?;
        println!("{}", out);
        return Ok(());
    }

    print_summary(&state, style_set);

    if state.total_pages() == 0 {
        styleln!(style_set.normal,
                 "No book is set up yet; use `readpace set --title TITLE --total PAGES` to start.");
        return Ok(());
    }
    if state.is_finished() {
        styleln!(style_set.normal, "Finished! There is nothing left to read.");
        return Ok(());
    }
    if entries.is_empty() {
        styleln!(style_set.normal,
                 "No schedule: the daily pace must be at least 1 page (use `readpace set --pace`).");
        return Ok(());
    }

    println!();
    for e in entries.iter().take(count) {
        println!("{} {} {}",
                 style!(style_set.title, "{:12}", e.date().format(DATE_FORMAT).to_string()),
                 style!(style_set.normal,
                        "pages {:>5}-{:<5} ({:>3} pages)",
                        e.start_page(),
                        e.end_page(),
                        e.pages_planned_today()),
                 style!(style_set.description, "{:>3}%", e.percent_complete()));
    }
    if entries.len() > count {
        styleln!(style_set.description,
                 "... {} more days (use `--all` to see them)",
                 entries.len() - count);
    }
    println!();

    match schedule::finish_date(entries, state.total_pages()) {
        Some(finish) => {
            println!("{} {}",
                     style!(style_set.normal, "Estimated finish:"),
                     style!(style_set.emphasis, "{}", finish.format(DATE_FORMAT)));
            if let Some(target) = state.target_date() {
                if finish > target {
                    styleln!(style_set.error,
                             "This is {} days after the target date of {}.",
                             (finish - target).num_days(),
                             target.format(DATE_FORMAT));
                }
            }
        }
        None => {
            styleln!(style_set.error,
                     "At this pace the book takes more than {} days; only the first {} are \
                      planned.",
                     schedule::MAX_PROJECTED_DAYS,
                     schedule::MAX_PROJECTED_DAYS)
        }
    }

    if let Some((pending, wait)) = pending {
        let text = pending.wait(wait);
        if !text.is_empty() {
            println!();
            styleln!(style_set.description, "{}", text);
        }
    }

    Ok(())
}

/// Prints the plan's settings.
fn print_summary(state: &ReadingPlanState, style_set: &StyleSet) {
    let title = if state.title().is_empty() {
        "(untitled)"
    } else {
        state.title()
    };
    styleln!(style_set.title, "{}", title);
    styleln!(style_set.normal,
             "{} of {} pages read, {} to go",
             state.pages_read(),
             state.total_pages(),
             state.pages_remaining());
    let target = match state.target_date() {
        Some(d) => d.format(DATE_FORMAT).to_string(),
        None => "none".to_owned(),
    };
    styleln!(style_set.normal,
             "Pace: {} pages a day, starting {}; target date: {}",
             state.daily_pace(),
             if state.starts_today() { "today" } else { "tomorrow" },
             target);
}

/// Loads the advice settings and starts a background request, returning
/// it along with how long to wait for it. Advice is optional, so a broken
/// config file only turns it off.
fn start_advice(state: &ReadingPlanState) -> (PendingAdvice, Duration) {
    let settings = match config::load_config() {
        Ok(c) => c.advice,
        Err(e) => {
            warn!("advice disabled: {}", e);
            AdviceConfig { api_key: String::new(), ..AdviceConfig::default() }
        }
    };
    let provider = advice::provider_for(&settings);
    let wait = Duration::from_secs(settings.timeout_secs);
    (advice::spawn_advice(provider, state.advice_request()), wait)
}

/// The `set` subcommand logic.
fn set(m: &ArgMatches, style_set: &StyleSet, today: NaiveDate) -> Result<()> {
    let mut edits = Vec::new();
    if let Some(t) = m.value_of("title") {
        edits.push(Edit::Title(t.to_owned()));
    }
    if let Some(n) = number_arg(m, "total")? {
        edits.push(Edit::TotalPages(n));
    }
    if let Some(n) = number_arg(m, "read")? {
        edits.push(Edit::PagesRead(n));
    }
    if let Some(d) = m.value_of("target") {
        edits.push(Edit::TargetDate(parse_date(d).chain_err(|| "invalid argument to `--target`")?));
    }
    if let Some(n) = number_arg(m, "pace")? {
        edits.push(Edit::DailyPace(n));
    }
    if m.is_present("starts-today") {
        edits.push(Edit::StartsToday(true));
    } else if m.is_present("starts-tomorrow") {
        edits.push(Edit::StartsToday(false));
    }

    if edits.is_empty() {
        bail!("nothing to change (see `readpace help set`)");
    }

    let mut state = files::load_state(today).chain_err(|| "could not read plan")?;
    apply_and_save(&mut state, edits, style_set, today)
}

/// The `read` subcommand logic.
fn read(m: &ArgMatches, style_set: &StyleSet, today: NaiveDate) -> Result<()> {
    let pages: u32 = m.value_of("PAGES")
        .unwrap_or("0")
        .trim()
        .parse()
        .chain_err(|| "invalid number of pages")?;

    let mut state = files::load_state(today).chain_err(|| "could not read plan")?;
    let now_read = state.pages_read().saturating_add(pages);
    apply_and_save(&mut state, vec![Edit::PagesRead(now_read)], style_set, today)?;

    if state.is_finished() {
        styleln!(style_set.emphasis, "That's the whole book. Well done!");
    }
    Ok(())
}

/// Applies edits in order, saves the plan, and reports the outcome.
fn apply_and_save(state: &mut ReadingPlanState,
                  edits: Vec<Edit>,
                  style_set: &StyleSet,
                  today: NaiveDate)
                  -> Result<()> {
    let pace_before = state.daily_pace();
    for edit in edits {
        debug!("applying {:?}", edit);
        state.apply(edit, today);
    }
    files::save_state(state).chain_err(|| "could not save plan")?;

    if state.daily_pace() != pace_before {
        styleln!(style_set.normal,
                 "Pace changed: {} -> {} pages a day",
                 pace_before,
                 state.daily_pace());
    }

    let mut memo = ScheduleMemo::new();
    let entries = memo.schedule(state.projection_inputs(today));
    match schedule::finish_date(entries, state.total_pages()) {
        Some(finish) => {
            println!("{} {}",
                     style!(style_set.normal, "Plan saved; estimated finish:"),
                     style!(style_set.emphasis, "{}", finish.format(DATE_FORMAT)))
        }
        None => styleln!(style_set.normal, "Plan saved"),
    }
    Ok(())
}

/// The `reset` subcommand logic
fn reset(style_set: &StyleSet) -> Result<()> {
    if files::remove_state().chain_err(|| "could not remove plan")? {
        styleln!(style_set.normal, "Removed the saved plan");
    } else {
        styleln!(style_set.normal, "There was no saved plan to remove");
    }
    Ok(())
}
