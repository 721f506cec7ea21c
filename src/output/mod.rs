mod style;

use std::fmt::Write;

pub use style::{command, configure, success, warning};

const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_HOUR: u64 = MS_PER_MINUTE * 60;

/// Renders a build duration as `[<h> hrs ][<m> mins ]<s> secs`.
///
/// The hour and minute clauses only appear when the duration is strictly
/// greater than one hour or one minute, so exactly `60000` renders as
/// `0.0 secs`. Seconds keep their fractional part.
pub fn pretty_time(ms: u64) -> String {
    let mut out = String::new();

    if ms > MS_PER_HOUR {
        let _ = write!(out, "{} hrs ", ms / MS_PER_HOUR);
    }

    if ms > MS_PER_MINUTE {
        let _ = write!(out, "{} mins ", ms % MS_PER_HOUR / MS_PER_MINUTE);
    }

    let secs = (ms % MS_PER_MINUTE) as f64 / 1000.0;
    out.push_str(&decimal(secs));
    out.push_str(" secs");
    out
}

pub fn task_line(label: &str, elapsed_ms: u64) -> String {
    format!("Task {label} took : {}", pretty_time(elapsed_ms))
}

pub fn total_line(elapsed_ms: u64) -> String {
    format!("Total time : {}", pretty_time(elapsed_ms))
}

// Shortest round-trip form, always with a fractional digit.
fn decimal(value: f64) -> String {
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}
