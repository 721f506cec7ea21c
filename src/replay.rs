//! Replays a recorded stream of host build events through the timers.
//!
//! One JSON object per line:
//!
//! ```text
//! {"event":"build_started","at":0}
//! {"event":"before_task","task":":app:assemble","at":10}
//! {"event":"after_task","task":":app:assemble","did_work":true,"at":20}
//! {"event":"build_finished","at":30}
//! ```

use crate::host::{BuildFinishedHook, BuildResult};
use crate::timer::{BuildLifecycle, ManualClock, MirakleTask, TaskKind, TaskRef};
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BuildStarted {
        at: u64,
    },
    BeforeTask {
        task: TaskRef,
        at: u64,
    },
    AfterTask {
        task: TaskRef,
        did_work: bool,
        at: u64,
    },
    BuildFinished {
        at: u64,
        failure: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum RawEvent {
    BuildStarted {
        at: u64,
    },
    BeforeTask {
        task: String,
        at: u64,
        #[serde(default)]
        mirakle: bool,
    },
    AfterTask {
        task: String,
        at: u64,
        did_work: bool,
        #[serde(default)]
        mirakle: bool,
    },
    BuildFinished {
        at: u64,
        #[serde(default)]
        failure: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub watched: usize,
    pub finished: bool,
    pub failure: Option<String>,
}

pub fn load(path: &Path) -> Result<Vec<Event>, io::Error> {
    let text = fs::read_to_string(path)?;
    parse(&text).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

pub fn parse(text: &str) -> Result<Vec<Event>, String> {
    let mut events = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let raw_event: RawEvent =
            serde_json::from_str(line).map_err(|err| format!("line {}: {err}", index + 1))?;
        let event = convert(raw_event).map_err(|err| format!("line {}: {err}", index + 1))?;
        events.push(event);
    }

    Ok(events)
}

fn convert(raw: RawEvent) -> Result<Event, String> {
    Ok(match raw {
        RawEvent::BuildStarted { at } => Event::BuildStarted { at },
        RawEvent::BeforeTask { task, at, mirakle } => Event::BeforeTask {
            task: task_ref(task, mirakle)?,
            at,
        },
        RawEvent::AfterTask {
            task,
            at,
            did_work,
            mirakle,
        } => Event::AfterTask {
            task: task_ref(task, mirakle)?,
            did_work,
            at,
        },
        RawEvent::BuildFinished { at, failure } => Event::BuildFinished { at, failure },
    })
}

fn task_ref(path: String, mirakle: bool) -> Result<TaskRef, String> {
    let mut task = TaskRef::external(path);
    if mirakle {
        task.kind = TaskKind::Mirakle(task.name.parse::<MirakleTask>()?);
    }
    Ok(task)
}

/// Feeds `events` to a fresh lifecycle and writes the deferred report lines.
///
/// With an empty `watch` list every task seen in the stream is timed.
pub fn run(
    events: &[Event],
    watch: &[String],
    hook: Box<dyn BuildFinishedHook>,
    out: &mut dyn Write,
) -> io::Result<Summary> {
    let clock = ManualClock::new(0);
    let mut lifecycle = BuildLifecycle::new(clock, hook);

    let watched = watched_tasks(events, watch);
    let watched_count = watched.len();
    let mut build_failure = None;
    debug!(tasks = watched_count, "watching tasks");
    lifecycle.log_tasks(watched);

    for event in events {
        match event {
            Event::BuildStarted { at } => {
                if lifecycle.log_build(*at) {
                    lifecycle.clock().set(*at);
                } else {
                    warn!(at, "ignoring repeated build_started event");
                }
            }
            Event::BeforeTask { task, at } => {
                lifecycle.clock().set(*at);
                lifecycle.before_execute(task);
            }
            Event::AfterTask { task, did_work, at } => {
                lifecycle.clock().set(*at);
                lifecycle.after_execute(task, *did_work);
            }
            Event::BuildFinished { at, failure } => {
                lifecycle.clock().set(*at);
                let result = BuildResult {
                    failure: failure.clone(),
                };
                if lifecycle.build_finished(&result, out)? {
                    build_failure = result.failure;
                } else {
                    info!("ignoring repeated build_finished event");
                }
            }
        }
    }

    Ok(Summary {
        watched: watched_count,
        finished: lifecycle.is_finished(),
        failure: build_failure,
    })
}

fn watched_tasks(events: &[Event], watch: &[String]) -> Vec<TaskRef> {
    let mut tasks: Vec<TaskRef> = Vec::new();

    for event in events {
        let task = match event {
            Event::BeforeTask { task, .. } | Event::AfterTask { task, .. } => task,
            _ => continue,
        };

        if !watch.is_empty() && !watch.iter().any(|w| w == &task.path) {
            continue;
        }

        if !tasks.iter().any(|seen| seen.same_task(task)) {
            tasks.push(task.clone());
        }
    }

    tasks
}
