//! Task and build timing fed by host task notifications.
//!
//! Report lines are not printed when a task finishes. They are queued on the
//! build-finished hook so they appear after all other build output.

use crate::host::{BuildFinishedAction, BuildFinishedHook, BuildResult};
use crate::output;
use std::cell::Cell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;
use std::str::FromStr;
use time::OffsetDateTime;
use tracing::debug;

pub trait Clock {
    fn now_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        u64::try_from(millis).unwrap_or(0)
    }
}

/// Clock driven by recorded timestamps. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Tasks the plugin itself registers on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirakleTask {
    Mirakle,
    UploadToRemote,
    ExecuteOnRemote,
    DownloadFromRemote,
    DownloadInParallel,
    Fallback,
}

impl MirakleTask {
    pub const ALL: [MirakleTask; 6] = [
        Self::Mirakle,
        Self::UploadToRemote,
        Self::ExecuteOnRemote,
        Self::DownloadFromRemote,
        Self::DownloadInParallel,
        Self::Fallback,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mirakle => "mirakle",
            Self::UploadToRemote => "uploadToRemote",
            Self::ExecuteOnRemote => "executeOnRemote",
            Self::DownloadFromRemote => "downloadFromRemote",
            Self::DownloadInParallel => "downloadInParallel",
            Self::Fallback => "fallback",
        }
    }
}

impl FromStr for MirakleTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|task| task.name() == s)
            .ok_or_else(|| format!("unknown mirakle task {s:?}"))
    }
}

impl fmt::Display for MirakleTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Mirakle(MirakleTask),
    External,
}

/// Identity of a host task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRef {
    pub name: String,
    pub path: String,
    pub kind: TaskKind,
}

impl TaskRef {
    pub fn mirakle(task: MirakleTask) -> Self {
        Self {
            name: task.name().to_string(),
            path: format!(":{}", task.name()),
            kind: TaskKind::Mirakle(task),
        }
    }

    pub fn external(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit(':').next().unwrap_or_default().to_string();
        Self {
            name,
            path,
            kind: TaskKind::External,
        }
    }

    /// Host identity; the kind tag does not take part.
    pub fn same_task(&self, other: &TaskRef) -> bool {
        self.path == other.path
    }

    pub fn is_mirakle_task(&self) -> bool {
        matches!(self.kind, TaskKind::Mirakle(_))
    }

    /// Short name for plugin tasks, otherwise the path without its leading `:`.
    pub fn label(&self) -> &str {
        if self.is_mirakle_task() {
            &self.name
        } else {
            self.path.strip_prefix(':').unwrap_or(&self.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTiming {
    pub task: TaskRef,
    pub started_at_ms: u64,
    pub finished_at_ms: Option<u64>,
}

impl TaskTiming {
    pub fn elapsed_ms(&self) -> Option<u64> {
        self.finished_at_ms
            .map(|end| end.saturating_sub(self.started_at_ms))
    }

    pub fn report_line(&self) -> Option<String> {
        self.elapsed_ms()
            .map(|elapsed| output::task_line(self.task.label(), elapsed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Finished,
}

/// Receives host task notifications.
///
/// `after_execute` may hand back an action to run when the build finishes.
pub trait TaskExecutionListener {
    fn before_execute(&mut self, task: &TaskRef, now_ms: u64);
    fn after_execute(
        &mut self,
        task: &TaskRef,
        did_work: bool,
        now_ms: u64,
    ) -> Option<BuildFinishedAction>;
}

/// Times a single watched task.
#[derive(Debug, Clone)]
pub struct TaskTimer {
    target: TaskRef,
    timing: Option<TaskTiming>,
}

impl TaskTimer {
    pub fn new(target: TaskRef) -> Self {
        Self {
            target,
            timing: None,
        }
    }

    pub fn state(&self) -> TimerState {
        match &self.timing {
            None => TimerState::Idle,
            Some(timing) if timing.finished_at_ms.is_none() => TimerState::Running,
            Some(_) => TimerState::Finished,
        }
    }

    pub fn timing(&self) -> Option<&TaskTiming> {
        self.timing.as_ref()
    }
}

impl TaskExecutionListener for TaskTimer {
    fn before_execute(&mut self, task: &TaskRef, now_ms: u64) {
        if !self.target.same_task(task) {
            return;
        }

        debug!(task = %task.path, at = now_ms, "task started");
        self.timing = Some(TaskTiming {
            task: self.target.clone(),
            started_at_ms: now_ms,
            finished_at_ms: None,
        });
    }

    fn after_execute(
        &mut self,
        task: &TaskRef,
        did_work: bool,
        now_ms: u64,
    ) -> Option<BuildFinishedAction> {
        if !self.target.same_task(task) {
            return None;
        }

        if !did_work {
            debug!(task = %task.path, "task did no work; not reporting");
            return None;
        }

        let timing = self.timing.as_mut()?;
        if timing.finished_at_ms.is_some() {
            return None;
        }
        timing.finished_at_ms = Some(now_ms);

        let line = timing.report_line()?;
        debug!(task = %task.path, elapsed_ms = ?timing.elapsed_ms(), "task finished");
        Some(Box::new(move |_: &BuildResult, out: &mut dyn Write| {
            writeln!(out, "{line}")
        }))
    }
}

/// Routes host notifications to listeners and runs deferred reports once.
pub struct BuildLifecycle<C: Clock> {
    clock: C,
    hook: Box<dyn BuildFinishedHook>,
    listeners: Vec<Box<dyn TaskExecutionListener>>,
    build_logged: bool,
    finished: bool,
}

impl<C: Clock + Clone + 'static> BuildLifecycle<C> {
    pub fn new(clock: C, hook: Box<dyn BuildFinishedHook>) -> Self {
        Self {
            clock,
            hook,
            listeners: Vec::new(),
            build_logged: false,
            finished: false,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn add_listener(&mut self, listener: Box<dyn TaskExecutionListener>) {
        self.listeners.push(listener);
    }

    /// Watches each task with its own timer.
    pub fn log_tasks<I>(&mut self, tasks: I)
    where
        I: IntoIterator<Item = TaskRef>,
    {
        for task in tasks {
            self.add_listener(Box::new(TaskTimer::new(task)));
        }
    }

    /// Reports the time from `started_at_ms` until the build finishes.
    ///
    /// Only the first call registers a report; later calls return `false`.
    pub fn log_build(&mut self, started_at_ms: u64) -> bool {
        if self.build_logged || self.finished {
            return false;
        }

        self.build_logged = true;
        let clock = self.clock.clone();
        self.hook.register(Box::new(move |_: &BuildResult, out: &mut dyn Write| {
            let elapsed = clock.now_ms().saturating_sub(started_at_ms);
            writeln!(out, "{}", output::total_line(elapsed))
        }));
        true
    }

    pub fn before_execute(&mut self, task: &TaskRef) {
        if self.finished {
            debug!(task = %task.path, "ignoring task start after build finished");
            return;
        }

        let now = self.clock.now_ms();
        for listener in &mut self.listeners {
            listener.before_execute(task, now);
        }
    }

    pub fn after_execute(&mut self, task: &TaskRef, did_work: bool) {
        if self.finished {
            debug!(task = %task.path, "ignoring task finish after build finished");
            return;
        }

        let now = self.clock.now_ms();
        for listener in &mut self.listeners {
            if let Some(action) = listener.after_execute(task, did_work, now) {
                self.hook.register(action);
            }
        }
    }

    /// Runs every deferred action. Returns `false` when the build had already
    /// finished, in which case nothing runs.
    pub fn build_finished(&mut self, result: &BuildResult, out: &mut dyn Write) -> io::Result<bool> {
        if self.finished {
            return Ok(false);
        }

        self.finished = true;
        debug!(pending = self.hook.pending(), "build finished");
        self.hook.fire(result, out)?;
        Ok(true)
    }

    pub fn pending_reports(&self) -> usize {
        self.hook.pending()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
