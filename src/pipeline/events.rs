use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Level, debug, error, info, warn};

use crate::models::SecurityTask;

pub enum LifecycleEvent<'a> {
    Started { task: &'a SecurityTask, attempt: u32 },
    Completed { task: &'a SecurityTask },
    Retrying { task: &'a SecurityTask, max_attempts: u32 },
    Failed { task: &'a SecurityTask },
    OutOfScope { task: &'a SecurityTask },
    ToolMissing { task: &'a SecurityTask, tool: &'a str },
    Skipped { task: &'a SecurityTask },
    Cancelled { task: &'a SecurityTask },
    RunCancelled { not_started: usize },
    ReportWritten { path: &'a Path },
}

impl LifecycleEvent<'_> {
    fn level(&self) -> Level {
        match self {
            LifecycleEvent::Started { .. }
            | LifecycleEvent::Completed { .. }
            | LifecycleEvent::ReportWritten { .. } => Level::INFO,
            LifecycleEvent::Skipped { .. } => Level::DEBUG,
            LifecycleEvent::Retrying { .. }
            | LifecycleEvent::Cancelled { .. }
            | LifecycleEvent::RunCancelled { .. } => Level::WARN,
            LifecycleEvent::Failed { .. }
            | LifecycleEvent::OutOfScope { .. }
            | LifecycleEvent::ToolMissing { .. } => Level::ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            LifecycleEvent::Started { task, attempt } => {
                format!("Starting {} (attempt {})", task.label(), attempt)
            }
            LifecycleEvent::Completed { task } => format!("Completed {}", task.label()),
            LifecycleEvent::Retrying { task, max_attempts } => format!(
                "{} failed (attempt {}/{}), retrying: {}",
                task.label(),
                task.retries,
                max_attempts,
                task.error.as_deref().unwrap_or("unknown error")
            ),
            LifecycleEvent::Failed { task } => format!(
                "Task {} failed after {} attempt(s): {}",
                task.label(),
                task.retries,
                task.error.as_deref().unwrap_or("unknown error")
            ),
            LifecycleEvent::OutOfScope { task } => {
                format!("Task {} out of scope", task.label())
            }
            LifecycleEvent::ToolMissing { task, tool } => format!(
                "Tool {} not found for {}; install it or set tools.{} in the plan settings",
                tool,
                task.label(),
                tool
            ),
            LifecycleEvent::Skipped { task } => {
                format!("Skipping {} (status {})", task.label(), task.status)
            }
            LifecycleEvent::Cancelled { task } => format!(
                "Cancelled {} after {} failed attempt(s)",
                task.label(),
                task.retries
            ),
            LifecycleEvent::RunCancelled { not_started } => {
                format!("Run cancelled, {} task(s) not started", not_started)
            }
            LifecycleEvent::ReportWritten { path } => {
                format!("Final report generated: {}", path.display())
            }
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::ERROR => "ERROR",
        Level::WARN => "WARNING",
        Level::INFO => "INFO",
        _ => "DEBUG",
    }
}

enum Sink {
    Discard,
    File(BufWriter<File>),
    Memory(Vec<String>),
}

pub struct EventLog {
    sink: Mutex<Sink>,
}

impl EventLog {
    const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S,%3f";

    pub fn discard() -> Self {
        Self::with_sink(Sink::Discard)
    }

    pub fn memory() -> Self {
        Self::with_sink(Sink::Memory(Vec::new()))
    }

    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::with_sink(Sink::File(BufWriter::new(file))))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink: Mutex::new(sink),
        }
    }

    pub fn record(&self, event: LifecycleEvent<'_>) {
        let level = event.level();
        let message = event.message();

        match level {
            Level::ERROR => error!("{}", message),
            Level::WARN => warn!("{}", message),
            Level::INFO => info!("{}", message),
            _ => debug!("{}", message),
        }

        if level == Level::DEBUG {
            return;
        }

        let line = format!(
            "{} - {} - {}",
            Local::now().format(Self::TIMESTAMP_FORMAT),
            level_name(level),
            message
        );

        let Ok(mut sink) = self.sink.lock() else {
            return;
        };
        match &mut *sink {
            Sink::Discard => {}
            Sink::File(writer) => {
                if let Err(e) = writeln!(writer, "{}", line) {
                    warn!(error = %e, "Failed to append to event log");
                }
            }
            Sink::Memory(lines) => lines.push(line),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self.sink.lock().as_deref() {
            Ok(Sink::Memory(lines)) => lines.clone(),
            _ => Vec::new(),
        }
    }

    pub fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            if let Sink::File(writer) = &mut *sink {
                if let Err(e) = writer.flush() {
                    warn!(error = %e, "Failed to flush event log");
                }
            }
        }
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        self.flush();
    }
}
