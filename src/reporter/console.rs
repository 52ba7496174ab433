use colored::Colorize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::models::{AuditReport, Finding, TaskRecord, TaskStatus};

const MAX_CELL: usize = 60;

pub struct ConsoleReporter;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "Type")]
    task_type: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Failed Attempts")]
    retries: u32,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Error")]
    error: String,
}

#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "Type")]
    task_type: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }

    fn status_label(status: TaskStatus) -> String {
        match status {
            TaskStatus::Completed => "COMPLETED".green().to_string(),
            TaskStatus::Failed => "FAILED".red().bold().to_string(),
            TaskStatus::Running => "RUNNING".cyan().to_string(),
            TaskStatus::Pending => "PENDING".yellow().to_string(),
        }
    }

    fn task_row(task: &TaskRecord) -> TaskRow {
        let error = task
            .error
            .as_deref()
            .map(|e| truncate(e, MAX_CELL))
            .unwrap_or_default();
        TaskRow {
            task_type: task.task_type.clone(),
            target: task.target.clone(),
            retries: task.retries,
            status: Self::status_label(task.status),
            error,
        }
    }

    pub fn print_tasks(&self, report: &AuditReport) {
        let rows: Vec<TaskRow> = report.tasks.iter().map(Self::task_row).collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();

        println!("\n{}", table);
    }

    pub fn print_findings(&self, report: &AuditReport) {
        if report.findings.is_empty() {
            return;
        }

        let rows: Vec<FindingRow> = report
            .findings
            .iter()
            .flat_map(|(target, by_type)| {
                by_type.iter().map(move |(task_type, finding)| FindingRow {
                    target: target.clone(),
                    task_type: task_type.clone(),
                    result: Self::finding_cell(finding),
                })
            })
            .collect();

        println!("\n{}", "Findings".bold().underline());
        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .to_string();
        println!("{}", table);
    }

    fn finding_cell(finding: &Finding) -> String {
        let text = finding.summary(MAX_CELL);
        match finding {
            Finding::Injection(verdict) if verdict.vulnerable => text.red().bold().to_string(),
            _ if finding.is_empty() => text.dimmed().to_string(),
            _ => text,
        }
    }

    pub fn print_summary(&self, report: &AuditReport) {
        let summary = report.summary();

        println!("\n{}", "Summary".bold().underline());
        println!(
            "{} tasks, {} target(s) with findings",
            summary.total_tasks, summary.targets_with_findings
        );
        println!("  {}: {}", "COMPLETED".green(), summary.completed);
        if summary.failed > 0 {
            println!("  {}: {}", "FAILED".red().bold(), summary.failed);
        }
        if summary.unfinished > 0 {
            println!("  {}: {}", "PENDING".yellow(), summary.unfinished);
        }
        if summary.total_retries > 0 {
            println!("  {}: {}", "Failed attempts".cyan(), summary.total_retries);
        }
        println!(
            "  Scope: {} domain(s), {} network(s)",
            report.scope.domains.len(),
            report.scope.ips.len()
        );
        println!();
    }

    pub fn print_scope_check(&self, target: &str, in_scope: bool) {
        let verdict = if in_scope {
            "IN SCOPE".green().bold()
        } else {
            "OUT OF SCOPE".red().bold()
        };
        println!("{:<40} {}", target, verdict);
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() <= max_len && line.len() == text.len() {
        return line.to_string();
    }
    let cut: String = line.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
}
