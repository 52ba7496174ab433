use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::Path;
use tera::{Context as TeraContext, Tera};

use crate::models::{AuditReport, TaskStatus};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

pub struct JsonExporter;

impl JsonExporter {
    pub fn export(report: &AuditReport, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<AuditReport> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let report: AuditReport = serde_json::from_str(&content)
            .with_context(|| format!("{} is not an audit report", path.display()))?;
        Ok(report)
    }
}

pub struct HtmlExporter;

impl HtmlExporter {
    pub fn export(report: &AuditReport, path: &Path) -> Result<()> {
        let html = Self::render(report)?;
        ensure_parent(path)?;
        fs::write(path, html).with_context(|| format!("Failed to write to {}", path.display()))?;
        Ok(())
    }

    pub fn render(report: &AuditReport) -> Result<String> {
        let mut tera = Tera::default();
        tera.add_raw_template("report", Self::get_template())?;

        let summary = report.summary();

        let mut context = TeraContext::new();
        context.insert("scan_time", &Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string());
        context.insert("summary", &summary);
        context.insert("domains", &report.scope.domains);
        context.insert("ips", &report.scope.ips);

        let tasks: Vec<TaskRow> = report
            .tasks
            .iter()
            .map(|t| TaskRow {
                task_type: t.task_type.clone(),
                target: t.target.clone(),
                status: t.status.to_string(),
                status_class: Self::status_class(t.status),
                retries: t.retries,
                error: t.error.clone().unwrap_or_default(),
            })
            .collect();

        let findings: Vec<FindingRow> = report
            .findings
            .iter()
            .flat_map(|(target, by_type)| {
                by_type.iter().map(move |(task_type, finding)| FindingRow {
                    target: target.clone(),
                    task_type: task_type.clone(),
                    value: finding.to_string(),
                    empty: finding.is_empty(),
                })
            })
            .collect();

        context.insert("tasks", &tasks);
        context.insert("findings", &findings);

        Ok(tera.render("report", &context)?)
    }

    fn status_class(status: TaskStatus) -> String {
        match status {
            TaskStatus::Completed => "ok",
            TaskStatus::Failed => "failed",
            TaskStatus::Pending | TaskStatus::Running => "pending",
        }
        .to_string()
    }

    fn get_template() -> &'static str {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Scanwarden Audit Report</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #0d1117; color: #c9d1d9; line-height: 1.6; }
        .container { max-width: 1200px; margin: 0 auto; padding: 2rem; }
        h1 { color: #58a6ff; margin-bottom: 0.5rem; }
        h2 { color: #c9d1d9; margin: 2rem 0 1rem; }
        .subtitle { color: #8b949e; margin-bottom: 2rem; }
        .summary { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 1rem; margin-bottom: 2rem; }
        .stat { background: #161b22; border: 1px solid #30363d; border-radius: 6px; padding: 1rem; text-align: center; }
        .stat-value { font-size: 2rem; font-weight: bold; }
        .stat-label { color: #8b949e; font-size: 0.875rem; }
        .failed .stat-value { color: #f85149; }
        .pending .stat-value { color: #d29922; }
        .ok .stat-value { color: #3fb950; }
        .scope { color: #8b949e; font-size: 0.875rem; }
        table { width: 100%; border-collapse: collapse; background: #161b22; border: 1px solid #30363d; border-radius: 6px; overflow: hidden; }
        th, td { padding: 0.75rem 1rem; text-align: left; border-bottom: 1px solid #30363d; }
        th { background: #21262d; color: #c9d1d9; font-weight: 600; }
        tr:hover { background: #21262d; }
        .status { padding: 0.25rem 0.5rem; border-radius: 4px; font-size: 0.75rem; font-weight: 600; }
        .status.failed { background: #f8514933; color: #f85149; }
        .status.pending { background: #d2992233; color: #d29922; }
        .status.ok { background: #3fb95033; color: #3fb950; }
        .error { font-size: 0.875rem; color: #8b949e; }
        .muted { color: #8b949e; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Scanwarden Audit Report</h1>
        <p class="subtitle">Generated: {{ scan_time }}</p>

        <div class="summary">
            <div class="stat">
                <div class="stat-value">{{ summary.total_tasks }}</div>
                <div class="stat-label">Tasks</div>
            </div>
            <div class="stat ok">
                <div class="stat-value">{{ summary.completed }}</div>
                <div class="stat-label">Completed</div>
            </div>
            <div class="stat failed">
                <div class="stat-value">{{ summary.failed }}</div>
                <div class="stat-label">Failed</div>
            </div>
            <div class="stat pending">
                <div class="stat-value">{{ summary.unfinished }}</div>
                <div class="stat-label">Unfinished</div>
            </div>
            <div class="stat">
                <div class="stat-value">{{ summary.total_retries }}</div>
                <div class="stat-label">Failed Attempts</div>
            </div>
        </div>

        <p class="scope">Scope domains: {% if domains %}{% for d in domains %}{{ d }}{% if not loop.last %}, {% endif %}{% endfor %}{% else %}none{% endif %}</p>
        <p class="scope">Scope networks: {% if ips %}{% for n in ips %}{{ n }}{% if not loop.last %}, {% endif %}{% endfor %}{% else %}none{% endif %}</p>

        <h2>Tasks</h2>
        <table>
            <thead>
                <tr>
                    <th>Type</th>
                    <th>Target</th>
                    <th>Attempts Failed</th>
                    <th>Status</th>
                </tr>
            </thead>
            <tbody>
                {% for task in tasks %}
                <tr>
                    <td>{{ task.task_type }}</td>
                    <td>
                        {{ task.target }}
                        {% if task.error %}<div class="error">{{ task.error }}</div>{% endif %}
                    </td>
                    <td>{{ task.retries }}</td>
                    <td><span class="status {{ task.status_class }}">{{ task.status }}</span></td>
                </tr>
                {% endfor %}
            </tbody>
        </table>

        <h2>Findings</h2>
        <table>
            <thead>
                <tr>
                    <th>Target</th>
                    <th>Type</th>
                    <th>Result</th>
                </tr>
            </thead>
            <tbody>
                {% for finding in findings %}
                <tr>
                    <td>{{ finding.target }}</td>
                    <td>{{ finding.task_type }}</td>
                    <td{% if finding.empty %} class="muted"{% endif %}>{{ finding.value }}</td>
                </tr>
                {% endfor %}
            </tbody>
        </table>
    </div>
</body>
</html>"#
    }
}

#[derive(serde::Serialize)]
struct TaskRow {
    task_type: String,
    target: String,
    status: String,
    status_class: String,
    retries: u32,
    error: String,
}

#[derive(serde::Serialize)]
struct FindingRow {
    target: String,
    task_type: String,
    value: String,
    empty: bool,
}
