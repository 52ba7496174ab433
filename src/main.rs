use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use scanwarden::cli::{Cli, Commands, ReportFormat};
use scanwarden::logging::init_logging;
use scanwarden::pipeline::{EventLog, LifecycleEvent, PipelineRunner, PlanFile, ProgressMode, ScopeSpec};
use scanwarden::reporter::{ConsoleReporter, HtmlExporter, JsonExporter};
use scanwarden::scope::ScopeConfig;
use scanwarden::tools::ProcessAdapter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            plan: plan_path,
            domains,
            ips,
            output,
            timeout,
            concurrency,
            retries,
            log_file,
            no_log_file,
            html,
            verbose,
        } => {
            init_logging(verbose);

            let mut plan_file = PlanFile::load(&plan_path)?;
            let settings = &mut plan_file.settings;
            if let Some(secs) = timeout {
                settings.timeout_secs = secs;
            }
            if let Some(n) = concurrency {
                settings.concurrency = n;
            }
            if let Some(n) = retries {
                settings.max_attempts = n;
            }
            if let Some(path) = output {
                settings.report_path = path;
            }
            if log_file.is_some() {
                settings.log_file = log_file;
            }
            if no_log_file {
                settings.log_file = None;
            }

            let plan = plan_file.into_plan(ScopeSpec { domains, ips })?;
            let settings = plan.settings;

            if plan.scope.is_empty() {
                warn!("Scope is empty, every task will be rejected");
            }

            let events = match &settings.log_file {
                Some(path) => EventLog::open(path)
                    .with_context(|| format!("Failed to open log file {}", path.display()))?,
                None => EventLog::discard(),
            };
            let events = Arc::new(events);

            let cancel = CancellationToken::new();
            let signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, no new tasks will be started");
                    signal.cancel();
                }
            });

            let adapter = Arc::new(ProcessAdapter::new(settings.tools.clone(), settings.timeout()));
            let progress = if verbose { ProgressMode::Detailed } else { ProgressMode::Compact };

            info!(tasks = plan.tasks.len(), "Loaded plan {}", plan_path.display());
            let runner = PipelineRunner::new(plan.scope, adapter, events.clone())
                .with_retry_policy(settings.retry_policy())
                .with_concurrency(settings.concurrency)
                .with_cancellation(cancel)
                .with_progress(progress);

            let report = runner.run(plan.tasks).await;

            JsonExporter::export(&report, &settings.report_path)?;
            events.record(LifecycleEvent::ReportWritten { path: &settings.report_path });

            if let Some(path) = html {
                HtmlExporter::export(&report, &path)?;
                info!("HTML report saved to {}", path.display());
            }
            events.flush();

            let reporter = ConsoleReporter::new();
            reporter.print_tasks(&report);
            reporter.print_findings(&report);
            reporter.print_summary(&report);
        }

        Commands::Report {
            input,
            format,
            output,
        } => {
            init_logging(false);
            let report = JsonExporter::load(&input)?;

            match format {
                ReportFormat::Html => {
                    let path = output.unwrap_or_else(|| PathBuf::from("audit_report.html"));
                    HtmlExporter::export(&report, &path)?;
                    info!("HTML report saved to {}", path.display());
                }
                ReportFormat::Json => match output {
                    Some(path) => {
                        JsonExporter::export(&report, &path)?;
                        info!("JSON report saved to {}", path.display());
                    }
                    None => println!("{}", serde_json::to_string_pretty(&report)?),
                },
                ReportFormat::Table => {
                    let reporter = ConsoleReporter::new();
                    reporter.print_tasks(&report);
                    reporter.print_findings(&report);
                    reporter.print_summary(&report);
                }
            }
        }

        Commands::Check {
            domains,
            ips,
            targets,
        } => {
            init_logging(false);
            let scope = ScopeConfig::new(&domains, &ips)?;
            let reporter = ConsoleReporter::new();
            for target in &targets {
                reporter.print_scope_check(target, scope.is_in_scope(target));
            }
        }
    }

    Ok(())
}
