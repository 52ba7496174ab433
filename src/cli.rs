use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scanwarden")]
#[command(version, about = "Scope-enforcing orchestrator for external security scanning tools")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Html,
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    Run {
        #[arg(short, long)]
        plan: PathBuf,

        #[arg(long, value_delimiter = ',')]
        domains: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        ips: Vec<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        timeout: Option<u64>,

        #[arg(short, long)]
        concurrency: Option<usize>,

        #[arg(long)]
        retries: Option<u32>,

        #[arg(long)]
        log_file: Option<PathBuf>,

        #[arg(long)]
        no_log_file: bool,

        #[arg(long)]
        html: Option<PathBuf>,

        #[arg(short, long)]
        verbose: bool,
    },

    Report {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value = "html")]
        format: ReportFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    Check {
        #[arg(long, value_delimiter = ',')]
        domains: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        ips: Vec<String>,

        #[arg(required = true)]
        targets: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_with_comma_separated_scope() {
        let cli = Cli::try_parse_from([
            "scanwarden",
            "run",
            "--plan",
            "plan.json",
            "--domains",
            "example.com,example.org",
            "--ips",
            "10.0.0.0/8",
            "-c",
            "4",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                plan,
                domains,
                ips,
                concurrency,
                ..
            } => {
                assert_eq!(plan, PathBuf::from("plan.json"));
                assert_eq!(domains, vec!["example.com", "example.org"]);
                assert_eq!(ips, vec!["10.0.0.0/8"]);
                assert_eq!(concurrency, Some(4));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_report_format_default() {
        let cli = Cli::try_parse_from(["scanwarden", "report", "-i", "audit_report.json"]).unwrap();
        match cli.command {
            Commands::Report { format, .. } => assert_eq!(format, ReportFormat::Html),
            _ => panic!("expected report"),
        }
    }

    #[test]
    fn test_check_requires_targets() {
        assert!(Cli::try_parse_from(["scanwarden", "check", "--domains", "example.com"]).is_err());
    }
}
