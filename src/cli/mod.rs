//! Downtime classifier CLI
//!
//! Runs the HTTP server, or trains and inspects datasets offline.

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::preprocessing::MissingValueReport;
use crate::training::{TrainEngine, TrainingConfig, TrainingReport};
use crate::utils::{describe_columns, DataLoader};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "downtime-classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train a decision tree on CSV data and predict machine downtime")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Server port, falls back to API_PORT or 8080
        #[arg(short, long)]
        port: Option<u16>,

        /// Server host, falls back to API_HOST or 0.0.0.0
        #[arg(long)]
        host: Option<String>,
    },

    /// Train a decision tree offline and print the evaluation
    Train {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Feature columns, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        features: Vec<String>,

        /// Target column name
        #[arg(short, long)]
        target: String,
    },

    /// Show columns, dtypes and missing counts of a CSV file
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_train(data_path: &Path, features: &[String], target: &str) -> anyhow::Result<()> {
    section("Train");

    step_run("Loading data");
    let start = Instant::now();
    let df = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()));

    let config = TrainingConfig::new(features.to_vec(), target);

    step_run(&format!("Training decision tree on {}", target.cyan()));
    let outcome = TrainEngine::new(config).fit(&df)?;
    step_done(&format!("{:.3}s", outcome.report.training_time_secs));

    print_missing(&outcome.report.missing_values);
    print_report(&outcome.report);

    println!();
    Ok(())
}

fn print_missing(report: &MissingValueReport) {
    section("Missing values");
    println!("  {:<24} {:>8} {:>10}", muted("Column"), muted("Missing"), muted("Percent"));
    println!("  {}", dim(&"─".repeat(44)));
    for col in &report.columns {
        println!("  {:<24} {:>8} {:>9.2}%", col.name, col.missing, col.percent);
    }
}

fn print_report(report: &TrainingReport) {
    let metrics = &report.metrics;

    section("Evaluation");
    println!("  {:<12} {} / {}", muted("Train/Test"), report.n_train, report.n_test);
    let classes: Vec<String> = report.classes.iter().map(|c| c.to_string()).collect();
    println!("  {:<12} {}", muted("Classes"), classes.join(", "));
    println!("  {:<12} {:.4}", muted("Accuracy"), metrics.accuracy);
    println!("  {:<12} {:.4}", muted("Precision"), metrics.precision);
    println!("  {:<12} {:.4}", muted("Recall"), metrics.recall);
    println!("  {:<12} {:.4}", muted("F1"), metrics.f1_score);

    section("Confusion matrix");
    let cm = &metrics.confusion_matrix;
    let header: String = cm.labels.iter().map(|l| format!("{:>8}", l)).collect();
    println!("  {:>8}{}", muted("true\\pred"), muted(&header));
    for (label, row) in cm.labels.iter().zip(&cm.matrix) {
        let cells: String = row.iter().map(|v| format!("{:>8}", v)).collect();
        println!("  {:>8} {}", label, cells);
    }

    section("Feature importances");
    for (name, importance) in &report.feature_importances {
        let bar = "█".repeat((importance * 30.0).round() as usize);
        println!("  {:<24} {:>7.4} {}", name, importance, accent(&bar));
    }
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let df = DataLoader::new().load_csv(data_path)?;

    println!("  {:<12} {}", muted("File"), data_path.display());
    println!("  {:<12} {}", muted("Rows"), df.height());
    println!("  {:<12} {}", muted("Columns"), df.width());
    println!();

    let missing = MissingValueReport::from_frame(&df, df.height());

    println!("  {:<24} {:<12} {:>8} {:>9}", muted("Column"), muted("Type"), muted("Missing"), muted("Percent"));
    println!("  {}", dim(&"─".repeat(56)));

    for (name, dtype) in describe_columns(&df) {
        let (count, percent) = missing
            .get(&name)
            .map(|c| (c.missing, c.percent))
            .unwrap_or((0, 0.0));
        println!(
            "  {:<24} {:<12} {:>8} {:>8.2}%",
            name,
            dtype.truecolor(140, 140, 140),
            count,
            percent
        );
    }

    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    use crate::server::{run_server, ServerConfig};

    let mut config = ServerConfig::default();
    if let Some(host) = host {
        config = config.with_host(host);
    }
    if let Some(port) = port {
        config = config.with_port(port);
    }

    let base = format!("http://{}:{}", config.host, config.port);

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", "Downtime Classifier".white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Upload ", &format!("POST {}/upload", base)));
    line_box(&kv("Train  ", &format!("POST {}/train", base)));
    line_box(&kv("Predict", &format!("POST {}/predict", base)));
    line_box(&kv("Health ", &format!("GET  {}/health", base)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi() {
        let colored = format!("{}", "abc".truecolor(1, 2, 3));
        assert_eq!(strip_ansi(&colored), "abc");
    }

    #[test]
    fn test_parse_train_command() {
        let cli = Cli::try_parse_from([
            "downtime-classifier",
            "train",
            "--data",
            "machines.csv",
            "--features",
            "Temperature,Run_Time",
            "--target",
            "Downtime",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Train { features, target, .. }) => {
                assert_eq!(features, vec!["Temperature", "Run_Time"]);
                assert_eq!(target, "Downtime");
            }
            _ => panic!("expected train command"),
        }
    }

    #[test]
    fn test_no_command_defaults_to_none() {
        let cli = Cli::try_parse_from(["downtime-classifier"]).unwrap();
        assert!(cli.command.is_none());
    }
}
