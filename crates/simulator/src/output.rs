// Report rendering (text table or JSON)

use colored::Colorize;
use handoff_core::application::SimulationReport;
use handoff_core::domain::{WorkerOutcome, WorkerReport};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct WorkerRow {
    worker: String,
    role: String,
    quota: usize,
    completed: usize,
    outcome: String,
}

impl From<&WorkerReport> for WorkerRow {
    fn from(report: &WorkerReport) -> Self {
        Self {
            worker: report.worker.clone(),
            role: report.role.to_string(),
            quota: report.quota,
            completed: report.completed,
            outcome: report.outcome.to_string(),
        }
    }
}

pub fn render_json(report: &SimulationReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn render_text(report: &SimulationReport) -> String {
    let mut out = String::new();

    let headline = if report.is_complete() {
        "✓ Simulation completed".green().bold()
    } else {
        "⚠ Simulation finished with a shortfall".yellow().bold()
    };
    out.push_str(&format!("{}\n\n", headline));

    let config = &report.config;
    out.push_str(&format!("  {} {}\n", "Run:".bold(), report.run_id));
    out.push_str(&format!(
        "  {} producers={} consumers={} msgs/producer={} capacity={}\n",
        "Config:".bold(),
        config.producers,
        config.consumers,
        config.messages_per_producer,
        config.queue_capacity
    ));
    out.push_str(&format!(
        "  {} {}/{} consumed ({} produced, {} left in queue)\n",
        "Transferred:".bold(),
        report.consumed,
        report.expected,
        report.produced,
        report.remaining_in_queue
    ));
    if report.shortfall() > 0 {
        out.push_str(&format!(
            "  {} {}\n",
            "Shortfall:".bold(),
            report.shortfall().to_string().red()
        ));
    }
    if report.timed_out {
        out.push_str(&format!("  {} {}\n", "Timed out:".bold(), "yes".yellow()));
    }
    if report.detached_workers > 0 {
        out.push_str(&format!(
            "  {} {}\n",
            "Detached workers:".bold(),
            report.detached_workers
        ));
    }
    out.push_str(&format!("  {} {} ms\n\n", "Elapsed:".bold(), report.elapsed_ms()));

    let rows: Vec<WorkerRow> = report.workers.iter().map(WorkerRow::from).collect();
    out.push_str(&Table::new(rows).to_string());
    out.push('\n');

    let lost = report
        .workers
        .iter()
        .filter(|w| w.outcome == WorkerOutcome::Lost)
        .count();
    if lost > 0 {
        out.push_str(&format!("\n  {} {} worker(s) never reported back\n", "✗".red(), lost));
    }

    out
}
