use querypilot::Report;
use std::fmt::Write;

const WIDTH: usize = 60;
const TOP_LABELS: usize = 10;

pub fn banner(total: usize, concurrency: usize, templates: usize) -> String {
    format!(
        "\n--- STARTING QUERYPILOT WORKLOAD ---\n\
         Workload          : {templates} query templates\n\
         Requests          : {total}\n\
         Concurrency       : {concurrency} workers\n\
         {}\n",
        "=".repeat(WIDTH)
    )
}

pub fn render(report: &Report) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_report(&mut out, report);
    out
}

fn write_report(out: &mut String, report: &Report) -> std::fmt::Result {
    let rule = "=".repeat(WIDTH);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "SIMULATION REPORT")?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Duration          : {:.4} s", report.duration.as_secs_f64())?;
    writeln!(out, "Throughput (QPS)  : {:.2}", report.throughput)?;
    writeln!(out, "Avg Latency       : {:.2} ms", report.average_latency_ms)?;
    writeln!(
        out,
        "Latency p50/p90/p99 : {:.2} / {:.2} / {:.2} ms",
        millis(report.latency_p50),
        millis(report.latency_p90),
        millis(report.latency_p99),
    )?;
    writeln!(out, "{}", "-".repeat(WIDTH))?;
    writeln!(out, "Successful Trx    : {}", report.success_count)?;
    writeln!(out, "Failed Trx        : {}", report.failure_count)?;

    if !report.label_histogram.is_empty() {
        writeln!(out, "\nBusiness Action Distribution (Top {TOP_LABELS}):")?;
        for entry in report.label_histogram.iter().take(TOP_LABELS) {
            writeln!(out, " - {:<25} : {}", entry.key, entry.count)?;
        }
    }

    if !report.error_histogram.is_empty() {
        writeln!(out, "\nError Analysis:")?;
        for entry in &report.error_histogram {
            writeln!(out, "[{}x] {}", entry.count, entry.key)?;
        }
    }
    writeln!(out, "{rule}")
}

fn millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.
}
