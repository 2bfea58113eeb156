use std::env;
use std::time::Instant;

use mda_bound::{BoundTable, BoundTableBuilder};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("table_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    eprintln!("\n{}", "=".repeat(72));
    eprintln!("MDA Bound Table Probe: build cost and correctness at scale");
    eprintln!("{}", "=".repeat(72));
    eprintln!();
    eprintln!("Builds stopping-point tables at increasing hypothesis counts and");
    eprintln!("verifies small ones against a probe-by-probe baseline (up to max");
    eprintln!("hypothesis {}). Metrics: wall_s (seconds), rss_delta_kib.", options.verify_limit);
    eprintln!();

    let mut sys = System::new();
    let mut measurements = Vec::new();

    eprintln!("[1/2] Batch builds at node significance 0.05...");
    measurements.extend(run_batch_builds(&options, &mut sys));
    eprintln!();

    eprintln!("[2/2] Incremental growth from a warm 16-hypothesis table...");
    measurements.extend(run_growth(&options, &mut sys));
    eprintln!();

    print_summary(&measurements);

    if let Err(err) = options.format.write(&measurements) {
        eprintln!("table_probe output error: {err}");
        std::process::exit(1);
    }
}

struct Options {
    format: OutputFormat,
    verify_limit: usize,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut format = OutputFormat::Csv;
        let mut verify_limit = 64usize;

        while let Some(arg) = args.next() {
            let arg = arg.into();
            if arg == "--help" || arg == "-h" {
                Options::print_help();
                std::process::exit(0);
            } else if let Some(value) = arg.strip_prefix("--format=") {
                format = OutputFormat::from_str(value)?;
            } else if arg == "--format" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --format".to_string())?
                    .into();
                format = OutputFormat::from_str(&value)?;
            } else if let Some(value) = arg.strip_prefix("--verify-limit=") {
                verify_limit = value
                    .parse::<usize>()
                    .map_err(|_| "verify limit must be a positive integer".to_string())?;
            } else if arg == "--verify-limit" {
                let value = args
                    .next()
                    .ok_or_else(|| "missing value after --verify-limit".to_string())?
                    .into();
                verify_limit = value
                    .parse::<usize>()
                    .map_err(|_| "verify limit must be a positive integer".to_string())?;
            } else {
                return Err(format!("unrecognized argument '{arg}'"));
            }
        }

        Ok(Self {
            format,
            verify_limit,
        })
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin table_probe [-- <options>]

Options:
  --format <csv|table|json>     Output format (default: csv)
  --verify-limit <N>            Largest max-hypothesis verified against the baseline (default: 64)
  -h, --help                    Print this help message

Examples:
  cargo run --bin table_probe
  cargo run --bin table_probe -- --format table --verify-limit 32
"
        );
    }
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Csv,
    Table,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }

    fn write(self, measurements: &[Measurement]) -> Result<(), String> {
        match self {
            OutputFormat::Csv => write_csv(measurements),
            OutputFormat::Table => write_table(measurements),
            OutputFormat::Json => write_json(measurements),
        }
    }
}

#[derive(Clone)]
struct Measurement {
    scenario: &'static str,
    size_desc: String,
    wall_s: f64,
    rss_delta_kib: u64,
    verification_status: VerificationStatus,
    verification_detail: Option<String>,
}

#[derive(Clone, Copy)]
enum VerificationStatus {
    NotChecked,
    Passed,
    Failed,
}

impl VerificationStatus {
    fn label(&self) -> &'static str {
        match self {
            VerificationStatus::NotChecked => "not_checked",
            VerificationStatus::Passed => "passed",
            VerificationStatus::Failed => "failed",
        }
    }
}

const SIGNIFICANCE: f64 = 0.05;

fn run_batch_builds(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const SIZES: &[usize] = &[16, 32, 64, 128, 256, 512, 1024];
    let total = SIZES.len();
    SIZES
        .iter()
        .enumerate()
        .map(|(idx, &max)| {
            eprint!("      [{}/{}] max_hypothesis {}... ", idx + 1, total, max);
            let mut last_point = 0usize;
            let m = measure("batch_build", format!("max={max}"), sys, || {
                let table = BoundTableBuilder::new()
                    .node_significance(SIGNIFICANCE)
                    .max_hypothesis(max)
                    .build()
                    .expect("build");
                last_point = table.stopping_point(max);
                verify(&table, options.verify_limit)
            });
            report_line(&m, &format!("nk({max})={last_point}"));
            m
        })
        .collect()
}

fn run_growth(options: &Options, sys: &mut System) -> Vec<Measurement> {
    const TARGETS: &[usize] = &[32, 64, 128, 256, 512];
    let total = TARGETS.len();
    TARGETS
        .iter()
        .enumerate()
        .map(|(idx, &target)| {
            eprint!("      [{}/{}] grow 16 -> {}... ", idx + 1, total, target);
            let mut last_point = 0usize;
            let m = measure("grow", format!("16->{target}"), sys, || {
                let mut table = BoundTableBuilder::new()
                    .node_significance(SIGNIFICANCE)
                    .max_hypothesis(16)
                    .build()
                    .expect("build");
                table.grow(target).expect("grow");
                last_point = table.stopping_point(target);
                verify(&table, options.verify_limit)
            });
            report_line(&m, &format!("nk({target})={last_point}"));
            m
        })
        .collect()
}

fn report_line(m: &Measurement, detail: &str) {
    let status_icon = match m.verification_status {
        VerificationStatus::Passed => "✓",
        VerificationStatus::Failed => "✗",
        VerificationStatus::NotChecked => "○",
    };
    eprintln!(
        "{} {}, time={:.3}s, status={}",
        status_icon,
        detail,
        m.wall_s,
        m.verification_status.label()
    );
}

fn verify(table: &BoundTable, verify_limit: usize) -> (VerificationStatus, Option<String>) {
    if table.max_hypothesis() > verify_limit {
        return (VerificationStatus::NotChecked, None);
    }
    let baseline = baseline_stopping_points(table.confidence(), table.max_hypothesis());
    if table.stopping_points() == baseline.as_slice() {
        (VerificationStatus::Passed, None)
    } else {
        let mismatch = (2..=table.max_hypothesis())
            .find(|&h| table.stopping_point(h) != baseline[h])
            .unwrap_or(0);
        (
            VerificationStatus::Failed,
            Some(format!(
                "h={mismatch}: expected {}, got {}",
                baseline[mismatch],
                table.stopping_point(mismatch)
            )),
        )
    }
}

/// Probe-by-probe walk of the same chain; quadratic in probe count but
/// structurally independent of the diagonal build.
fn baseline_stopping_points(confidence: f64, max_hypothesis: usize) -> Vec<usize> {
    let a2 = (1.0 - 0.9) * confidence;
    let levels: Vec<f64> = (0..=max_hypothesis)
        .map(|h| match h {
            0 | 1 => 0.0,
            2 => a2,
            _ => a2 * 0.9f64.powi(h as i32 - 2),
        })
        .collect();
    let mut nk = vec![0usize; max_hypothesis + 1];
    for h in 2..=max_hypothesis {
        let mut prev = vec![0f64; h + 1];
        let mut cur = vec![0f64; h + 1];
        prev[1] = 1.0;
        let mut n = 1usize;
        loop {
            n += 1;
            for j in 1..h {
                cur[j] = prev[j] * (j as f64 / h as f64)
                    + prev[j - 1] * ((h - j + 1) as f64 / h as f64);
                if j + 1 < h && nk[j + 1] != 0 && n >= nk[j + 1] {
                    cur[j] = 0.0;
                }
            }
            if n > nk[h - 1] && cur[h - 1] <= levels[h] {
                nk[h] = n;
                break;
            }
            std::mem::swap(&mut prev, &mut cur);
        }
    }
    nk
}

fn print_summary(measurements: &[Measurement]) {
    let mut passed = 0;
    let mut failed = 0;
    let mut not_checked = 0;
    for m in measurements {
        match m.verification_status {
            VerificationStatus::Passed => passed += 1,
            VerificationStatus::Failed => failed += 1,
            VerificationStatus::NotChecked => not_checked += 1,
        }
    }

    eprintln!("{}", "=".repeat(72));
    eprintln!(
        "Summary: {} measurements, {passed} passed, {failed} failed, {not_checked} not checked",
        measurements.len()
    );
    if failed > 0 {
        for m in measurements {
            if matches!(m.verification_status, VerificationStatus::Failed) {
                eprintln!(
                    "  ✗ {} ({}): {}",
                    m.scenario,
                    m.size_desc,
                    m.verification_detail.as_deref().unwrap_or("")
                );
            }
        }
    }
    eprintln!("{}", "=".repeat(72));
    eprintln!();
}

fn measure<F>(
    scenario: &'static str,
    size_desc: String,
    sys: &mut System,
    compute: F,
) -> Measurement
where
    F: FnOnce() -> (VerificationStatus, Option<String>),
{
    let before = rss_kib(sys);
    let start = Instant::now();
    let (status, detail) = compute();
    let duration = start.elapsed();
    let after = rss_kib(sys);

    Measurement {
        scenario,
        size_desc,
        wall_s: duration.as_secs_f64(),
        rss_delta_kib: after.saturating_sub(before),
        verification_status: status,
        verification_detail: detail,
    }
}

fn write_csv(measurements: &[Measurement]) -> Result<(), String> {
    println!("scenario,size_desc,wall_s,rss_delta_kib,verification_status,verification_detail");
    for m in measurements {
        let detail = m
            .verification_detail
            .as_ref()
            .map(|s| s.replace('"', "'"))
            .unwrap_or_default();
        println!(
            "{},{},{:.3},{},{},\"{}\"",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            detail
        );
    }
    Ok(())
}

fn write_table(measurements: &[Measurement]) -> Result<(), String> {
    let mut col1 = "scenario".len();
    let mut col2 = "size".len();
    for m in measurements {
        col1 = col1.max(m.scenario.len());
        col2 = col2.max(m.size_desc.len());
    }

    println!(
        "{:<col1$}  {:<col2$}  {:>12}  {:>14}  {:>12}  {}",
        "scenario",
        "size",
        "wall_s",
        "rss_delta_kib",
        "status",
        "detail",
        col1 = col1,
        col2 = col2
    );
    println!(
        "{:-<col1$}  {:-<col2$}  {:-<12}  {:-<14}  {:-<12}  {:-<12}",
        "",
        "",
        "",
        "",
        "",
        "",
        col1 = col1,
        col2 = col2
    );
    for m in measurements {
        println!(
            "{:<col1$}  {:<col2$}  {:>12.3}  {:>14}  {:>12}  {}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            m.verification_detail
                .as_ref()
                .map(|s| s.as_str())
                .unwrap_or(""),
            col1 = col1,
            col2 = col2
        );
    }
    Ok(())
}

fn write_json(measurements: &[Measurement]) -> Result<(), String> {
    println!("[");
    for (idx, m) in measurements.iter().enumerate() {
        let detail = m.verification_detail.as_ref().map(|s| s.replace('"', "'"));
        println!(
            "  {{\"scenario\":\"{}\",\"size\":\"{}\",\"wall_s\":{:.3},\"rss_delta_kib\":{},\"verification\":{{\"status\":\"{}\",\"detail\":{}}}}}{}",
            m.scenario,
            m.size_desc,
            m.wall_s,
            m.rss_delta_kib,
            m.verification_status.label(),
            match detail {
                Some(ref d) => format!("\"{d}\""),
                None => "null".to_string(),
            },
            if idx + 1 == measurements.len() { "" } else { "," }
        );
    }
    println!("]");
    Ok(())
}

fn rss_kib(sys: &mut System) -> u64 {
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    if let Some(process) = get_current_pid().ok().and_then(|pid| sys.process(pid)) {
        process.memory()
    } else {
        0
    }
}
