//! `ringscope`: token ring balance analysis for `nodetool ring` dumps.
//!
//! # Usage
//!
//! ```text
//! ringscope analyze ring.txt                 # per-datacenter balance report
//! ringscope advise ring.txt --max-moves 5    # rebalancing plan
//! ringscope diff before.txt after.txt        # compare two snapshots
//! ringscope trends mon.txt tue.txt wed.txt   # direction over a series
//! ringscope analyze ring.txt --json -d dc1   # JSON for one datacenter
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ringscope_balance::BalanceReport;
use ringscope_cli::config::CliConfig;
use ringscope_cli::parser::parse_ring_dump;
use ringscope_engine::{
    Advice, AnalysisConfig, ClusterAnalysis, DatacenterAnalysis, analyze_cluster,
    assign_palette, palette_len_for,
};
use ringscope_history::{SnapshotComparison, SnapshotDiffer, TrendReport, detect_trends};
use ringscope_types::SnapshotMeta;
use serde::Serialize;
use tracing::{debug, info, warn};

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "ringscope",
    version,
    about = "Token ring balance analysis for nodetool ring dumps"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "RINGSCOPE_CONFIG")]
    config: Option<PathBuf>,

    /// Print JSON instead of a text summary.
    #[arg(long, global = true)]
    json: bool,

    /// Only analyse this datacenter.
    #[arg(short, long, global = true)]
    datacenter: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report ownership, coverage, gaps, and balance per datacenter.
    Analyze {
        /// `nodetool ring` output file.
        file: PathBuf,
    },

    /// Suggest token moves that would even out ownership.
    Advise {
        /// `nodetool ring` output file.
        file: PathBuf,

        /// Maximum number of moves to suggest (overrides the config file).
        #[arg(short = 'n', long)]
        max_moves: Option<usize>,
    },

    /// Compare two snapshots of the same cluster.
    Diff {
        /// Earlier snapshot.
        before: PathBuf,
        /// Later snapshot.
        after: PathBuf,
    },

    /// Show how balance, tokens, and gaps moved across snapshots.
    Trends {
        /// Snapshot files.
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,

        /// Treat files as chronological, one hour apart, instead of using
        /// their modification times.
        #[arg(long)]
        ordered: bool,
    },
}

/// Output options shared by every command.
struct Output {
    json: bool,
    datacenter: Option<String>,
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    let mut analysis_config = config
        .analysis_config()
        .context("invalid configuration")?;
    let out = Output {
        json: cli.json,
        datacenter: cli.datacenter,
    };

    match cli.command {
        Commands::Analyze { file } => cmd_analyze(&file, &analysis_config, &out),
        Commands::Advise { file, max_moves } => {
            if let Some(n) = max_moves {
                analysis_config.advisor.max_moves = n;
            }
            cmd_advise(&file, &analysis_config, &out)
        }
        Commands::Diff { before, after } => cmd_diff(&before, &after, &analysis_config, &out),
        Commands::Trends { files, ordered } => {
            cmd_trends(&files, ordered, &analysis_config, &out)
        }
    }
}

fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// -----------------------------------------------------------------------
// Loading
// -----------------------------------------------------------------------

/// Read, parse, and analyse one dump, optionally narrowed to one datacenter.
fn load_snapshot(
    path: &Path,
    config: &AnalysisConfig,
    datacenter: Option<&str>,
) -> Result<ClusterAnalysis> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut input =
        parse_ring_dump(&text).with_context(|| format!("failed to parse {}", path.display()))?;

    if let Some(dc) = datacenter {
        input.retain(|name, _| name == dc);
        if input.is_empty() {
            bail!("datacenter {dc:?} not found in {}", path.display());
        }
    }

    let analysis = analyze_cluster(&input, config)?;
    info!(
        file = %path.display(),
        analyzed = analysis.summary.analyzed,
        failed = analysis.summary.failed,
        "analysed ring dump"
    );
    Ok(analysis)
}

/// Label and timestamp for a snapshot file.
///
/// `index` is used as an hour offset when `ordered` is set or when the
/// modification time is unavailable.
fn snapshot_meta(path: &Path, index: usize, ordered: bool) -> SnapshotMeta {
    let label = path.display().to_string();
    let fallback = index as i64 * 3_600;
    if ordered {
        return SnapshotMeta::new(label, fallback);
    }
    let taken_at = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(fallback);
    SnapshotMeta::new(label, taken_at)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report_failures(analysis: &ClusterAnalysis) {
    for failure in analysis.failures() {
        warn!(
            datacenter = %failure.datacenter,
            kind = %failure.kind,
            "{}",
            failure.message
        );
    }
}

// -----------------------------------------------------------------------
// ringscope analyze
// -----------------------------------------------------------------------

fn cmd_analyze(file: &Path, config: &AnalysisConfig, out: &Output) -> Result<()> {
    let analysis = load_snapshot(file, config, out.datacenter.as_deref())?;
    if out.json {
        return print_json(&analysis);
    }

    println!("Ring analysis: {}", file.display());
    println!(
        "Datacenters: {} ({} analysed, {} failed)",
        analysis.summary.datacenters, analysis.summary.analyzed, analysis.summary.failed
    );
    for (name, outcome) in &analysis.datacenters {
        println!();
        match outcome.analysis() {
            Some(dc) => print_datacenter(dc),
            None => {
                if let Some(failure) = outcome.failure() {
                    println!("Datacenter: {name}  FAILED ({})", failure.kind);
                    println!("  {}", failure.message);
                }
            }
        }
    }

    let shared: Vec<_> = analysis.summary.shared_nodes().collect();
    if !shared.is_empty() {
        println!();
        println!("Nodes in several datacenters:");
        for (address, node) in shared {
            println!(
                "  {address}: {} tokens in {}",
                node.total_tokens,
                node.datacenters.join(", ")
            );
        }
    }
    Ok(())
}

fn print_datacenter(dc: &DatacenterAnalysis) {
    let report = &dc.report;
    println!("Datacenter: {}", dc.datacenter);
    println!("  Snapshot:     {}", dc.snapshot_id);
    println!("  Nodes:        {}", report.total_nodes);
    println!("  Tokens:       {}", report.total_tokens);
    println!("  Distribution:");
    let palette = assign_palette(
        report.nodes.keys().map(String::as_str),
        palette_len_for(report.nodes.len()),
    );
    for (address, stats) in &report.nodes {
        println!(
            "    [{:>2}] {address}: {} tokens ({:.2}%), load {}",
            palette.get(address).copied().unwrap_or_default(),
            stats.token_count,
            stats.percentage,
            format_bytes(stats.load_bytes)
        );
    }
    println!("  Coverage:     {:.2}%", report.coverage_percentage);
    println!(
        "  Gaps:         {:.2}% ({} gaps)",
        report.gap_percentage, report.gap_count
    );
    let ring = ringscope_types::RING_SIZE_F64;
    let stats = &report.range_stats;
    println!(
        "  Ranges:       largest {:.2}%, smallest {:.2}%, average {:.2}% of ring",
        stats.largest_range as f64 / ring * 100.0,
        stats.smallest_range as f64 / ring * 100.0,
        stats.average_range / ring * 100.0
    );
    println!(
        "  Balance:      {:.3} (1.0 = perfect balance)",
        report.balance_score
    );
    if !dc.warnings.is_empty() {
        println!("  Warnings:");
        for w in &dc.warnings {
            println!("    line {}: {} {}", w.line, w.field, w.message);
        }
    }
}

// -----------------------------------------------------------------------
// ringscope advise
// -----------------------------------------------------------------------

fn cmd_advise(file: &Path, config: &AnalysisConfig, out: &Output) -> Result<()> {
    let analysis = load_snapshot(file, config, out.datacenter.as_deref())?;
    report_failures(&analysis);

    let advice: BTreeMap<&str, &Advice> = analysis
        .analyzed()
        .map(|dc| (dc.datacenter.as_str(), &dc.advice))
        .collect();
    if advice.is_empty() {
        bail!("no datacenter in {} could be analysed", file.display());
    }
    if out.json {
        return print_json(&advice);
    }

    for (name, advice) in advice {
        println!();
        println!("Datacenter: {name}");
        let plan = match advice {
            Advice::Ready(plan) => plan,
            Advice::Unavailable { reason, .. } => {
                println!("  No advice: {reason}");
                continue;
            }
        };

        println!(
            "  Status:    {} (score {:.3})",
            plan.overall_status, plan.balance_score
        );
        println!("  Nodes:");
        for (address, node) in &plan.nodes {
            println!(
                "    {address}: {} tokens, ideal {:.1}, {:+.1}% ({})",
                node.current, node.ideal, node.deviation_percent, node.status
            );
        }

        if plan.recommendations.is_empty() {
            println!("  No rebalancing needed.");
            continue;
        }
        println!("  Recommendations:");
        for rec in &plan.recommendations {
            println!("    [{}] {}: {}", rec.priority, rec.node, rec.reason);
        }

        if !plan.moves.is_empty() {
            println!("  Suggested moves:");
            for (i, m) in plan.moves.iter().enumerate() {
                println!(
                    "    {}. token {}: {} -> {} (impact {:+.3}, ~{})",
                    i + 1,
                    m.token,
                    m.from_node,
                    m.to_node,
                    m.impact_score,
                    format_bytes(m.estimated_bytes)
                );
            }
        }
        let cost = &plan.cost;
        println!(
            "  Estimate (approximate): {} moves, ~{}, ~{:.1} min, balance {:.3} -> {:.3}",
            cost.movement_count,
            format_bytes(cost.estimated_data_bytes),
            cost.estimated_time_minutes,
            cost.current_balance,
            cost.expected_balance
        );
    }
    Ok(())
}

// -----------------------------------------------------------------------
// ringscope diff
// -----------------------------------------------------------------------

fn cmd_diff(before: &Path, after: &Path, config: &AnalysisConfig, out: &Output) -> Result<()> {
    let dc = out.datacenter.as_deref();
    let old = load_snapshot(before, config, dc)?;
    let new = load_snapshot(after, config, dc)?;
    report_failures(&old);
    report_failures(&new);

    let old_meta = snapshot_meta(before, 0, false);
    let new_meta = snapshot_meta(after, 1, false);

    let mut comparisons: BTreeMap<String, SnapshotComparison> = BTreeMap::new();
    for a in old.analyzed() {
        let Some(b) = new.analyzed().find(|b| b.datacenter == a.datacenter) else {
            warn!(datacenter = %a.datacenter, "not comparable: missing or failed in later snapshot");
            continue;
        };
        let comparison = SnapshotDiffer::compare(&old_meta, &a.report, &new_meta, &b.report);
        comparisons.insert(a.datacenter.clone(), comparison);
    }
    for b in new.analyzed() {
        if !comparisons.contains_key(&b.datacenter) {
            warn!(datacenter = %b.datacenter, "not comparable: missing or failed in earlier snapshot");
        }
    }
    if comparisons.is_empty() {
        bail!("no datacenter was analysed in both snapshots");
    }

    if out.json {
        return print_json(&comparisons);
    }
    for (name, diff) in &comparisons {
        print_comparison(name, diff);
    }
    Ok(())
}

fn print_comparison(datacenter: &str, diff: &SnapshotComparison) {
    println!();
    println!("Datacenter: {datacenter}");
    println!(
        "  {} -> {} ({}s apart)",
        diff.before.label, diff.after.label, diff.time_span_secs
    );
    println!("  Nodes added:     {}", list_or_none(&diff.nodes_added));
    println!("  Nodes removed:   {}", list_or_none(&diff.nodes_removed));
    println!("  Nodes unchanged: {}", diff.nodes_unchanged.len());
    println!(
        "  Tokens:          {} -> {} ({:+})",
        diff.total_tokens_before, diff.total_tokens_after, diff.total_tokens_change
    );
    for (node, delta) in diff.changed_nodes() {
        println!(
            "    {node}: {} -> {} ({:+})",
            delta.before, delta.after, delta.change
        );
    }
    let verdict = if diff.balance_change > 0.0 {
        "improved"
    } else if diff.balance_change < 0.0 {
        "degraded"
    } else {
        "unchanged"
    };
    println!(
        "  Balance:         {:.3} -> {:.3} ({:+.3}, {verdict})",
        diff.balance_score_before, diff.balance_score_after, diff.balance_change
    );
    println!(
        "  Gaps:            {} -> {} ({:+}, {:+.2}% of ring)",
        diff.gaps_before, diff.gaps_after, diff.gap_change, diff.gap_percentage_change
    );
}

fn list_or_none(nodes: &[String]) -> String {
    if nodes.is_empty() {
        "none".to_string()
    } else {
        nodes.join(", ")
    }
}

// -----------------------------------------------------------------------
// ringscope trends
// -----------------------------------------------------------------------

fn cmd_trends(
    files: &[PathBuf],
    ordered: bool,
    config: &AnalysisConfig,
    out: &Output,
) -> Result<()> {
    let mut series: BTreeMap<String, Vec<(SnapshotMeta, BalanceReport)>> = BTreeMap::new();
    for (index, path) in files.iter().enumerate() {
        let analysis = load_snapshot(path, config, out.datacenter.as_deref())?;
        report_failures(&analysis);
        let meta = snapshot_meta(path, index, ordered);
        for dc in analysis.analyzed() {
            series
                .entry(dc.datacenter.clone())
                .or_default()
                .push((meta.clone(), dc.report.clone()));
        }
    }

    let mut trends: BTreeMap<String, TrendReport> = BTreeMap::new();
    for (name, snapshots) in &series {
        match detect_trends(snapshots) {
            Ok(report) => {
                trends.insert(name.clone(), report);
            }
            Err(e) => warn!(datacenter = %name, error = %e, "skipping trends"),
        }
    }
    if trends.is_empty() {
        bail!("no datacenter was analysed in at least two snapshots");
    }
    debug!(datacenters = trends.len(), "computed trends");

    if out.json {
        return print_json(&trends);
    }
    for (name, report) in &trends {
        println!();
        println!("Datacenter: {name}");
        for s in &report.samples {
            println!(
                "  {}: {} tokens, {} nodes, balance {:.3}, {} gaps ({:.2}%)",
                s.snapshot.label,
                s.total_tokens,
                s.node_count,
                s.balance_score,
                s.gap_count,
                s.gap_percentage
            );
        }
        println!("  Token trend:   {}", report.token_trend);
        println!("  Balance trend: {}", report.balance_trend);
        println!("  Gap trend:     {}", report.gap_trend);
    }
    Ok(())
}

// -----------------------------------------------------------------------
// Formatting
// -----------------------------------------------------------------------

/// Human-readable binary size, e.g. `1.46 TiB`.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}
