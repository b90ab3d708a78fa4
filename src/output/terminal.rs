// Colored terminal output for proxy scores.

use colored::Colorize;

use super::truncate_chars;
use crate::ipintel::{CheckType, IpIntelError, ProxyVerdict};

/// Display a table of per-IP results in the terminal.
pub fn display_scores(results: &[(String, Result<f64, IpIntelError>)], check: CheckType) {
    if results.is_empty() {
        println!("No IP addresses given.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Proxy Scores ({} IPs, {} check) ===", results.len(), check).bold()
    );
    println!();

    println!(
        "  {:<40} {:>6}  {:<10}",
        "IP".dimmed(),
        "Score".dimmed(),
        "Verdict".dimmed(),
    );
    println!("  {}", "-".repeat(60).dimmed());

    for (ip, result) in results {
        match result {
            Ok(score) => {
                let verdict = ProxyVerdict::from_score(*score);
                println!(
                    "  {:<40} {:>6.3}  {}",
                    ip,
                    score,
                    colorize_verdict(verdict)
                );
            }
            Err(e) => {
                println!(
                    "  {:<40} {:>6}  {}",
                    ip,
                    "-",
                    truncate_chars(&e.to_string(), 60).red()
                );
            }
        }
    }

    println!();

    let summary = summarize(results);

    if summary.proxies > 0 {
        println!("  {} {} likely proxies", "!!".red().bold(), summary.proxies);
    }
    if summary.suspicious > 0 {
        println!("  {} {} suspicious", "~".yellow(), summary.suspicious);
    }
    if summary.rate_limited > 0 {
        println!(
            "  {} {} lookups rate limited (try a longer --max-wait)",
            "!".yellow(),
            summary.rate_limited
        );
    }
    let other_failures = summary.failed - summary.rate_limited;
    if other_failures > 0 {
        println!("  {} {} lookups failed", "x".dimmed(), other_failures);
    }
}

/// Counts shown under the score table.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScoreSummary {
    pub proxies: usize,
    pub suspicious: usize,
    /// All failed lookups, rate-limited ones included.
    pub failed: usize,
    /// Failures from local throttling or a remote 429.
    pub rate_limited: usize,
}

pub fn summarize(results: &[(String, Result<f64, IpIntelError>)]) -> ScoreSummary {
    let mut summary = ScoreSummary::default();
    for (_, result) in results {
        match result {
            Ok(score) => match ProxyVerdict::from_score(*score) {
                ProxyVerdict::Proxy => summary.proxies += 1,
                ProxyVerdict::Suspicious => summary.suspicious += 1,
                ProxyVerdict::Clean => {}
            },
            Err(e) => {
                summary.failed += 1;
                if e.is_rate_limit() {
                    summary.rate_limited += 1;
                }
            }
        }
    }
    summary
}

/// Display the shared rate limiter's parameters and current level.
pub fn display_limits(capacity: u64, interval_secs: u64, quantum: u64, available: i64) {
    println!("{}", "=== Rate Limit ===".bold());
    println!("  Burst capacity:  {capacity} queries");
    println!("  Refill:          {quantum} every {interval_secs}s");
    let per_minute = if interval_secs == 0 {
        0
    } else {
        quantum * 60 / interval_secs
    };
    println!("  Sustained:       ~{per_minute} queries/minute");
    let level = format!("{available}/{capacity}");
    let colored_level = if available <= 0 {
        level.red()
    } else if (available as u64) < capacity {
        level.yellow()
    } else {
        level.green()
    };
    println!("  Available now:   {colored_level}");
}

fn colorize_verdict(verdict: ProxyVerdict) -> colored::ColoredString {
    let text = verdict.as_str();
    match verdict {
        ProxyVerdict::Proxy => text.red().bold(),
        ProxyVerdict::Suspicious => text.yellow(),
        ProxyVerdict::Clean => text.green(),
    }
}
