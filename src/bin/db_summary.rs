use std::path::PathBuf;

use loan_sweep::{RunStore, SweepConfig};

// Print what the sweep has stored so far.
// Usage: cargo run --bin db_summary -- [db_path]
// Falls back to LOAN_SWEEP_DB_PATH / LOAN_SWEEP_DATA_DIR when no path is given.
fn main() -> anyhow::Result<()> {
    loan_sweep::utils::load_env().ok();

    let db_path = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => SweepConfig::from_env()?.db_path,
    };

    if !db_path.exists() {
        anyhow::bail!("database does not exist: {}", db_path.display());
    }

    let store = RunStore::open(&db_path)?;
    let summary = store.summary()?;

    println!("Database: {}", db_path.display());
    println!("Runs: {} | Variations: {} | Unavailable cells: {}",
        summary.run_count, summary.variation_count, summary.unavailable_count);

    for (term, count) in &summary.runs_by_term {
        println!("  {:>2} years: {} run(s)", term, count);
    }

    if let Some(run) = &summary.latest_run {
        println!();
        println!("Latest run #{} ({})", run.id, run.created_at);
        println!("  Principal: €{:.0} | Term: {} years | Own funds: €{:.0}",
            run.principal, run.term_years, run.own_funds);
        println!("  Notes: {}", run.notes);
    }

    for (term, run) in store.latest_run_per_term()? {
        println!();
        println!("== {} years (run #{}, {}) ==", term, run.id, run.created_at);
        println!("{:>6} {:>10} {:>8} {:>8} {:>8} {:>12}",
            "fixed", "rate €", "nominal", "eff.", "follow", "total €");

        for v in store.normalized_variations(run.id)? {
            println!("{:>6} {:>10} {:>8} {:>8} {:>8} {:>12}",
                v.fixed_period_years,
                fmt_opt(v.monthly_installment, 2),
                fmt_opt(v.interest_rate_pct, 3),
                fmt_opt(v.effective_rate_pct, 3),
                fmt_opt(v.follow_up_rate_pct, 3),
                fmt_opt(v.total_repayable, 0));
        }
    }

    Ok(())
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}
