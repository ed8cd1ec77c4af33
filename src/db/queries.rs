use rusqlite::{Connection, params, OptionalExtension, Row};
use anyhow::{Result, Context};
use crate::models::*;

const RUN_COLUMNS: &str = "id, created_at, principal, term_years, purchase_price, purchase_costs, \
     own_funds, applicant_age, net_monthly_income, living_area_sqm, existing_installments, notes";

const VARIATION_COLUMNS: &str = "id, run_id, fixed_period_years, monthly_installment, interest_rate, \
     loan_term, follow_up_rate, effective_rate, payout_amount, capitalized_fees, principal_amount, \
     total_repayable, collateral, scraped_at";

fn run_from_row(row: &Row) -> rusqlite::Result<Run> {
    Ok(Run {
        id: row.get(0)?,
        created_at: row.get(1)?,
        principal: row.get(2)?,
        term_years: row.get(3)?,
        purchase_price: row.get(4)?,
        purchase_costs: row.get(5)?,
        own_funds: row.get(6)?,
        applicant_age: row.get(7)?,
        net_monthly_income: row.get(8)?,
        living_area_sqm: row.get(9)?,
        existing_installments: row.get(10)?,
        notes: row.get(11)?,
    })
}

fn variation_from_row(row: &Row) -> rusqlite::Result<Variation> {
    Ok(Variation {
        id: row.get(0)?,
        run_id: row.get(1)?,
        fixed_period_years: row.get(2)?,
        monthly_installment: row.get(3)?,
        interest_rate: row.get(4)?,
        loan_term: row.get(5)?,
        follow_up_rate: row.get(6)?,
        effective_rate: row.get(7)?,
        payout_amount: row.get(8)?,
        capitalized_fees: row.get(9)?,
        principal_amount: row.get(10)?,
        total_repayable: row.get(11)?,
        collateral: row.get(12)?,
        scraped_at: row.get(13)?,
    })
}

// ===== RUN CRUD =====

pub fn insert_run(conn: &Connection, run: &Run) -> Result<i64> {
    conn.execute(
        "INSERT INTO sweep_runs (created_at, principal, term_years, purchase_price, purchase_costs, own_funds, applicant_age, net_monthly_income, living_area_sqm, existing_installments, notes)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            run.created_at,
            run.principal,
            run.term_years,
            run.purchase_price,
            run.purchase_costs,
            run.own_funds,
            run.applicant_age,
            run.net_monthly_income,
            run.living_area_sqm,
            run.existing_installments,
            run.notes,
        ],
    ).context("Failed to insert run")?;

    Ok(conn.last_insert_rowid())
}

/// All runs, newest first; rows created within the same instant fall back to id order
pub fn select_runs(conn: &Connection) -> Result<Vec<Run>> {
    let sql = format!(
        "SELECT {} FROM sweep_runs ORDER BY created_at DESC, id DESC",
        RUN_COLUMNS
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("Failed to prepare select runs query")?;

    let runs = stmt
        .query_map([], run_from_row)
        .context("Failed to map runs from query")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect runs")?;

    Ok(runs)
}

pub fn select_run(conn: &Connection, id: i64) -> Result<Option<Run>> {
    let sql = format!("SELECT {} FROM sweep_runs WHERE id = ?", RUN_COLUMNS);
    let mut stmt = conn
        .prepare(&sql)
        .context("Failed to prepare select run query")?;

    let run = stmt
        .query_row(params![id], run_from_row)
        .optional()
        .context("Failed to query run")?;

    Ok(run)
}

/// Newest run for every distinct term, ordered by term ascending
pub fn select_latest_run_per_term(conn: &Connection) -> Result<Vec<Run>> {
    let sql = format!(
        "SELECT {cols} FROM sweep_runs r
         WHERE r.id = (
             SELECT r2.id FROM sweep_runs r2
             WHERE r2.term_years = r.term_years
             ORDER BY r2.created_at DESC, r2.id DESC
             LIMIT 1
         )
         ORDER BY r.term_years ASC",
        cols = RUN_COLUMNS
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("Failed to prepare latest run per term query")?;

    let runs = stmt
        .query_map([], run_from_row)
        .context("Failed to map latest runs from query")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect latest runs")?;

    Ok(runs)
}

pub fn count_runs(conn: &Connection) -> Result<i64> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sweep_runs", [], |row| row.get(0))
        .context("Failed to count runs")?;
    Ok(count)
}

/// Run counts grouped by term, ordered by term descending
pub fn count_runs_by_term(conn: &Connection) -> Result<Vec<(u32, i64)>> {
    let mut stmt = conn
        .prepare("SELECT term_years, COUNT(*) FROM sweep_runs GROUP BY term_years ORDER BY term_years DESC")
        .context("Failed to prepare run count query")?;

    let counts = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .context("Failed to map run counts")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect run counts")?;

    Ok(counts)
}

// ===== VARIATION CRUD =====

pub fn insert_variation(conn: &Connection, run_id: i64, variation: &Variation) -> Result<i64> {
    conn.execute(
        "INSERT INTO variations (run_id, fixed_period_years, monthly_installment, interest_rate, loan_term, follow_up_rate, effective_rate, payout_amount, capitalized_fees, principal_amount, total_repayable, collateral, scraped_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            run_id,
            variation.fixed_period_years,
            variation.monthly_installment,
            variation.interest_rate,
            variation.loan_term,
            variation.follow_up_rate,
            variation.effective_rate,
            variation.payout_amount,
            variation.capitalized_fees,
            variation.principal_amount,
            variation.total_repayable,
            variation.collateral,
            variation.scraped_at,
        ],
    ).with_context(|| {
        format!(
            "Failed to insert variation (run {}, fixed period {})",
            run_id, variation.fixed_period_years
        )
    })?;

    Ok(conn.last_insert_rowid())
}

/// Variations of one run ordered by fixed period ascending
pub fn select_variations(conn: &Connection, run_id: i64) -> Result<Vec<Variation>> {
    let sql = format!(
        "SELECT {} FROM variations WHERE run_id = ? ORDER BY fixed_period_years ASC, id ASC",
        VARIATION_COLUMNS
    );
    let mut stmt = conn
        .prepare(&sql)
        .context("Failed to prepare select variations query")?;

    let variations = stmt
        .query_map(params![run_id], variation_from_row)
        .context("Failed to map variations from query")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Failed to collect variations")?;

    Ok(variations)
}

/// Remove a run together with its variations
pub fn delete_run(conn: &Connection, run_id: i64) -> Result<()> {
    conn.execute("DELETE FROM variations WHERE run_id = ?", params![run_id])
        .with_context(|| format!("Failed to delete variations of run {}", run_id))?;
    conn.execute("DELETE FROM sweep_runs WHERE id = ?", params![run_id])
        .with_context(|| format!("Failed to delete run {}", run_id))?;
    Ok(())
}

pub fn count_variations(conn: &Connection) -> Result<i64> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM variations", [], |row| row.get(0))
        .context("Failed to count variations")?;
    Ok(count)
}

/// Variations whose every field came back empty
pub fn count_unavailable_variations(conn: &Connection) -> Result<i64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM variations
             WHERE monthly_installment IS NULL AND total_repayable IS NULL AND interest_rate = '-'",
            [],
            |row| row.get(0),
        )
        .context("Failed to count unavailable variations")?;
    Ok(count)
}
