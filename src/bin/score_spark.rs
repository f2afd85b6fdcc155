// src/bin/score_spark.rs
//! Run scoring and confidence computation on a spark: recomputes the risk
//! signal and the vendor scorecard from the current evidence file and writes
//! the results back onto the spark record.

use clap::Parser;

use spark_dashboard::scorecard::{self, ScorecardRules};
use spark_dashboard::store::{spark_doc, JsonStore};

#[derive(Debug, Parser)]
#[command(about = "Recompute the vendor scorecard for a spark")]
struct Args {
    /// Spark slug (matches sparks/<slug>.json).
    slug: String,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let store = JsonStore::from_env();
    let rules = ScorecardRules::load_from_env();
    let now = chrono::Local::now().date_naive();

    let summary = scorecard::score_spark(&store, &rules, &args.slug, now)?;

    println!("Scoring: {}\n", summary.business_name);
    println!("Risk Signal: {:?}", summary.risk_signal);
    println!("\nVendor Scorecard:");
    let sc = &summary.scorecard;
    println!("  Reliability: {}/100 {}", sc.reliability.score, sc.reliability.note);
    println!(
        "  Resident Experience: {}/100 {}",
        sc.resident_experience.score, sc.resident_experience.note
    );
    println!(
        "  Issue Response: {}/100 {}",
        sc.issue_response.score, sc.issue_response.note
    );
    println!(
        "  Communication: {}/100 {}",
        sc.communication.score, sc.communication.note
    );
    println!("  Overall: {}/100", sc.overall);
    println!(
        "\n✓ Updated {}",
        store.root().join(spark_doc(&summary.slug)).display()
    );
    Ok(())
}
