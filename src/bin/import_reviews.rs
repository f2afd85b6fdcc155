// src/bin/import_reviews.rs
//! Import review evidence from manual curation.
//!
//! Expects a JSON file at `review-evidence/<slug>-input.json` under the data
//! directory, with the shape `{ "items": [ ...ReviewEvidenceItem ] }`.

use clap::Parser;

use spark_dashboard::ingest;
use spark_dashboard::store::{evidence_doc, JsonStore};

#[derive(Debug, Parser)]
#[command(about = "Wrap hand-curated review items into an evidence file")]
struct Args {
    /// Spark slug (matches sparks/<slug>.json).
    slug: String,
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let store = JsonStore::from_env();
    let today = chrono::Local::now().date_naive();

    let summary = ingest::import_manual(&store, &args.slug, today)?;

    println!("✓ Imported {} reviews", summary.imported);
    println!(
        "✓ File: {}",
        store.root().join(evidence_doc(&summary.slug)).display()
    );
    println!();
    println!("Confidence: {:?}", summary.confidence);
    println!("Sources: {}", summary.sources.join(", "));
    Ok(())
}
