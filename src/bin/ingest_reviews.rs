// src/bin/ingest_reviews.rs
//! Ingest Google place reviews into spark evidence format.
//!
//! Usage:
//!   cargo run --bin ingest_reviews -- <slug>
//!   cargo run --bin ingest_reviews -- <slug> --place-id <placeId>
//!   cargo run --bin ingest_reviews -- <slug> --query "Greenwood Apartments Cumming GA"
//!
//! Requires GOOGLE_MAPS_API_KEY in the environment.

use clap::Parser;

use spark_dashboard::evidence::EvidenceRules;
use spark_dashboard::ingest::google::GooglePlaces;
use spark_dashboard::ingest::{self};
use spark_dashboard::store::{evidence_doc, JsonStore};

#[derive(Debug, Parser)]
#[command(about = "Fetch and score Google reviews for a spark")]
struct Args {
    /// Spark slug (matches sparks/<slug>.json).
    slug: String,
    /// Skip the text-search lookup and use this place id directly.
    #[arg(long)]
    place_id: Option<String>,
    /// Override the text-search query (defaults to the spark's business name).
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let store = JsonStore::from_env();
    let rules = EvidenceRules::load_from_env();
    let places = GooglePlaces::from_env()?;
    let today = chrono::Local::now().date_naive();

    let summary = ingest::ingest_google(
        &store,
        &places,
        &rules,
        &args.slug,
        args.place_id,
        args.query,
        today,
    )
    .await?;

    println!("✓ Ingested Google reviews for {}", summary.slug);
    println!("✓ Place ID: {}", summary.place_id);
    println!("✓ Reviews analyzed: {}", summary.analyzed);
    println!("✓ Relevant reviews: {}", summary.relevant);
    println!("✓ Evidence confidence: {:?}", summary.confidence);
    println!(
        "✓ Output: {}",
        store.root().join(evidence_doc(&summary.slug)).display()
    );
    Ok(())
}
