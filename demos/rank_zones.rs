use anyhow::Context;
use std::sync::Arc;
use zone_scout::{preset, ApiCredentials, CentroidIndex, ScoutConfig, ZoneScout};

/// Usage: rank_zones <centroids.json> <lat> <lng> [preset]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("zone_scout=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        anyhow::bail!("usage: {} <centroids.json> <lat> <lng> [preset]", args[0]);
    }
    let lat: f64 = args[2].parse().context("latitude must be a number")?;
    let lng: f64 = args[3].parse().context("longitude must be a number")?;
    let preset_name = args.get(4).map(String::as_str).unwrap_or("restaurant");
    let business = preset(preset_name).with_context(|| format!("unknown preset '{preset_name}'"))?;

    let zones = CentroidIndex::from_json_file(&args[1])?;
    println!("Loaded {} zone centroids", zones.len());

    let scout = ZoneScout::open(ScoutConfig::default(), ApiCredentials::from_env()?, Arc::new(zones))?;

    let request = business.request(lat, lng);
    println!(
        "Ranking zones within {} km for {} ({})",
        request.radius_km, business.label, request.business_type
    );

    let ranked = scout.rank_with_commentary(&request).await?;
    for (rank, zone) in ranked.iter().enumerate() {
        println!(
            "\n#{} {} {} score {:.4}",
            rank + 1,
            zone.record.zip_id,
            zone.city.as_deref().unwrap_or("?"),
            zone.score
        );
        for (metric, detail) in &zone.metrics {
            println!("  {:<17} {:>10.2}  {}", metric.to_string(), detail.raw, detail.label);
        }
        if let Some(url) = &zone.listing_url {
            println!("  listings: {url}");
        }
        if let Some(text) = &zone.commentary {
            println!("\n{text}");
        }
    }

    println!("\nResponse cache stats: {:?}", scout.response_cache_stats());
    println!("Zone cache stats: {:?}", scout.zone_cache_stats());

    Ok(())
}
