//! Pool inspection tool.
//!
//! Resolves one pool's topology and prints the first pages of each side
//! with the decoded orders, without submitting anything.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;

use deepbook_expiry_sweeper::adapters::sui::{SuiObjectGateway, SuiRpcClient};
use deepbook_expiry_sweeper::config::loader::{build_registry, load_config, rpc_client_config};
use deepbook_expiry_sweeper::domain::decode::decode_object;
use deepbook_expiry_sweeper::domain::order::Side;
use deepbook_expiry_sweeper::ports::object_gateway::ObjectGateway;
use deepbook_expiry_sweeper::usecases::scanner::{OrderBookScanner, ScanSettings};
use deepbook_expiry_sweeper::usecases::topology::PoolTopologyResolver;

#[derive(Debug, Parser)]
#[command(about = "Print the topology and first pages of a DeepBook pool")]
struct Args {
    /// Pool name or object id from the registry.
    pool: String,

    #[arg(long, env = "SWEEPER_CONFIG", default_value = "config.toml")]
    config: String,

    /// Pages to drain per side.
    #[arg(long, default_value_t = 1)]
    max_pages: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let config = load_config(&args.config).context("Failed to load configuration")?;
    let registry = build_registry(&config)?;
    let pool = registry
        .find(&args.pool)
        .with_context(|| format!("Pool {} is not in the registry", args.pool))?
        .clone();

    let gateway = Arc::new(SuiObjectGateway::new(
        SuiRpcClient::new(rpc_client_config(&config)).context("Failed to create Sui RPC client")?,
    ));

    let Some(collections) = PoolTopologyResolver::new(Arc::clone(&gateway))
        .resolve(&pool.pool_id)
        .await?
    else {
        println!("{}", json!({ "pool": pool, "collections": null }));
        return Ok(());
    };

    let scanner = OrderBookScanner::new(
        Arc::clone(&gateway),
        ScanSettings {
            page_size: config.sweep.page_size,
            multi_get_size: config.sweep.multi_get_size,
        },
    );
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);

    let mut sides = Vec::new();
    for (side, collection_id) in [(Side::Bid, &collections.bids_id), (Side::Ask, &collections.asks_id)] {
        let drain = scanner.drain_collection(collection_id, Some(args.max_pages)).await;
        let objects = gateway
            .multi_get_objects(&drain.child_ids)
            .await
            .context("Failed to fetch side objects")?;

        let mut orders = Vec::new();
        let mut dropped = 0usize;
        for object in objects.into_iter().flatten() {
            match decode_object(&object.content, &object.object_id, object.storage_rebate, side) {
                Ok(d) => {
                    dropped += d.dropped;
                    orders.extend(d.orders);
                }
                Err(_) => dropped += 1,
            }
        }

        let expired = orders.iter().filter(|o| o.is_expired_at(now)).count();
        sides.push(json!({
            "side": side,
            "collection_id": collection_id,
            "pages": drain.pages,
            "children": drain.child_ids.len(),
            "page_failed": drain.failed,
            "orders": orders.len(),
            "expired": expired,
            "dropped": dropped,
            "sample": orders.iter().take(5).map(|o| json!({
                "order_id": o.order_id.to_string(),
                "owner": o.owner,
                "price": o.price,
                "quantity": o.quantity,
                "expire_timestamp": o.expire_timestamp,
            })).collect::<Vec<_>>(),
        }));
    }

    let out = json!({
        "pool": pool,
        "collections": collections,
        "reference_time_ms": now,
        "sides": sides,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
