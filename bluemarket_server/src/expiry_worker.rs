use std::time::Duration as StdDuration;

use bluemarket_engine::{db_types::Order, OrderFlowApi, SqliteDatabase};
use chrono::Duration;
use log::*;
use tokio::task::JoinHandle;

use crate::integrations::gateway::RazorpayGateway;

const EXPIRY_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Starts the unpaid order expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, gateway orders that have been waiting for payment for longer than `unpaid_expiry` are cancelled and
/// their stock is released.
pub fn start_expiry_worker(
    api: OrderFlowApi<SqliteDatabase, RazorpayGateway>,
    unpaid_expiry: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(EXPIRY_INTERVAL);
        info!("🕰️ Unpaid order expiry worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running unpaid order expiry job");
            match api.expire_unpaid_orders(unpaid_expiry).await {
                Ok(result) if result.count() > 0 => {
                    info!("🕰️ {} unpaid orders expired: {}", result.count(), order_list(&result.cancelled));
                },
                Ok(_) => trace!("🕰️ No unpaid orders to expire"),
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] cust_id: {} total: {}", o.id, o.customer_id, o.total))
        .collect::<Vec<String>>()
        .join(", ")
}
