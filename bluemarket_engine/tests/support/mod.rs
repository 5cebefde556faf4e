#![allow(dead_code)]
use bluemarket_engine::{
    db_types::{Money, NewProduct, Product, ProfileKind, Role},
    events::EventProducers,
    test_utils::{prepare_env::new_test_db, MockGateway},
    AccountManagement,
    MarketplaceDatabase,
    OrderFlowApi,
    ProductApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};

/// A hash that never verifies. Test accounts created with it skip the (slow) Argon2 step.
pub const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$aGFzaA";

pub struct Market {
    pub db: SqliteDatabase,
    pub gateway: MockGateway,
    pub orders: OrderFlowApi<SqliteDatabase, MockGateway>,
    pub products: ProductApi<SqliteDatabase>,
}

pub async fn setup() -> Market {
    setup_with_producers(EventProducers::default()).await
}

pub async fn setup_with_producers(producers: EventProducers) -> Market {
    let db = new_test_db(POOL_SIZE as u32).await;
    let gateway = MockGateway::new();
    let orders = OrderFlowApi::new(db.clone(), gateway.clone(), producers);
    let products = ProductApi::new(db.clone());
    Market { db, gateway, orders, products }
}

pub async fn tear_down(mut market: Market) {
    let url = market.db.url().to_string();
    if let Err(e) = market.db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    drop(market);
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

async fn profile(market: &Market, email: &str, kind: ProfileKind) -> Role {
    let (_, profile) = market
        .db
        .create_account(email, DUMMY_HASH, kind, email, None)
        .await
        .expect("Error creating account");
    match kind {
        ProfileKind::Customer => Role::Customer(profile.id),
        ProfileKind::Vendor => Role::Vendor(profile.id),
    }
}

pub async fn vendor(market: &Market, email: &str) -> Role {
    profile(market, email, ProfileKind::Vendor).await
}

pub async fn customer(market: &Market, email: &str) -> Role {
    profile(market, email, ProfileKind::Customer).await
}

pub fn customer_id(role: Role) -> i64 {
    role.customer_id().expect("Not a customer")
}

pub async fn listed_product(market: &Market, vendor: Role, name: &str, price: &str, stock: i64) -> Product {
    let price = price.parse::<Money>().expect("Invalid price");
    market.products.create_product(vendor, NewProduct::new(name, price, stock)).await.expect("Error creating product")
}

pub async fn stock_of(market: &Market, product: &Product) -> i64 {
    market.products.product(&product.id).await.expect("Product has vanished").stock
}

pub const POOL_SIZE: usize = 10;

/// Checks out every connection in the pool at once and runs the counting query `sql` on each, binding `arg`. A write
/// that was never committed is only visible on the connection that made it, so the counts disagree.
pub async fn count_on_every_connection(market: &Market, sql: &str, arg: &str) -> Vec<i64> {
    let mut conns = Vec::with_capacity(POOL_SIZE);
    for _ in 0..POOL_SIZE {
        conns.push(market.db.pool().acquire().await.expect("Could not check out a connection"));
    }
    let mut counts = Vec::with_capacity(POOL_SIZE);
    for conn in conns.iter_mut() {
        let count = sqlx::query_scalar::<_, i64>(sql).bind(arg).fetch_one(&mut **conn).await.expect("Query failed");
        counts.push(count);
    }
    counts
}
