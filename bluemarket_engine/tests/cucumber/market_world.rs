use std::collections::HashMap;

use cucumber::World;
use log::*;
use bluemarket_engine::{
    db_types::{Product, Role},
    events::EventProducers,
    order_objects::{PlacedOrder, WebhookOutcome},
    test_utils::{
        prepare_env::{create_database, random_db_path, run_migrations},
        MockGateway,
    },
    MarketError,
    OrderFlowApi,
    ProductApi,
    SqliteDatabase,
};

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<MarketSystem>,
    pub accounts: HashMap<String, Role>,
    pub products: HashMap<String, Product>,
    pub last_order: Option<PlacedOrder>,
    pub last_error: Option<MarketError>,
    pub last_outcome: Option<WebhookOutcome>,
}

#[derive(Debug)]
pub struct MarketSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: MockGateway,
    pub orders: OrderFlowApi<SqliteDatabase, MockGateway>,
    pub products: ProductApi<SqliteDatabase>,
}

impl MarketWorld {
    pub fn system(&self) -> &MarketSystem {
        self.system.as_ref().expect("Marketplace not initialised")
    }

    pub fn role(&self, name: &str) -> Role {
        *self.accounts.get(name).unwrap_or_else(|| panic!("No account called {name}"))
    }

    pub fn product(&self, name: &str) -> &Product {
        self.products.get(name).unwrap_or_else(|| panic!("No product called {name}"))
    }

    pub fn last_order(&self) -> &PlacedOrder {
        self.last_order.as_ref().expect("No order has been placed")
    }

    /// Stores the result of an order operation so that later steps can inspect it.
    pub fn record<T>(&mut self, result: Result<T, MarketError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🚀️ Step produced an error: {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

impl MarketSystem {
    pub async fn new() -> Self {
        let url = prepare_test_env().await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let gateway = MockGateway::new();
        let orders = OrderFlowApi::new(db.clone(), gateway.clone(), EventProducers::default());
        let products = ProductApi::new(db.clone());
        Self { db_path: url, db, gateway, orders, products }
    }
}

pub async fn prepare_test_env() -> String {
    let path = random_db_path();
    create_database(&path).await;
    run_migrations(&path).await;
    path
}
