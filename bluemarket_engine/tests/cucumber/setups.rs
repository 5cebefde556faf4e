use bluemarket_engine::{
    db_types::{Money, NewProduct, ProfileKind, Role},
    AccountManagement,
};
use cucumber::given;

use crate::cucumber::{MarketSystem, MarketWorld};

const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$aGFzaA";

#[given("a fresh install")]
async fn fresh_database(world: &mut MarketWorld) {
    let system = MarketSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "{word} '{word}' is registered")]
async fn register(world: &mut MarketWorld, kind: String, name: String) {
    let kind = match kind.as_str() {
        "customer" => ProfileKind::Customer,
        "vendor" => ProfileKind::Vendor,
        _ => panic!("Unknown account type {kind}"),
    };
    let email = format!("{name}@example.com");
    let (_, profile) = world
        .system()
        .db
        .create_account(&email, DUMMY_HASH, kind, &name, None)
        .await
        .expect("Error creating account");
    let role = match kind {
        ProfileKind::Customer => Role::Customer(profile.id),
        ProfileKind::Vendor => Role::Vendor(profile.id),
    };
    world.accounts.insert(name, role);
}

#[given(expr = "vendor '{word}' lists '{word}' at {word} with {int} in stock")]
async fn list_product(world: &mut MarketWorld, vendor: String, name: String, price: String, stock: i64) {
    let role = world.role(&vendor);
    let price = price.parse::<Money>().expect("Invalid price");
    let product = world
        .system()
        .products
        .create_product(role, NewProduct::new(name.clone(), price, stock))
        .await
        .expect("Error creating product");
    world.products.insert(name, product);
}

#[given("the payment gateway is down")]
async fn gateway_down(world: &mut MarketWorld) {
    world.system().gateway.set_failing(true);
}
