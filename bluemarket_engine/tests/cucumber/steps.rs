use std::time::Duration;

use bluemarket_engine::{
    db_types::{CartLine, Money, NewOrder, OrderStatus, PaymentMethod, Role},
    order_objects::PaymentCallback,
    MarketError,
    OrderQueries,
};
use cucumber::{then, when};

use crate::cucumber::MarketWorld;

#[when(expr = "customer '{word}' buys {int} '{word}' paying by {word}")]
async fn buy(world: &mut MarketWorld, customer: String, quantity: i64, product: String, method: String) {
    let customer_id = world.role(&customer).customer_id().expect("Not a customer");
    let method = method.parse::<PaymentMethod>().expect("Unknown payment method");
    let line = CartLine::new(world.product(&product).id.clone(), quantity);
    let result = world.system().orders.place_order(NewOrder::new(customer_id, vec![line], method)).await;
    if let Some(placed) = world.record(result) {
        world.last_order = Some(placed);
    }
}

#[when(expr = "customer '{word}' confirms payment {word} for the last order")]
async fn client_confirms(world: &mut MarketWorld, customer: String, payment_id: String) {
    let customer_id = world.role(&customer).customer_id().expect("Not a customer");
    let gateway_order_id = gateway_order_id(world);
    let signature = world.system().gateway.sign_payment(&gateway_order_id, &payment_id);
    let callback = PaymentCallback { gateway_order_id, gateway_payment_id: payment_id, signature };
    let result = world.system().orders.verify_client_payment(customer_id, callback).await;
    world.record(result);
}

#[when(expr = "the gateway reports payment {word} as {word} for the last order")]
async fn webhook(world: &mut MarketWorld, payment_id: String, event: String) {
    let gateway_order_id = gateway_order_id(world);
    let (body, sig) = world.system().gateway.webhook(&format!("payment.{event}"), &gateway_order_id, &payment_id);
    let result = world.system().orders.process_webhook(&body, &sig).await;
    world.last_outcome = world.record(result);
}

#[when(expr = "'{word}' cancels the last order")]
async fn cancel(world: &mut MarketWorld, who: String) {
    let role = if who == "staff" { Role::Staff } else { world.role(&who) };
    let id = world.last_order().order.order.id.clone();
    let result = world.system().orders.cancel_order(role, &id).await;
    world.record(result);
}

#[when(expr = "'{word}' marks the last order as {word}")]
async fn fulfil(world: &mut MarketWorld, who: String, status: String) {
    let role = if who == "staff" { Role::Staff } else { world.role(&who) };
    let status = status.parse::<OrderStatus>().expect("Unknown order status");
    let id = world.last_order().order.order.id.clone();
    let result = world.system().orders.advance_fulfillment(role, &id, status).await;
    world.record(result);
}

#[when(expr = "unpaid orders older than {int}ms expire")]
async fn expire(world: &mut MarketWorld, ms: i64) {
    tokio::time::sleep(Duration::from_millis(ms as u64 + 10)).await;
    let result = world.system().orders.expire_unpaid_orders(chrono::Duration::milliseconds(ms)).await;
    world.record(result);
}

fn gateway_order_id(world: &MarketWorld) -> String {
    world.last_order().checkout.as_ref().expect("The last order was not a gateway order").gateway_order_id.clone()
}

#[then(expr = "the last order has {word} of '{word}'")]
async fn order_field(world: &mut MarketWorld, field: String, value: String) {
    let id = world.last_order().order.order.id.clone();
    let order = world
        .system()
        .db
        .fetch_full_order(&id)
        .await
        .expect("Error fetching order")
        .unwrap_or_else(|| panic!("Order {id} does not exist"));
    match field.as_str() {
        "status" => assert_eq!(order.order.status.to_string(), value, "Status is incorrect"),
        "payment_status" => assert_eq!(order.payment.status.to_string(), value, "Payment status is incorrect"),
        "shipping_status" => assert_eq!(order.shipping.status.to_string(), value, "Shipping status is incorrect"),
        "total" => assert_eq!(order.order.total, value.parse::<Money>().expect("Invalid total"), "Total is incorrect"),
        "payment_id" => assert_eq!(order.payment.gateway_payment_id.as_deref(), Some(value.as_str())),
        _ => panic!("Unknown field {field}"),
    }
}

#[then(expr = "'{word}' has {int} in stock")]
async fn stock(world: &mut MarketWorld, product: String, expected: i64) {
    let id = world.product(&product).id.clone();
    let product = world.system().products.product(&id).await.expect("Error fetching product");
    assert_eq!(product.stock, expected, "Stock for {} is incorrect", product.name);
}

#[then(expr = "the step fails with {word}")]
async fn failed_with(world: &mut MarketWorld, kind: String) {
    let err = world.last_error.as_ref().expect("The last step did not fail");
    let matched = match kind.as_str() {
        "InsufficientStock" => matches!(err, MarketError::InsufficientStock { .. }),
        "InvalidTransition" => matches!(err, MarketError::InvalidTransition { .. }),
        "Unauthorized" => matches!(err, MarketError::Unauthorized(_)),
        "GatewayError" => matches!(err, MarketError::GatewayError(_)),
        "SignatureInvalid" => matches!(err, MarketError::SignatureInvalid),
        _ => panic!("Unknown error kind {kind}"),
    };
    assert!(matched, "Expected {kind}, got {err}");
}

#[then("the step succeeds")]
async fn succeeded(world: &mut MarketWorld) {
    if let Some(e) = &world.last_error {
        panic!("Expected success, got {e}");
    }
}

#[then(expr = "the webhook outcome is {word}")]
async fn webhook_outcome(world: &mut MarketWorld, outcome: String) {
    let actual = world.last_outcome.as_ref().expect("No webhook outcome was recorded");
    let json = serde_json::to_value(actual).expect("Outcome is not serializable");
    assert_eq!(json["outcome"], outcome.as_str(), "Webhook outcome is incorrect");
}

#[then(expr = "customer '{word}' has {int} order(s)")]
async fn order_count(world: &mut MarketWorld, customer: String, count: usize) {
    let customer_id = world.role(&customer).customer_id().expect("Not a customer");
    let orders = world.system().db.fetch_orders_for_customer(customer_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count, "Order count is incorrect");
}
