use actix_web::{http::StatusCode, test::TestRequest, web, web::ServiceConfig};
use bluemarket_engine::{
    db_types::{Money, NewProduct, Product, ProfileKind, Role},
    events::EventProducers,
    test_utils::{
        prepare_env::{drop_database, new_test_db},
        MockGateway,
    },
    AccountManagement,
    MarketplaceDatabase,
    OrderFlowApi,
    ProductApi,
    SqliteDatabase,
};
use serde_json::{json, Value};

use super::helpers::{get, issue_token, issuer, json, post, send};
use crate::{
    middleware::JwtMiddlewareFactory,
    routes::{
        CancelOrderRoute,
        GatewayWebhookRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        UpdateOrderStatusRoute,
        VerifyPaymentRoute,
        WEBHOOK_SIGNATURE_HEADER,
    },
};

// Never verifies. These accounts only ever use tokens issued directly.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHQ$aGFzaA";

struct Shop {
    db: SqliteDatabase,
    gateway: MockGateway,
    product: Product,
    customer: String,
    other_customer: String,
    vendor: String,
    staff: String,
}

impl Shop {
    async fn open(stock: i64) -> Self {
        let db = new_test_db(5).await;
        let gateway = MockGateway::new();
        let vendor = profile(&db, "vendor@example.com", ProfileKind::Vendor).await;
        let customer = profile(&db, "customer@example.com", ProfileKind::Customer).await;
        let other_customer = profile(&db, "other@example.com", ProfileKind::Customer).await;
        let product = ProductApi::new(db.clone())
            .create_product(vendor, NewProduct::new("Kettle", Money::from_major_units(250), stock))
            .await
            .expect("Error listing product");
        Self {
            db,
            gateway,
            product,
            customer: issue_token(1, customer),
            other_customer: issue_token(2, other_customer),
            vendor: issue_token(3, vendor),
            staff: issue_token(4, Role::Staff),
        }
    }

    fn configure(&self) -> impl FnOnce(&mut ServiceConfig) {
        let db = self.db.clone();
        let gateway = self.gateway.clone();
        move |cfg| {
            let api = OrderFlowApi::new(db, gateway, EventProducers::default());
            cfg.app_data(web::Data::new(api))
                .service(GatewayWebhookRoute::<SqliteDatabase, MockGateway>::new())
                .service(
                    web::scope("/api")
                        .wrap(JwtMiddlewareFactory::new(issuer()))
                        .service(PlaceOrderRoute::<SqliteDatabase, MockGateway>::new())
                        .service(MyOrdersRoute::<SqliteDatabase, MockGateway>::new())
                        .service(OrderByIdRoute::<SqliteDatabase, MockGateway>::new())
                        .service(CancelOrderRoute::<SqliteDatabase, MockGateway>::new())
                        .service(UpdateOrderStatusRoute::<SqliteDatabase, MockGateway>::new())
                        .service(VerifyPaymentRoute::<SqliteDatabase, MockGateway>::new()),
                );
        }
    }

    async fn buy(&self, token: &str, quantity: i64, method: &str) -> (StatusCode, Value) {
        let body = json!({
            "items": [{ "product_id": self.product.id, "quantity": quantity }],
            "payment_method": method,
        });
        let (status, body) = send(post("/api/orders", token, &body), self.configure()).await;
        (status, if body.is_empty() { Value::Null } else { json(&body) })
    }

    async fn stock(&self) -> i64 {
        ProductApi::new(self.db.clone()).product(&self.product.id).await.expect("Product has vanished").stock
    }

    async fn close(self) {
        let Shop { mut db, .. } = self;
        let url = db.url().to_string();
        let _ = db.close().await;
        drop_database(&url).await;
    }
}

async fn profile(db: &SqliteDatabase, email: &str, kind: ProfileKind) -> Role {
    let (_, profile) = db.create_account(email, DUMMY_HASH, kind, email, None).await.expect("Error creating account");
    match kind {
        ProfileKind::Customer => Role::Customer(profile.id),
        ProfileKind::Vendor => Role::Vendor(profile.id),
    }
}

#[actix_web::test]
async fn cash_on_delivery() {
    let shop = Shop::open(5).await;
    let (status, placed) = shop.buy(&shop.customer, 5, "cod").await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["order"]["status"], "shipping");
    assert_eq!(placed["order"]["total"], "1250.00");
    assert_eq!(placed["order"]["payment"]["status"], "success");
    assert!(placed.get("checkout").is_none());
    assert_eq!(shop.stock().await, 0);

    let (status, err) = shop.buy(&shop.customer, 1, "cod").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let expected = format!("Insufficient stock for product {}. Requested 1, but only 0 available", shop.product.id);
    assert_eq!(err["error"], expected);

    let (status, body) = send(get("/api/orders", &shop.customer), shop.configure()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().map(|a| a.len()), Some(1));
    shop.close().await;
}

#[actix_web::test]
async fn only_customers_place_orders() {
    let shop = Shop::open(5).await;
    let (status, _) = shop.buy(&shop.vendor, 1, "cod").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = shop.buy("", 1, "cod").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, err) = shop.buy(&shop.customer, 1, "bitcoin").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = err["error"].as_str().expect("Malformed bodies get a JSON error");
    assert!(message.contains("bitcoin"), "{message}");
    let (status, _) = shop.buy(&shop.customer, 0, "cod").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(shop.stock().await, 5);
    shop.close().await;
}

#[actix_web::test]
async fn gateway_checkout_and_client_verification() {
    let shop = Shop::open(10).await;
    let (status, placed) = shop.buy(&shop.customer, 2, "gateway").await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["order"]["status"], "pending");
    assert_eq!(placed["checkout"]["amount"], "500.00");
    assert_eq!(placed["checkout"]["key_id"], "rzp_test_mock");
    let gateway_order_id = placed["checkout"]["gateway_order_id"].as_str().expect("No gateway order id").to_string();
    assert_eq!(shop.stock().await, 8);

    let verification = json!({
        "razorpay_order_id": gateway_order_id,
        "razorpay_payment_id": "pay_001",
        "razorpay_signature": shop.gateway.sign_payment(&gateway_order_id, "pay_001"),
    });
    // Someone else's order
    let req = post("/api/payments/verify", &shop.other_customer, &verification);
    let (status, _) = send(req, shop.configure()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(post("/api/payments/verify", &shop.customer, &verification), shop.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let confirmed = json(&body);
    assert_eq!(confirmed["message"], "Payment confirmed");
    assert_eq!(confirmed["order"]["status"], "confirmed");

    let (status, body) = send(post("/api/payments/verify", &shop.customer, &verification), shop.configure()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Payment was already confirmed");

    let forged = json!({
        "razorpay_order_id": gateway_order_id,
        "razorpay_payment_id": "pay_002",
        "razorpay_signature": "00".repeat(32),
    });
    let (status, _) = send(post("/api/payments/verify", &shop.customer, &forged), shop.configure()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(shop.stock().await, 8);
    shop.close().await;
}

#[actix_web::test]
async fn webhooks() {
    let shop = Shop::open(10).await;
    let (_, placed) = shop.buy(&shop.customer, 1, "gateway").await;
    let gateway_order_id = placed["checkout"]["gateway_order_id"].as_str().expect("No gateway order id").to_string();
    let (payload, signature) = shop.gateway.webhook("payment.captured", &gateway_order_id, "pay_001");
    let webhook = |signature: Option<&str>| {
        let req = TestRequest::post().uri("/webhook/gateway").set_payload(payload.clone());
        match signature {
            Some(sig) => req.insert_header((WEBHOOK_SIGNATURE_HEADER, sig.to_string())),
            None => req,
        }
    };

    let (status, _) = send(webhook(None), shop.configure()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(webhook(Some("deadbeef")), shop.configure()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(webhook(Some(signature.as_str())), shop.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["outcome"], "confirmed");
    let (status, body) = send(webhook(Some(signature.as_str())), shop.configure()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["outcome"], "already_confirmed");
    assert_eq!(shop.stock().await, 9);

    let (payload, signature) = shop.gateway.webhook("payment.captured", "order_unknown", "pay_009");
    let req = TestRequest::post()
        .uri("/webhook/gateway")
        .set_payload(payload)
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature));
    let (status, body) = send(req, shop.configure()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["outcome"], "unknown_order");
    shop.close().await;
}

#[actix_web::test]
async fn cancellation_and_fulfilment() {
    let shop = Shop::open(10).await;
    let (_, placed) = shop.buy(&shop.customer, 4, "cod").await;
    let order_id = placed["order"]["id"].as_str().expect("No order id").to_string();
    assert_eq!(shop.stock().await, 6);

    // Invisible to other customers
    let (status, _) = send(get(&format!("/api/orders/{order_id}"), &shop.other_customer), shop.configure()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(get(&format!("/api/orders/{order_id}"), &shop.vendor), shop.configure()).await;
    assert_eq!(status, StatusCode::OK);

    let shipped = json!({ "status": "shipped" });
    let path = format!("/api/orders/{order_id}/status");
    let (status, _) = send(post(&path, &shop.customer, &shipped), shop.configure()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(post(&path, &shop.vendor, &shipped), shop.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["shipping"]["status"], "shipped");

    let cancel = format!("/api/orders/{order_id}/cancel");
    let (status, body) = send(post(&cancel, &shop.staff, &json!({})), shop.configure()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json(&body)["error"], "Cannot move an order from shipped to cancelled");
    assert_eq!(shop.stock().await, 6);

    let (_, placed) = shop.buy(&shop.customer, 3, "cod").await;
    let order_id = placed["order"]["id"].as_str().expect("No order id").to_string();
    let cancel = format!("/api/orders/{order_id}/cancel");
    let (status, _) = send(post(&cancel, &shop.other_customer, &json!({})), shop.configure()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(post(&cancel, &shop.customer, &json!({})), shop.configure()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let cancelled = json(&body);
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["payment"]["status"], "failed");
    assert_eq!(shop.stock().await, 6);
    shop.close().await;
}
