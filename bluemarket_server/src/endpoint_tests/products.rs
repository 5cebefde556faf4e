use actix_web::{http::StatusCode, web, web::ServiceConfig};
use bluemarket_engine::{
    db_types::{Money, NewProduct, Product, ProductId, ProductUpdate, Role},
    traits::VendorDashboard,
    ProductApi,
};
use chrono::Utc;
use serde_json::json;

use super::helpers::{delete, get, issue_token, issuer, json, patch, post, send};
use crate::{
    endpoint_tests::mocks::MockCatalogueManager,
    middleware::JwtMiddlewareFactory,
    routes::{
        CreateProductRoute,
        DashboardRoute,
        DeleteProductRoute,
        MyProductsRoute,
        ProductByIdRoute,
        ProductsRoute,
        QuoteRoute,
        UpdateProductRoute,
    },
};

fn product(id: &str, vendor_id: i64, price: i64, stock: i64) -> Product {
    Product {
        id: ProductId::from(id),
        vendor_id,
        name: format!("Product {id}"),
        description: String::default(),
        price: Money::from_minor_units(price),
        stock,
        image: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn configure(manager: MockCatalogueManager) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = ProductApi::new(manager);
        cfg.app_data(web::Data::new(api))
            .service(
                web::scope("/api")
                    .wrap(JwtMiddlewareFactory::new(issuer()))
                    .service(MyProductsRoute::<MockCatalogueManager>::new())
                    .service(CreateProductRoute::<MockCatalogueManager>::new())
                    .service(UpdateProductRoute::<MockCatalogueManager>::new())
                    .service(DeleteProductRoute::<MockCatalogueManager>::new())
                    .service(DashboardRoute::<MockCatalogueManager>::new())
                    .service(QuoteRoute::<MockCatalogueManager>::new()),
            )
            .service(ProductsRoute::<MockCatalogueManager>::new())
            .service(ProductByIdRoute::<MockCatalogueManager>::new());
    }
}

#[actix_web::test]
async fn catalogue_is_public() {
    let mut manager = MockCatalogueManager::new();
    manager
        .expect_fetch_all_products()
        .times(1)
        .returning(|| Ok(vec![product("p1", 1, 500, 3), product("p2", 2, 10, 0)]));
    let (status, body) = send(get("/products", ""), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let products = json(&body);
    assert_eq!(products.as_array().map(|a| a.len()), Some(2));
    assert_eq!(products[0]["price"], "5.00");
}

#[actix_web::test]
async fn unknown_product() {
    let mut manager = MockCatalogueManager::new();
    manager.expect_fetch_product().withf(|id| id.as_str() == "p9").returning(|_| Ok(None));
    let (status, body) = send(get("/products/p9", ""), configure(manager)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Not found: Product p9"}"#);
}

#[actix_web::test]
async fn only_vendors_list_products() {
    let new_product = NewProduct::new("Anvil", Money::from_major_units(100), 5);

    let (status, _) = send(post("/api/products", "", &new_product), configure(MockCatalogueManager::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = issue_token(1, Role::Customer(1));
    let req = post("/api/products", &token, &new_product);
    let (status, body) = send(req, configure(MockCatalogueManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body.contains("customer #1 may not access this resource"), "{body}");

    let mut manager = MockCatalogueManager::new();
    manager.expect_create_product().withf(|vendor_id, p| *vendor_id == 3 && p.name == "Anvil").times(1).returning(
        |vendor_id, p| {
            let mut product = product("p1", vendor_id, p.price.minor_units(), p.stock);
            product.name = p.name;
            Ok(product)
        },
    );
    let token = issue_token(2, Role::Vendor(3));
    let (status, body) = send(post("/api/products", &token, &new_product), configure(manager)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created = json(&body);
    assert_eq!(created["vendor_id"], 3);
    assert_eq!(created["price"], "100.00");
}

#[actix_web::test]
async fn negative_prices_are_rejected() {
    let token = issue_token(2, Role::Vendor(3));
    let body = json!({ "name": "Anvil", "price": "-1.00", "stock": 5 });
    let (status, body) = send(post("/api/products", &token, &body), configure(MockCatalogueManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Price cannot be negative"), "{body}");
}

#[actix_web::test]
async fn vendors_only_edit_their_own_products() {
    let token = issue_token(2, Role::Vendor(3));

    let mut manager = MockCatalogueManager::new();
    manager.expect_fetch_product().returning(|_| Ok(Some(product("p1", 9, 100, 1))));
    manager.expect_delete_product().never();
    let (status, _) = send(delete("/api/products/p1", &token), configure(manager)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let mut manager = MockCatalogueManager::new();
    manager.expect_fetch_product().returning(|_| Ok(Some(product("p1", 3, 100, 1))));
    manager.expect_update_product().withf(|_, u| u.stock == Some(7)).times(1).returning(|_, _| {
        Ok(Some(product("p1", 3, 100, 7)))
    });
    let update = ProductUpdate::default().with_stock(7);
    let (status, body) = send(patch("/api/products/p1", &token, &update), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["stock"], 7);

    let empty = ProductUpdate::default();
    let (status, _) = send(patch("/api/products/p1", &token, &empty), configure(MockCatalogueManager::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn my_products_is_not_shadowed_by_product_ids() {
    let mut manager = MockCatalogueManager::new();
    manager.expect_fetch_products_for_vendor().withf(|id| *id == 3).returning(|_| Ok(vec![product("p1", 3, 1, 1)]));
    let token = issue_token(2, Role::Vendor(3));
    let (status, body) = send(get("/api/products/mine", &token), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)[0]["id"], "p1");
}

#[actix_web::test]
async fn vendor_dashboard() {
    let mut manager = MockCatalogueManager::new();
    manager.expect_vendor_dashboard().withf(|id| *id == 3).returning(|_| {
        Ok(VendorDashboard {
            product_count: 2,
            low_stock: vec![product("p2", 3, 100, 8)],
            total_sales: Money::from_major_units(200),
        })
    });
    let token = issue_token(2, Role::Vendor(3));
    let (status, body) = send(get("/api/dashboard", &token), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    let dashboard = json(&body);
    assert_eq!(dashboard["product_count"], 2);
    assert_eq!(dashboard["total_sales"], "200.00");
    assert_eq!(dashboard["low_stock"][0]["stock"], 8);

    let token = issue_token(1, Role::Staff);
    let (status, _) = send(get("/api/dashboard", &token), configure(MockCatalogueManager::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn quotes() {
    let token = issue_token(1, Role::Customer(1));
    let mut manager = MockCatalogueManager::new();
    manager.expect_fetch_product().returning(|_| Ok(Some(product("p1", 3, 1_250, 4))));
    let body = json!({ "product_id": "p1", "quantity": 3 });
    let (status, body) = send(post("/api/quote", &token, &body), configure(manager)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["total"], "37.50");

    let mut manager = MockCatalogueManager::new();
    manager.expect_fetch_product().returning(|_| Ok(Some(product("p1", 3, 1_250, 4))));
    let body = json!({ "product_id": "p1", "quantity": 5 });
    let (status, body) = send(post("/api/quote", &token, &body), configure(manager)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("only 4 available"), "{body}");
}
