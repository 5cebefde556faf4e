use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use bluemarket_engine::{events::EventProducers, AccountApi, OrderFlowApi, ProductApi, SqliteDatabase};
use log::*;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    integrations::{events::create_logging_event_handlers, gateway::RazorpayGateway},
    middleware::JwtMiddlewareFactory,
    routes::{
        health,
        CancelOrderRoute,
        CheckTokenRoute,
        CreateProductRoute,
        DashboardRoute,
        DeleteProductRoute,
        GatewayWebhookRoute,
        LoginRoute,
        MyOrdersRoute,
        MyProductsRoute,
        OrderByIdRoute,
        PlaceOrderRoute,
        ProductByIdRoute,
        ProductsRoute,
        ProfileRoute,
        QuoteRoute,
        RegisterRoute,
        UpdateOrderStatusRoute,
        UpdateProductRoute,
        VerifyPaymentRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_options(&config.database_url, config.max_connections, config.busy_timeout)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await?;
    let gateway =
        RazorpayGateway::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_logging_event_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    info!("📬️ Event handlers started");
    let expiry_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone());
    let _worker = start_expiry_worker(expiry_api, config.unpaid_order_timeout);
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Request bodies that fail to deserialize are reported as `{"error": ...}` like every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejected request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: RazorpayGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let signer = TokenIssuer::new(&config.auth);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone());
        let accounts_api = AccountApi::new(db.clone());
        let products_api = ProductApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bm::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(web::Data::new(products_api))
            .app_data(web::Data::new(signer.clone()))
            .app_data(json_config());
        // Routes that require authentication
        let auth_scope = web::scope("/api")
            .wrap(JwtMiddlewareFactory::new(signer.clone()))
            .service(CheckTokenRoute::new())
            .service(ProfileRoute::<SqliteDatabase>::new())
            .service(MyProductsRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(DashboardRoute::<SqliteDatabase>::new())
            .service(QuoteRoute::<SqliteDatabase>::new())
            .service(PlaceOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(CancelOrderRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase, RazorpayGateway>::new())
            .service(VerifyPaymentRoute::<SqliteDatabase, RazorpayGateway>::new());
        app.service(auth_scope)
            .service(health)
            .service(RegisterRoute::<SqliteDatabase>::new())
            .service(LoginRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(GatewayWebhookRoute::<SqliteDatabase, RazorpayGateway>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
