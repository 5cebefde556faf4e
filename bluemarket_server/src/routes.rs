//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests:
//! ```nocompile
//!     fn my_handler() -> impl Responder {
//!         std::thread::sleep(Duration::from_secs(5)); // <-- Bad practice! Will cause the current worker thread to
//! hang!
//!     }
//! ```
//! For this reason, any long, non-cpu-bound operation (e.g. I/O, database operations, etc.) should be expressed as
//! futures or asynchronous functions. Async handlers get executed concurrently by worker threads and thus don’t block
//! execution.
use actix_web::{get, web, HttpRequest, HttpResponse, Responder};
use bluemarket_engine::{
    db_types::{NewAccount, NewProduct, OrderId, ProductId, ProductUpdate},
    AccountApi,
    AccountManagement,
    MarketError,
    MarketplaceDatabase,
    OrderFlowApi,
    OrderQueries,
    PaymentGateway,
    ProductApi,
    ProductManagement,
};
use log::*;
use serde_json::json;

use crate::{
    auth::{JwtClaims, RoleKind, TokenIssuer},
    data_objects::{
        JsonResponse,
        LoginRequest,
        LoginResponse,
        PaymentVerification,
        PlaceOrderRequest,
        QuoteRequest,
        StatusUpdate,
    },
    errors::ServerError,
};

pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Razorpay-Signature";

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($roles:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds +)+ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Accounts  ----------------------------------------------------
route!(register => Post "/register" impl AccountManagement);
/// Creates a customer or vendor account. An email address can only hold one profile, so registering an existing
/// email, in either role, fails with a 409.
pub async fn register<B: AccountManagement>(
    body: web::Json<NewAccount>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let account = body.into_inner();
    debug!("💻️ Registration request for a {} profile", account.kind);
    let (account, profile) = api.register(account).await?;
    Ok(HttpResponse::Created().json(json!({ "account": account, "profile": profile })))
}

route!(login => Post "/login" impl AccountManagement);
/// Checks the user's credentials and issues an access token carrying their role.
///
/// The token must be supplied as a bearer token in the `Authorization` header of every call under `/api`.
pub async fn login<B: AccountManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AccountApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { email, password, role } = body.into_inner();
    trace!("💻️ Received login request");
    let (account, role) = api.authenticate(&email, &password, role).await?;
    let token = signer.issue_token(account.id, role)?;
    debug!("💻️ Issued access token for account #{} as {role}", account.id);
    Ok(HttpResponse::Ok().json(LoginResponse { token, account_id: account.id, role }))
}

route!(check_token => Get "/check_token" requires [RoleKind::Customer, RoleKind::Vendor, RoleKind::Staff]);
pub async fn check_token(claims: JwtClaims) -> impl Responder {
    trace!("💻️ Token check for account #{}", claims.account_id);
    HttpResponse::Ok().json(claims)
}

route!(profile => Get "/profile" impl AccountManagement, OrderQueries where requires [RoleKind::Customer, RoleKind::Vendor, RoleKind::Staff]);
pub async fn profile<A: AccountManagement + OrderQueries>(
    claims: JwtClaims,
    api: web::Data<AccountApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for {}", claims.role);
    let view = api.profile_view(claims.account_id, claims.role).await?;
    Ok(HttpResponse::Ok().json(view))
}

//----------------------------------------------   Products  ----------------------------------------------------
route!(products => Get "/products" impl ProductManagement);
pub async fn products<B: ProductManagement>(api: web::Data<ProductApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET products");
    let products = api.all_products().await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_by_id => Get "/products/{id}" impl ProductManagement);
pub async fn product_by_id<B: ProductManagement>(
    path: web::Path<String>,
    api: web::Data<ProductApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = ProductId::from(path.into_inner());
    trace!("💻️ GET product {id}");
    let product = api.product(&id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(my_products => Get "/products/mine" impl ProductManagement where requires [RoleKind::Vendor]);
pub async fn my_products<A: ProductManagement>(
    claims: JwtClaims,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET products for {}", claims.role);
    let products = api.my_products(claims.role).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(create_product => Post "/products" impl ProductManagement where requires [RoleKind::Vendor]);
pub async fn create_product<A: ProductManagement>(
    claims: JwtClaims,
    body: web::Json<NewProduct>,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST new product for {}", claims.role);
    let product = api.create_product(claims.role, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(update_product => Patch "/products/{id}" impl ProductManagement where requires [RoleKind::Vendor]);
pub async fn update_product<A: ProductManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<ProductUpdate>,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = ProductId::from(path.into_inner());
    let update = body.into_inner();
    if update.is_empty() {
        return Err(ServerError::InvalidRequestBody("Nothing to update".into()));
    }
    debug!("💻️ PATCH product {id} for {}", claims.role);
    let product = api.update_product(claims.role, &id, update).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{id}" impl ProductManagement where requires [RoleKind::Vendor]);
pub async fn delete_product<A: ProductManagement>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let id = ProductId::from(path.into_inner());
    debug!("💻️ DELETE product {id} for {}", claims.role);
    api.delete_product(claims.role, &id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Product {id} deleted"))))
}

route!(dashboard => Get "/dashboard" impl ProductManagement, OrderQueries where requires [RoleKind::Vendor]);
pub async fn dashboard<A: ProductManagement + OrderQueries>(
    claims: JwtClaims,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET dashboard for {}", claims.role);
    let dashboard = api.dashboard(claims.role).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

route!(quote => Post "/quote" impl ProductManagement where requires [RoleKind::Customer]);
/// Prices a single product for checkout. Nothing is reserved, so the quote may be stale by the time the order is
/// placed.
pub async fn quote<A: ProductManagement>(
    body: web::Json<QuoteRequest>,
    api: web::Data<ProductApi<A>>,
) -> Result<HttpResponse, ServerError> {
    let QuoteRequest { product_id, quantity } = body.into_inner();
    trace!("💻️ Quote for {quantity} x {product_id}");
    let quote = api.quote(&product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(quote))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(place_order => Post "/orders" impl MarketplaceDatabase, PaymentGateway);
/// Places an order for the logged-in customer.
///
/// Cash-on-delivery orders come back settled (`shipping`). Gateway orders come back `pending`, together with the
/// checkout details the client needs to collect the payment.
pub async fn place_order<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<PlaceOrderRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = claims.customer_id()?;
    let order = body.into_inner().into_new_order(customer_id);
    debug!("💻️ POST order for customer #{customer_id}: {} line(s), {}", order.lines.len(), order.method);
    let placed = api.place_order(order).await?;
    Ok(HttpResponse::Created().json(placed))
}

route!(my_orders => Get "/orders" impl MarketplaceDatabase, PaymentGateway);
pub async fn my_orders<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for {}", claims.role);
    let orders = api.orders_for(claims.role).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{order_id}" impl MarketplaceDatabase, PaymentGateway);
pub async fn order_by_id<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    debug!("💻️ GET order {order_id} for {}", claims.role);
    let order = api.order_for(claims.role, &order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Post "/orders/{order_id}/cancel" impl MarketplaceDatabase, PaymentGateway);
/// Cancels an order and returns its stock. Customers may cancel their own orders, and staff may cancel any order, as
/// long as it has not been paid for through the gateway or shipped.
pub async fn cancel_order<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    info!("💻️ Cancel request for order {order_id} from {}", claims.role);
    let order = api.cancel_order(claims.role, &order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Post "/orders/{order_id}/status" impl MarketplaceDatabase, PaymentGateway);
pub async fn update_order_status<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = OrderId::from(path.into_inner());
    let status = body.into_inner().status;
    info!("💻️ {} is moving order {order_id} to {status}", claims.role);
    let order = api.advance_fulfillment(claims.role, &order_id, status).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(verify_payment => Post "/payments/verify" impl MarketplaceDatabase, PaymentGateway);
/// The paying client posts the gateway's signed checkout result here. A correct signature confirms the order.
///
/// Posting the same confirmation again (or after the webhook got there first) is harmless.
pub async fn verify_payment<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<PaymentVerification>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = claims.customer_id()?;
    let callback = body.into_inner();
    debug!("💻️ Payment verification for gateway order {} from customer #{customer_id}", callback.gateway_order_id);
    let result = api.verify_client_payment(customer_id, callback.into()).await?;
    let message = if result.is_new_confirmation() { "Payment confirmed" } else { "Payment was already confirmed" };
    Ok(HttpResponse::Ok().json(json!({ "message": message, "order": result.into_order() })))
}

route!(gateway_webhook => Post "/webhook/gateway" impl MarketplaceDatabase, PaymentGateway);
/// Server-to-server notifications from the payment gateway.
///
/// The signature covers the raw request body, so the body is read as bytes and only parsed once it has been
/// verified. Every correctly signed notification is acknowledged with a 200, so that the gateway stops redelivering it.
pub async fn gateway_webhook<B: MarketplaceDatabase, G: PaymentGateway>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️🪝️ Received gateway webhook");
    let signature = req
        .headers()
        .get(WEBHOOK_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            warn!("💻️🪝️ Webhook arrived without a signature header");
            MarketError::SignatureInvalid
        })?;
    let outcome = api.process_webhook(&body, signature).await?;
    debug!("💻️🪝️ Webhook handled: {outcome:?}");
    Ok(HttpResponse::Ok().json(outcome))
}
