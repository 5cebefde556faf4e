use std::fmt::Debug;

use chrono::Duration;
use log::*;

use crate::{
    db_types::{FullOrder, GatewayConfirmation, NewOrder, Order, OrderId, OrderStatus, PaymentMethod, Role},
    events::{AnnulReason, EventProducers, OrderAnnulledEvent, OrderPaidEvent},
    market_api::order_objects::{GatewayCheckout, PaymentCallback, PlacedOrder, WebhookNotice, WebhookOutcome},
    traits::{ConfirmationResult, ExpiryResult, MarketError, MarketplaceDatabase, PaymentGateway},
};

/// `OrderFlowApi` is the primary API for placing orders and moving them through their life cycle.
///
/// It owns the two external seams of the order flow: the database backend `B` and the payment gateway `G`.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    /// Places an order for `order.customer_id`.
    ///
    /// Stock is reserved and the order, payment and shipping records are created atomically. Cash-on-delivery orders
    /// are settled straight away. For gateway orders a remote order is created *after* the local transaction has
    /// committed; if that fails, the local order is cancelled again (returning its stock) and a
    /// [`MarketError::GatewayError`] is returned.
    pub async fn place_order(&self, order: NewOrder) -> Result<PlacedOrder, MarketError> {
        let method = order.method;
        let mut full = self.db.place_order(order).await?;
        match method {
            PaymentMethod::Cod => {
                self.call_order_paid_hook(&full.order, method).await;
                Ok(PlacedOrder { order: full, checkout: None })
            },
            PaymentMethod::Gateway => {
                let order_id = full.order.id.clone();
                let amount = full.order.total;
                match self.open_gateway_order(&order_id, &full).await {
                    Ok(checkout) => {
                        full.payment.gateway_order_id = Some(checkout.gateway_order_id.clone());
                        debug!("🔄️📦️ Order {order_id} is awaiting gateway payment of {amount}");
                        Ok(PlacedOrder { order: full, checkout: Some(checkout) })
                    },
                    Err(e) => {
                        warn!("🔄️📦️ Could not open a gateway order for {order_id}: {e}. Cancelling the order.");
                        match self.db.cancel_order(&order_id).await {
                            Ok(cancelled) => {
                                self.call_order_annulled_hook(&cancelled.order, AnnulReason::Cancelled).await
                            },
                            Err(ce) => error!(
                                "🔄️📦️ Order {order_id} could not be cancelled after a gateway failure: {ce}. Its stock \
                                 is still reserved and the expiry worker will have to release it."
                            ),
                        }
                        Err(e)
                    },
                }
            },
        }
    }

    async fn open_gateway_order(&self, order_id: &OrderId, full: &FullOrder) -> Result<GatewayCheckout, MarketError> {
        let gateway_order_id = self.gateway.create_remote_order(full.order.total, order_id.as_str()).await?;
        self.db.attach_gateway_order(order_id, &gateway_order_id).await?;
        Ok(GatewayCheckout {
            key_id: self.gateway.key_id().to_string(),
            gateway_order_id,
            amount: full.order.total,
            currency: self.gateway.currency().to_string(),
            receipt: order_id.clone(),
        })
    }

    /// Handles the signed confirmation the paying client posts after checkout.
    ///
    /// Only the customer who placed the order may confirm it.
    pub async fn verify_client_payment(
        &self,
        customer_id: i64,
        callback: PaymentCallback,
    ) -> Result<ConfirmationResult, MarketError> {
        let PaymentCallback { gateway_order_id, gateway_payment_id, signature } = callback;
        if !self.gateway.verify_payment_signature(&gateway_order_id, &gateway_payment_id, &signature) {
            warn!("🔄️💰️ Invalid payment signature for gateway order {gateway_order_id}");
            return Err(MarketError::SignatureInvalid);
        }
        let order = self
            .db
            .fetch_order_by_gateway_id(&gateway_order_id)
            .await?
            .ok_or_else(|| MarketError::NotFound(format!("Gateway order {gateway_order_id}")))?;
        if order.order.customer_id != customer_id {
            warn!("🔄️💰️ Customer #{customer_id} tried to confirm order {} which is not theirs", order.order.id);
            return Err(MarketError::Unauthorized("This order belongs to another customer".into()));
        }
        let confirmation = GatewayConfirmation { gateway_order_id, gateway_payment_id, signature: Some(signature) };
        let result = self.db.confirm_gateway_payment(confirmation).await?;
        if result.is_new_confirmation() {
            self.call_order_paid_hook(&result.order().order, PaymentMethod::Gateway).await;
        }
        Ok(result)
    }

    /// Handles a server-to-server webhook from the gateway.
    ///
    /// A bad signature yields [`MarketError::SignatureInvalid`]. Anything else that the engine can make sense of is
    /// reported as a [`WebhookOutcome`] so that the gateway stops redelivering it.
    pub async fn process_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome, MarketError> {
        if !self.gateway.verify_webhook_signature(payload, signature) {
            warn!("🔄️🪝️ Webhook signature is invalid");
            return Err(MarketError::SignatureInvalid);
        }
        let (gateway_order_id, gateway_payment_id) = match self.gateway.parse_webhook(payload)? {
            WebhookNotice::Other { event } => {
                debug!("🔄️🪝️ Ignoring webhook event {event}");
                return Ok(WebhookOutcome::Ignored { event });
            },
            WebhookNotice::PaymentCaptured { gateway_order_id, gateway_payment_id } => {
                (gateway_order_id, gateway_payment_id)
            },
        };
        let confirmation =
            GatewayConfirmation { gateway_order_id: gateway_order_id.clone(), gateway_payment_id, signature: None };
        match self.db.confirm_gateway_payment(confirmation).await {
            Ok(ConfirmationResult::Confirmed(full)) => {
                info!("🔄️🪝️ Order {} confirmed by webhook", full.order.id);
                self.call_order_paid_hook(&full.order, PaymentMethod::Gateway).await;
                Ok(WebhookOutcome::Confirmed { order_id: full.order.id })
            },
            Ok(ConfirmationResult::AlreadyConfirmed(full)) => {
                Ok(WebhookOutcome::AlreadyConfirmed { order_id: full.order.id })
            },
            Err(MarketError::NotFound(_)) => {
                warn!("🔄️🪝️ Webhook for unknown gateway order {gateway_order_id}");
                Ok(WebhookOutcome::UnknownOrder { gateway_order_id })
            },
            Err(MarketError::InvalidTransition { from, .. }) => {
                error!(
                    "🔄️🪝️ Payment was captured for gateway order {gateway_order_id}, but the order is {from}. The \
                     payment needs to be refunded manually."
                );
                Ok(WebhookOutcome::NotPayable { gateway_order_id })
            },
            Err(e) => Err(e),
        }
    }

    /// Cancels an order on behalf of `role`. Customers may cancel their own orders; staff may cancel any order.
    pub async fn cancel_order(&self, role: Role, order_id: &OrderId) -> Result<FullOrder, MarketError> {
        let order =
            self.db.fetch_full_order(order_id).await?.ok_or_else(|| MarketError::order_not_found(order_id))?;
        let allowed = match role {
            Role::Customer(id) => order.order.customer_id == id,
            Role::Staff => true,
            Role::Vendor(_) => false,
        };
        if !allowed {
            return Err(MarketError::Unauthorized(format!("{role} may not cancel order {order_id}")));
        }
        let cancelled = self.db.cancel_order(order_id).await?;
        self.call_order_annulled_hook(&cancelled.order, AnnulReason::Cancelled).await;
        Ok(cancelled)
    }

    /// Moves an order along the fulfilment path. Staff, and vendors whose products are in the order, may do this.
    pub async fn advance_fulfillment(
        &self,
        role: Role,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<FullOrder, MarketError> {
        let allowed = match role {
            Role::Staff => true,
            Role::Vendor(id) => self.db.order_contains_vendor_products(order_id, id).await?,
            Role::Customer(_) => false,
        };
        if !allowed {
            return Err(MarketError::Unauthorized(format!("{role} may not update order {order_id}")));
        }
        self.db.advance_fulfillment(order_id, status).await
    }

    /// Fetches an order if `role` is allowed to see it: its customer, a vendor with a product in it, or staff.
    pub async fn order_for(&self, role: Role, order_id: &OrderId) -> Result<FullOrder, MarketError> {
        let order =
            self.db.fetch_full_order(order_id).await?.ok_or_else(|| MarketError::order_not_found(order_id))?;
        let visible = match role {
            Role::Customer(id) => order.order.customer_id == id,
            Role::Vendor(id) => self.db.order_contains_vendor_products(order_id, id).await?,
            Role::Staff => true,
        };
        if visible {
            Ok(order)
        } else {
            // Don't leak the existence of other people's orders
            Err(MarketError::order_not_found(order_id))
        }
    }

    /// A customer's own orders, or the orders containing a vendor's products. Newest first.
    pub async fn orders_for(&self, role: Role) -> Result<Vec<Order>, MarketError> {
        match role {
            Role::Customer(id) => self.db.fetch_orders_for_customer(id).await,
            Role::Vendor(id) => self.db.fetch_orders_for_vendor(id).await,
            Role::Staff => Err(MarketError::InvalidRequest("Staff accounts have no order history".into())),
        }
    }

    /// Cancels gateway orders that have been waiting for payment for longer than `limit`.
    pub async fn expire_unpaid_orders(&self, limit: Duration) -> Result<ExpiryResult, MarketError> {
        let result = self.db.expire_unpaid_orders(limit).await?;
        for order in &result.cancelled {
            self.call_order_annulled_hook(order, AnnulReason::Expired).await;
        }
        Ok(result)
    }

    async fn call_order_paid_hook(&self, order: &Order, method: PaymentMethod) {
        for emitter in &self.producers.order_paid_producer {
            debug!("🔄️📦️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone(), method)).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order, reason: AnnulReason) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone(), reason)).await;
        }
    }
}
