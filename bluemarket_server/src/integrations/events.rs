use bluemarket_engine::events::{EventHandlers, EventHooks, OrderAnnulledEvent, OrderPaidEvent};
use log::*;

pub const EVENT_BUFFER_SIZE: usize = 25;

/// Event handlers that record order life-cycle events in the server log.
///
/// 1. OrderPaidEvent - a cash-on-delivery order was placed, or a gateway payment was confirmed.
/// 2. OrderAnnulledEvent - an order was cancelled, or expired without being paid for. Its stock is already back on
///    the shelf.
pub fn create_logging_event_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        let OrderPaidEvent { order, method } = ev;
        Box::pin(async move {
            info!(
                "📬️ Order {} for customer #{} has been paid ({method}). Total: {}",
                order.id, order.customer_id, order.total
            );
        })
    });
    hooks.on_order_annulled(|ev| {
        let OrderAnnulledEvent { order, reason } = ev;
        Box::pin(async move {
            info!(
                "📬️ Order {} for customer #{} was annulled ({reason:?}). Status: {}",
                order.id, order.customer_id, order.status
            );
        })
    });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}
