use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, OrderAnnulledEvent, OrderPaidEvent};

/// The sending halves of every registered hook. [`crate::OrderFlowApi`] holds a copy and publishes through it.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub order_annulled_producer: Vec<EventProducer<OrderAnnulledEvent>>,
}

/// The receiving halves. Each hook runs in its own task once [`EventHandlers::start_handlers`] is called.
pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_order_annulled: Option<EventHandler<OrderAnnulledEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let EventHooks { on_order_paid, on_order_annulled } = hooks;
        Self {
            on_order_paid: on_order_paid.map(|f| EventHandler::new(buffer_size, f)),
            on_order_annulled: on_order_annulled.map(|f| EventHandler::new(buffer_size, f)),
        }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            order_paid_producer: self.on_order_paid.iter().map(EventHandler::subscribe).collect(),
            order_annulled_producer: self.on_order_annulled.iter().map(EventHandler::subscribe).collect(),
        }
    }

    pub async fn start_handlers(self) {
        spawn_handler("order paid", self.on_order_paid);
        spawn_handler("order annulled", self.on_order_annulled);
    }
}

fn spawn_handler<E: Send + Sync + 'static>(name: &str, handler: Option<EventHandler<E>>) {
    match handler {
        Some(handler) => {
            debug!("📬️ Starting the {name} hook");
            tokio::spawn(handler.start_handler());
        },
        None => trace!("📬️ No {name} hook registered"),
    }
}

/// Callbacks to run when orders change hands. Register them here and pass the result to [`EventHandlers::new`].
#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_order_annulled: Option<Handler<OrderAnnulledEvent>>,
}

impl EventHooks {
    /// Runs after a cash-on-delivery order is placed or a gateway payment is confirmed.
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_paid = Some(Arc::new(f));
        self
    }

    /// Runs after an order is cancelled or expires. Its stock has already been restored.
    pub fn on_order_annulled<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderAnnulledEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        self.on_order_annulled = Some(Arc::new(f));
        self
    }
}
