//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::email::EmailService;
use crate::services::events::EventHub;
use crate::services::notify::AppNotifier;
use crate::services::orders::OrderService;
use crate::services::payments::PaymentSimulator;
use crate::store::PgOrderStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources like the database pool and the domain services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pool: PgPool,
    events: EventHub,
    orders: OrderService<PgOrderStore>,
    payments: PaymentSimulator<PgOrderStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Email delivery is enabled only when SMTP is configured; without it
    /// the notifier logs and skips sends.
    #[must_use]
    pub fn new(config: Config, pool: PgPool, email: Option<EmailService>) -> Self {
        let events = EventHub::new();
        let notifier = Arc::new(AppNotifier::new(pool.clone(), email, events.clone()));
        let orders = OrderService::new(PgOrderStore::new(pool.clone()), notifier);
        let payments = PaymentSimulator::new(orders.clone(), config.payment);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                events,
                orders,
                payments,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the event hub.
    #[must_use]
    pub fn events(&self) -> &EventHub {
        &self.inner.events
    }

    /// Get a reference to the order lifecycle service.
    #[must_use]
    pub fn orders(&self) -> &OrderService<PgOrderStore> {
        &self.inner.orders
    }

    /// Get a reference to the payment simulator.
    #[must_use]
    pub fn payments(&self) -> &PaymentSimulator<PgOrderStore> {
        &self.inner.payments
    }
}
