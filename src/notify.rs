//! Post-commit notifications for newly placed orders.
//!
//! Hooks run after the placement transaction has committed. A hook that
//! returns an error or panics is logged and skipped; it never affects the
//! remaining hooks or the caller.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::models::OrderDetail;

pub trait OrderHook: Send + Sync {
    fn name(&self) -> &str;

    fn order_created(&self, order: &OrderDetail) -> anyhow::Result<()>;
}

#[derive(Clone, Default)]
pub struct OrderHooks {
    hooks: Vec<Arc<dyn OrderHook>>,
}

impl OrderHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hook: impl OrderHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Deliver `order` to every hook. Returns how many hooks succeeded.
    pub fn dispatch(&self, order: &OrderDetail) -> usize {
        let mut delivered = 0;
        for hook in &self.hooks {
            match panic::catch_unwind(AssertUnwindSafe(|| hook.order_created(order))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => {
                    tracing::warn!(
                        hook = hook.name(),
                        order_id = order.id,
                        "order hook failed: {e:#}"
                    );
                }
                Err(_) => {
                    tracing::warn!(hook = hook.name(), order_id = order.id, "order hook panicked");
                }
            }
        }
        delivered
    }
}

/// Writes an order confirmation line to the log.
pub struct LogHook;

impl OrderHook for LogHook {
    fn name(&self) -> &str {
        "log"
    }

    fn order_created(&self, order: &OrderDetail) -> anyhow::Result<()> {
        tracing::info!(
            order_id = order.id,
            customer_id = order.customer_id,
            items = order.items.len(),
            total = %order.total_price(),
            "order confirmation"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderLine, PaymentStatus};
    use crate::money::Money;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::sync::Mutex;

    fn order() -> OrderDetail {
        OrderDetail {
            id: 7,
            customer_id: 1,
            placed_at: Utc::now(),
            payment_status: PaymentStatus::Pending,
            items: vec![OrderLine {
                id: 1,
                product_id: 3,
                product_title: "Mug".to_string(),
                quantity: 2,
                price: Money::new(Decimal::new(1000, 2)),
            }],
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<i64>>);

    impl OrderHook for Arc<Recorder> {
        fn name(&self) -> &str {
            "recorder"
        }

        fn order_created(&self, order: &OrderDetail) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(order.id);
            Ok(())
        }
    }

    struct Failing;

    impl OrderHook for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn order_created(&self, _order: &OrderDetail) -> anyhow::Result<()> {
            anyhow::bail!("smtp unavailable")
        }
    }

    struct Panicking;

    impl OrderHook for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn order_created(&self, _order: &OrderDetail) -> anyhow::Result<()> {
            panic!("boom")
        }
    }

    #[test]
    fn failing_hooks_do_not_stop_the_others() {
        let recorder = Arc::new(Recorder::default());
        let hooks = OrderHooks::new()
            .with(Failing)
            .with(Panicking)
            .with(recorder.clone())
            .with(LogHook);

        assert_eq!(hooks.len(), 4);
        assert_eq!(hooks.dispatch(&order()), 2);
        assert_eq!(*recorder.0.lock().unwrap(), vec![7]);
    }

    #[test]
    fn empty_hook_list() {
        let hooks = OrderHooks::new();
        assert!(hooks.is_empty());
        assert_eq!(hooks.dispatch(&order()), 0);
    }
}
