//! Order service composing validation, pricing and writing.

use store::Store;

use super::{
    OrderError, OrderNumber, OrderNumberGenerator, OrderSubmission, OrderWriter, PlacedOrder,
    Placement, PlacementState, PricingResolver,
};
use crate::identity::Identity;

/// Service for placing and reading orders.
///
/// Each call is independent. Placement is not idempotent: submitting the
/// same cart twice creates two orders.
#[derive(Clone)]
pub struct OrderService<S> {
    store: S,
    resolver: PricingResolver<S>,
    writer: OrderWriter<S>,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service with the given store.
    pub fn new(store: S) -> Self {
        Self {
            resolver: PricingResolver::new(store.clone()),
            writer: OrderWriter::new(store.clone()),
            store,
        }
    }

    /// Creates a service whose writer draws order numbers from `generator`.
    pub fn with_number_generator(store: S, generator: OrderNumberGenerator) -> Self {
        Self {
            resolver: PricingResolver::new(store.clone()),
            writer: OrderWriter::with_number_generator(store.clone(), generator),
            store,
        }
    }

    /// Places an order for `identity`, or as a guest when `None`.
    ///
    /// Either the header and every line are committed, or nothing is.
    #[tracing::instrument(
        skip(self, identity, submission),
        fields(user_id = identity.map(|i| i.user_id.as_i64()))
    )]
    pub async fn place_order(
        &self,
        identity: Option<&Identity>,
        submission: OrderSubmission,
    ) -> Result<PlacedOrder, OrderError> {
        let started = std::time::Instant::now();
        let mut placement = Placement::new();

        let result = self.run(&mut placement, identity, &submission).await;

        metrics::histogram!("order_placement_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        match &result {
            Ok(order) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(
                    order_number = %order.order_number,
                    total = %order.total,
                    "Order placed"
                );
            }
            Err(e) => {
                metrics::counter!("orders_failed_total", "reason" => e.reason()).increment(1);
                match e {
                    OrderError::Persistence(_) => {
                        tracing::error!(error = %e, state = %placement.state(), "Order placement failed")
                    }
                    _ => tracing::info!(error = %e, "Order rejected"),
                }
            }
        }

        result
    }

    async fn run(
        &self,
        placement: &mut Placement,
        identity: Option<&Identity>,
        submission: &OrderSubmission,
    ) -> Result<PlacedOrder, OrderError> {
        let order = match submission.validate() {
            Ok(order) => order,
            Err(e) => {
                placement.advance(PlacementState::RolledBack);
                return Err(e.into());
            }
        };
        placement.advance(PlacementState::Validated);

        let priced = match self.resolver.resolve(&order.lines).await {
            Ok(priced) => priced,
            Err(e) => {
                placement.advance(PlacementState::RolledBack);
                return Err(e);
            }
        };
        placement.advance(PlacementState::Priced);

        placement.advance(PlacementState::Writing);
        let user_id = identity.map(|i| i.user_id);
        match self.writer.write(user_id, &order, priced).await {
            Ok(placed) => {
                placement.advance(PlacementState::Committed);
                Ok(placed)
            }
            Err(e) => {
                placement.advance(PlacementState::RolledBack);
                Err(e)
            }
        }
    }

    /// Loads an order by number.
    ///
    /// Orders owned by a user are visible only to that user. Guest orders
    /// are visible to anyone holding the number.
    #[tracing::instrument(skip(self, identity))]
    pub async fn get_order(
        &self,
        order_number: &str,
        identity: Option<&Identity>,
    ) -> Result<PlacedOrder, OrderError> {
        let not_found = || OrderError::NotFound(order_number.to_string());

        if !OrderNumber::is_well_formed(order_number) {
            return Err(not_found());
        }

        let record = self
            .store
            .get_order(order_number)
            .await?
            .ok_or_else(not_found)?;

        let visible = match record.user_id {
            Some(owner) => identity.is_some_and(|i| i.user_id == owner),
            None => true,
        };
        if !visible {
            return Err(not_found());
        }

        Ok(PlacedOrder::try_from(record)?)
    }

    /// Lists the orders of an authenticated user, newest first.
    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id.as_i64()))]
    pub async fn list_orders(&self, identity: &Identity) -> Result<Vec<PlacedOrder>, OrderError> {
        let records = self.store.list_orders_for_user(identity.user_id).await?;
        records
            .into_iter()
            .map(|record| PlacedOrder::try_from(record).map_err(OrderError::from))
            .collect()
    }
}
