//! Paper-trading executor: records orders instead of routing them.

use tracing::info;

use crate::domain::error::SigtraderError;
use crate::domain::position::Side;
use crate::ports::executor_port::OrderExecutor;

#[derive(Debug, Clone, PartialEq)]
pub struct PaperOrder {
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
}

#[derive(Debug, Default)]
pub struct PaperExecutor {
    reject_all: bool,
    orders: Vec<PaperOrder>,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// An executor that refuses every order, for exercising failure paths.
    pub fn rejecting() -> Self {
        Self {
            reject_all: true,
            orders: Vec::new(),
        }
    }

    pub fn orders(&self) -> &[PaperOrder] {
        &self.orders
    }
}

impl OrderExecutor for PaperExecutor {
    fn place_order(
        &mut self,
        symbol: &str,
        side: Side,
        quantity: u64,
        price: f64,
    ) -> Result<(), SigtraderError> {
        if self.reject_all {
            return Err(SigtraderError::OrderRejected {
                symbol: symbol.to_string(),
                reason: "paper executor set to reject".into(),
            });
        }
        if quantity == 0 {
            return Err(SigtraderError::OrderRejected {
                symbol: symbol.to_string(),
                reason: "zero quantity".into(),
            });
        }

        info!(symbol, side = %side, quantity, price, "paper order recorded");
        self.orders.push(PaperOrder {
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
        });
        Ok(())
    }
}
