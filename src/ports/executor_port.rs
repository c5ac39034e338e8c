//! Order placement port used by the live decision cycle.

use crate::domain::error::SigtraderError;
use crate::domain::position::Side;

pub trait OrderExecutor {
    fn place_order(
        &mut self,
        symbol: &str,
        side: Side,
        quantity: u64,
        price: f64,
    ) -> Result<(), SigtraderError>;
}
