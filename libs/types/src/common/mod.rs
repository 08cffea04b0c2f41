//! Shared building blocks: the bit sequence toolkit, candlestick records and
//! their error types.

pub mod bits;
pub mod errors;
pub mod stick;
