mod millime;
pub mod op;
mod points;

pub use millime::{Millime, MillimeConversionError, TND_CURRENCY_CODE, TND_CURRENCY_CODE_LOWER};
pub use points::Points;
