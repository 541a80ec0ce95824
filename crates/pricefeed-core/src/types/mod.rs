//! 파이프라인 전반에서 사용되는 공통 타입.

mod price_row;
mod symbol;
mod symbol_result;

pub use price_row::*;
pub use symbol::*;
pub use symbol_result::*;
