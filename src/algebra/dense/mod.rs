mod core;
mod gemv;
mod storage;
mod symv;
mod types;

pub use self::storage::*;
pub use self::types::*;
