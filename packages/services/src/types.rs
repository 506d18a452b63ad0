pub use alloy::primitives::Address;

mod backend;
mod dispersal;
mod l1;

pub use backend::*;
pub use dispersal::*;
pub use l1::*;
