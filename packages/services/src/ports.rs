pub mod beacon;
pub mod l1;
