pub mod port;
pub mod service;

pub use service::EigenDaService;
