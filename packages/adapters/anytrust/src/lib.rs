mod error;
mod reader;
mod signing;
mod writer;

pub use error::{Error, Result};
pub use reader::RestReader;
pub use signing::{Sign, SigningWriter};
pub use writer::RpcWriter;
