pub mod anytrust;
pub mod blob;
pub mod celestia;
pub mod eigenda;
pub mod nearda;
pub mod reference;

pub(crate) mod constants {
    pub const BYTES_PER_BLOB: usize = 131_072;
    pub const FIELD_ELEMENTS_PER_BLOB: usize = 4096;
    pub const BYTES_PER_FIELD_ELEMENT: usize = 32;
}
