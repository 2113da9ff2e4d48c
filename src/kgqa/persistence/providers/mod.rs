pub mod memory;
pub mod surreal;
