pub mod candidate;
pub mod catalog;
pub mod result;
pub mod schema;
pub mod template;
