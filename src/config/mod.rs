pub mod catalog;
pub mod resolver;
pub mod types;
pub mod value;
