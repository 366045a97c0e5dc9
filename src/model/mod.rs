pub mod id;
pub mod node;
pub mod pipeline;
