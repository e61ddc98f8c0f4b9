pub mod archive;
pub mod basis;
pub mod bindings;
pub mod error;
pub mod events;
pub mod matrix;
pub mod pipeline;
pub mod session;
