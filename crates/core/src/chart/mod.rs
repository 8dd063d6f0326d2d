pub mod entity;
pub mod error;
pub mod linear;
pub mod port;
