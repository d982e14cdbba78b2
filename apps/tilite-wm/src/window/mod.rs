pub mod bsp;
pub mod client;
pub mod drag;
pub mod error;
pub mod events;
pub mod geometry;
pub mod keys;
pub mod manager;
pub mod registry;
pub mod spawn;
