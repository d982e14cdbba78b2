pub mod atoms;
pub mod hints;
pub mod setup;
pub mod state;
pub mod strut;
