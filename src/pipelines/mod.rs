//! Render state switching applied per render item before its draw call.

pub mod basic;
pub mod culling;
pub mod transparent;
