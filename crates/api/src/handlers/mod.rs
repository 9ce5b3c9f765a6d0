//! Request handlers.
//!
//! Handlers delegate to `marquee_core` and map failures via
//! [`AppError`](crate::error::AppError).

pub mod events;
