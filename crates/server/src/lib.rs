//! Orderline checkout server library.
//!
//! This crate provides the checkout service as a library, allowing it to be
//! tested end to end without binding a socket.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod config;
pub mod error;
pub mod middleware;
pub mod prices;
pub mod routes;
pub mod square;
pub mod state;

pub use routes::app;
pub use state::AppState;
