//! Orderline Core - checkout pricing and order construction.
//!
//! This crate provides the pricing and order types shared by all Orderline
//! components:
//! - `server` - Checkout HTTP service (remote order + payment calls)
//! - `cli` - Operator tools for price files and offline quotes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no clocks. The pipeline is:
//!
//! ```text
//! client cart ─► sanitize ─► compute_totals ─┐
//!                        └─► assemble_order ─┴─► (server) create order ─► capture payment
//! ```
//!
//! # Modules
//!
//! - [`types`] - Newtypes for money, emails, phone numbers and remote IDs
//! - [`pricing`] - The price authority (trusted menu prices, atomic replace)
//! - [`sanitize`] - Re-pricing a client cart against the price authority
//! - [`totals`] - Subtotal, delivery fee, tax and grand total
//! - [`order`] - Fulfillment-typed order documents (pickup or delivery)
//! - [`cart`] - Client-side cart model with forgiving quantity parsing
//! - [`error`] - The checkout error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod error;
pub mod order;
pub mod pricing;
pub mod sanitize;
pub mod totals;
pub mod types;

pub use error::CheckoutError;
pub use order::{
    Address, ContactInfo, FulfillmentKind, FulfillmentRequest, OrderDraft, OrderFulfillment,
    OrderLine, ScheduleType, StructuredAddress, TaxDeclaration, assemble_order,
};
pub use pricing::{PriceAuthority, PriceHealth, PriceTable};
pub use sanitize::{CartItemInput, CheckoutLine, sanitize};
pub use totals::{PricingConfig, Totals, compute_totals};
pub use types::*;
