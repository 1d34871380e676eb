//! Threadline Core - Storefront domain library.
//!
//! This crate holds the rules the storefront applies on behalf of a shopper:
//! - [`redirect`] - Where to send a shopper after a login detour
//! - [`delivery`] - Which delivery zone covers an address, and its fee
//! - [`selection`] - The address selection state machine used at checkout
//! - [`cart`] - Cart line items and totals
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. The storefront binary feeds it data fetched
//! from the backend and persists whatever it returns.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod delivery;
pub mod location;
pub mod redirect;
pub mod selection;
pub mod types;

pub use types::*;
