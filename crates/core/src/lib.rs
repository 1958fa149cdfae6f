//! JustMart Core - Shared types library.
//!
//! This crate provides the domain types used across all JustMart components:
//! - `storefront` - Marketplace API client, identity context and the
//!   cart/wishlist reconcilers
//! - `cli` - The `jm` command-line tool
//! - `integration-tests` - HTTP-level tests against a fake backend
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no async
//! runtime. Everything here is plain data with validation and serde support.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, emails, prices, products, cart lines, wishlist
//!   entries, orders, seller listings and profiles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
