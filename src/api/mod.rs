//! Typed REST access layered on the authenticated session.

pub mod client;

pub use client::ApiClient;
