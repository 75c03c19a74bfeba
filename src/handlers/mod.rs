//! Inbound adapters.

pub mod rest;
