//! This crate provides domain interfaces and RPC data types that are shared
//! between services.

pub mod domain;
pub mod macros;
pub mod rpc;
