//! `alloy` bindings for the contracts touched by the benchmark.
//!
//! Each order-book protocol gets its own module containing only the subset
//! of its interface the benchmark actually calls. All instances are typed
//! over [`alloy::providers::DynProvider`] so call sites never care about
//! the concrete provider stack.
pub mod clober;
pub mod crystal;
pub mod erc20;
pub mod gte;
pub mod kuru;
