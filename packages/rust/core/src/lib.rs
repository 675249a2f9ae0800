//! Configuration resolution and batch orchestration for collectonce.
//!
//! This crate ties configuration sources, the crawl capability, and result
//! persistence into one batch run (see [`pipeline::collect_once`]).

pub mod logging;
pub mod orchestrator;
pub mod persist;
pub mod pipeline;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;
