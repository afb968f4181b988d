//! Identity resolution and record fusion for people-lookup results
//!
//! Providers return heterogeneous response trees. This crate flattens them
//! into [`types::SourceRecord`]s, filters out records that belong to somebody
//! else, and fuses what remains into one [`types::ProfileEntity`] with
//! per-field provenance and a diagnostic [`types::FusionTrace`].
//!
//! Pipeline: normalizer → identity gate → {field resolver, set merger} → assembler.

pub mod config;
pub mod display;
pub mod fusion;
pub mod input;
pub mod types;

pub use config::FusionConfig;
pub use fusion::assembler::{fuse, ProfileAssembler};
pub use types::{Anchor, FusionTrace, GateMode, ProfileEntity, ProviderResponse};
