pub mod chain;
pub mod config;
pub mod http;
pub mod job;
pub mod planner;
pub mod providers;
pub mod text;
pub mod viewer;

pub use chain::{BatchRequest, ChainOptions, ChainOutcome, FallbackChain, StopReason};
pub use config::{EngineConfig, ProviderKind};
pub use job::{DeckJob, DeckOutcome, DeckRequest};
