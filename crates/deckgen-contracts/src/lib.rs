pub mod events;
pub mod payload;
pub mod plan;
pub mod prompts;
pub mod providers;
pub mod runs;
pub mod sizing;
pub mod styles;
pub mod transitions;
