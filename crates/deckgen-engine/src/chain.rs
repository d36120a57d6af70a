use std::time::{Duration, Instant};

use deckgen_contracts::payload::Payload;
use deckgen_contracts::providers::{GenerationParams, ProviderAdapter};

use crate::text::error_chain_text;

const FAULT_TEXT_MAX_CHARS: usize = 512;

/// Limits applied on top of "try every provider once".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChainOptions {
    /// A slot tried by this many providers stops being retried.
    pub max_attempts_per_item: Option<usize>,
    /// Checked before each round; pending slots fail once it has passed.
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub prompts: Vec<String>,
    pub params: GenerationParams,
}

impl BatchRequest {
    pub fn new(prompts: Vec<String>, params: GenerationParams) -> Self {
        Self { prompts, params }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Pending,
    Succeeded,
    PermanentlyFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSlot {
    pub index: usize,
    pub payload: Option<Payload>,
    pub state: SlotState,
    /// Number of providers that have been asked for this item.
    pub attempts: usize,
    /// Provider that produced the payload.
    pub provider: Option<String>,
}

impl ItemSlot {
    fn pending(index: usize) -> Self {
        Self {
            index,
            payload: None,
            state: SlotState::Pending,
            attempts: 0,
            provider: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state == SlotState::Pending
    }
}

/// One provider's pass over the pending sub-batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRecord {
    /// 0-based position of the provider among the available ones.
    pub level: usize,
    pub provider: String,
    /// Batch indices sent in this round, ascending.
    pub indices: Vec<usize>,
    pub succeeded: Vec<usize>,
    /// Set when `generate_batch` itself returned an error.
    pub fault: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EmptyBatch,
    NoProviders,
    AllSucceeded,
    AttemptsExhausted,
    ProvidersExhausted,
    DeadlineExpired,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyBatch => "empty_batch",
            Self::NoProviders => "no_providers",
            Self::AllSucceeded => "all_succeeded",
            Self::AttemptsExhausted => "attempts_exhausted",
            Self::ProvidersExhausted => "providers_exhausted",
            Self::DeadlineExpired => "deadline_expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOutcome {
    pub slots: Vec<ItemSlot>,
    pub rounds: Vec<RoundRecord>,
    pub stop: StopReason,
}

impl ChainOutcome {
    pub fn success_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.state == SlotState::Succeeded)
            .count()
    }

    pub fn failed_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|slot| slot.state != SlotState::Succeeded)
            .map(|slot| slot.index)
            .collect()
    }

    pub fn into_results(self) -> Vec<Option<Payload>> {
        self.slots.into_iter().map(|slot| slot.payload).collect()
    }
}

/// Ordered fallback over provider adapters.
///
/// Availability is read once here; unavailable adapters never take part. Each run sends the
/// still-pending items to one provider at a time, in priority order, and results are matched
/// back to their batch index by position.
pub struct FallbackChain {
    providers: Vec<Box<dyn ProviderAdapter>>,
    skipped: Vec<String>,
    options: ChainOptions,
}

impl FallbackChain {
    pub fn new(adapters: Vec<Box<dyn ProviderAdapter>>) -> Self {
        let mut providers = Vec::with_capacity(adapters.len());
        let mut skipped = Vec::new();
        for adapter in adapters {
            if adapter.is_available() {
                providers.push(adapter);
            } else {
                tracing::info!(provider = adapter.name(), "provider unavailable, skipping");
                skipped.push(adapter.name().to_string());
            }
        }
        Self {
            providers,
            skipped,
            options: ChainOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ChainOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> ChainOptions {
        self.options
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.name().to_string())
            .collect()
    }

    pub fn skipped_providers(&self) -> &[String] {
        &self.skipped
    }

    pub fn has_providers(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Same length as `batch.prompts`; `None` where no provider produced an image.
    pub fn generate(&self, batch: &BatchRequest) -> Vec<Option<Payload>> {
        self.run(batch).into_results()
    }

    pub fn run(&self, batch: &BatchRequest) -> ChainOutcome {
        let started = Instant::now();
        let mut slots: Vec<ItemSlot> = (0..batch.len()).map(ItemSlot::pending).collect();
        let mut rounds = Vec::new();

        if slots.is_empty() {
            return ChainOutcome {
                slots,
                rounds,
                stop: StopReason::EmptyBatch,
            };
        }
        if self.providers.is_empty() {
            tracing::warn!(items = slots.len(), "no image providers available");
            fail_pending(&mut slots);
            return ChainOutcome {
                slots,
                rounds,
                stop: StopReason::NoProviders,
            };
        }

        for (level, provider) in self.providers.iter().enumerate() {
            let pending: Vec<usize> = slots
                .iter()
                .filter(|slot| slot.is_pending())
                .map(|slot| slot.index)
                .collect();
            if pending.is_empty() {
                break;
            }
            if let Some(deadline) = self.options.deadline {
                if started.elapsed() >= deadline {
                    tracing::warn!(
                        pending = pending.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "run deadline reached"
                    );
                    fail_pending(&mut slots);
                    return ChainOutcome {
                        slots,
                        rounds,
                        stop: StopReason::DeadlineExpired,
                    };
                }
            }

            let name = provider.name().to_string();
            let sub_batch: Vec<String> = pending
                .iter()
                .map(|idx| batch.prompts[*idx].clone())
                .collect();
            tracing::info!(provider = %name, level, items = sub_batch.len(), "round started");

            let mut record = RoundRecord {
                level,
                provider: name.clone(),
                indices: pending.clone(),
                succeeded: Vec::new(),
                fault: None,
            };
            match provider.generate_batch(&sub_batch, &batch.params) {
                Ok(results) => {
                    if results.len() != pending.len() {
                        tracing::warn!(
                            provider = %name,
                            expected = pending.len(),
                            returned = results.len(),
                            "provider returned a mismatched batch"
                        );
                    }
                    let mut results = results.into_iter();
                    for idx in &pending {
                        let slot = &mut slots[*idx];
                        slot.attempts += 1;
                        if let Some(Some(payload)) = results.next() {
                            slot.payload = Some(payload);
                            slot.state = SlotState::Succeeded;
                            slot.provider = Some(name.clone());
                            record.succeeded.push(*idx);
                        }
                    }
                }
                Err(err) => {
                    let fault = error_chain_text(&err, FAULT_TEXT_MAX_CHARS);
                    tracing::warn!(provider = %name, level, "round failed: {fault}");
                    for idx in &pending {
                        slots[*idx].attempts += 1;
                    }
                    record.fault = Some(fault);
                }
            }
            tracing::info!(
                provider = %name,
                level,
                succeeded = record.succeeded.len(),
                requested = record.indices.len(),
                "round finished"
            );
            rounds.push(record);

            if let Some(ceiling) = self.options.max_attempts_per_item {
                for slot in slots.iter_mut() {
                    if slot.is_pending() && slot.attempts >= ceiling {
                        slot.state = SlotState::PermanentlyFailed;
                    }
                }
            }
        }

        let leftover = slots.iter().any(ItemSlot::is_pending);
        fail_pending(&mut slots);
        let stop = if slots.iter().all(|slot| slot.state == SlotState::Succeeded) {
            StopReason::AllSucceeded
        } else if leftover {
            StopReason::ProvidersExhausted
        } else {
            StopReason::AttemptsExhausted
        };
        ChainOutcome {
            slots,
            rounds,
            stop,
        }
    }

    /// First image any provider returns for a single prompt, trying them in order.
    pub fn generate_single(&self, prompt: &str, params: &GenerationParams) -> Option<Payload> {
        for provider in &self.providers {
            match provider.generate_one(prompt, params) {
                Ok(Some(payload)) => return Some(payload),
                Ok(None) => {
                    tracing::warn!(provider = provider.name(), "provider returned no image");
                }
                Err(err) => {
                    tracing::warn!(provider = provider.name(), "single generation failed: {err:#}");
                }
            }
        }
        None
    }
}

fn fail_pending(slots: &mut [ItemSlot]) {
    for slot in slots.iter_mut().filter(|slot| slot.is_pending()) {
        slot.state = SlotState::PermanentlyFailed;
    }
}
