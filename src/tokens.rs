//! Pluggable token counter (spec §4.7/§5).
//!
//! Follows `yaml_provider.rs`'s `OnceLock`-guarded provider pattern: a
//! trait object is installed once, lazily, and used as an opaque boundary by
//! the shaper. The default is a `cl100k_base` BPE counter; if its vocabulary
//! fails to initialize, the engine falls back to a heuristic counter and
//! logs a one-time warning (`TokenizerInitError`, spec §7) rather than
//! aborting condensation.

use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;

/// A pure, deterministic token estimator. Implementations must treat empty
/// input as 0 tokens.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> u32;
}

struct Cl100kCounter {
    bpe: CoreBPE,
}

impl TokenCounter for Cl100kCounter {
    fn count(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        self.bpe.encode_ordinary(text).len() as u32
    }
}

/// Roughly 4 characters per token, the standard order-of-magnitude fallback
/// used when the real tokenizer can't be loaded.
struct HeuristicCounter;

impl TokenCounter for HeuristicCounter {
    fn count(&self, text: &str) -> u32 {
        if text.is_empty() {
            return 0;
        }
        (text.chars().count() as u32).div_ceil(4).max(1)
    }
}

static COUNTER: OnceLock<Box<dyn TokenCounter>> = OnceLock::new();

/// Returns the process-wide default counter, initializing it on first use.
/// Safe to call concurrently (spec §5's "idempotent, safe under
/// first-use-from-multiple-tasks" requirement).
pub fn default_counter() -> &'static dyn TokenCounter {
    COUNTER
        .get_or_init(|| match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Box::new(Cl100kCounter { bpe }),
            Err(err) => {
                log::warn!("cl100k_base tokenizer init failed, falling back to heuristic counter: {err}");
                Box::new(HeuristicCounter)
            }
        })
        .as_ref()
}
