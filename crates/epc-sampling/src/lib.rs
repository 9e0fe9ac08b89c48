//! epc-sampling: the deterministic admission predicate (spec §4.3).
//!
//! `in_sample` is pure in `(token, cfg)` — no clock, no RNG, no I/O — which
//! is what lets the same scope identity always land on the same side of the
//! sampling boundary for the lifetime of that identity.

use epc_domain::SampleConfig;

/// Contract for admission policies, mirroring the way the rest of the
/// workspace keeps a pure decision behind a trait so tests can swap it out.
pub trait SamplingPolicy {
    fn in_sample(&self, token: &str, cfg: &SampleConfig) -> bool;
}

/// The one sampling policy the spec describes: first 8 hex chars of the
/// token as a u32, checked against `one_in_every` (or the equivalent `rate`
/// threshold).
#[derive(Debug, Default, Clone, Copy)]
pub struct DeterministicSampling;

impl SamplingPolicy for DeterministicSampling {
    fn in_sample(&self, token: &str, cfg: &SampleConfig) -> bool {
        in_sample(token, cfg)
    }
}

/// Parse the first 8 hex characters of `token` as an unsigned 32-bit integer.
/// Returns `None` if the token is too short or not hex — callers fail open.
fn token_bits(token: &str) -> Option<u32> {
    let prefix_len = token.len().min(8);
    u32::from_str_radix(&token[..prefix_len], 16).ok()
}

/// Spec §4.3: admit everything when `cfg` carries no recognised sampling
/// sub-key; otherwise compare the token's leading bits against the
/// configured rate (`one_in_every` takes precedence when both are set —
/// see DESIGN.md "sampling config precedence").
pub fn in_sample(token: &str, cfg: &SampleConfig) -> bool {
    if cfg.is_empty() {
        return true;
    }

    let Some(t) = token_bits(token) else {
        tracing::warn!(token, "sampling token is not parseable as hex; admitting by default");
        return true;
    };

    if let Some(one_in_every) = cfg.one_in_every {
        if one_in_every == 0 {
            tracing::warn!("one_in_every=0 is not a valid sampling rate; admitting by default");
            return true;
        }
        return (t as u64 % one_in_every) == 0;
    }

    if let Some(rate) = cfg.rate {
        if !(0.0..=1.0).contains(&rate) {
            tracing::warn!(rate, "sample rate out of [0,1]; admitting by default");
            return true;
        }
        let normalised = t as f64 / (u32::MAX as f64 + 1.0);
        return normalised < rate;
    }

    true
}
