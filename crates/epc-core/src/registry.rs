//! Stream config registry and cascade graph (spec §3, §4.5).

use epc_domain::StreamConfig;
use std::collections::HashMap;

/// Write-once-per-key store of stream configs, plus the derived cascade
/// graph. A stream's cascade set is every other registered name that starts
/// with `"{name}."` — which, because the relation is transitive by
/// construction (`"a.b.c"` also starts with `"a."`), already contains every
/// descendant. The dispatcher therefore walks a single flat set per `log`
/// call instead of recursing through intermediate levels (spec §9 "prefer
/// the non-recursive form").
#[derive(Debug, Default)]
pub struct StreamConfigRegistry {
    streams: HashMap<String, StreamConfig>,
    cascade: HashMap<String, Vec<String>>,
}

impl StreamConfigRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge-but-do-not-overwrite, then fully recompute the cascade graph.
    pub fn configure(&mut self, incoming: HashMap<String, StreamConfig>) {
        for (name, cfg) in incoming {
            if self.streams.contains_key(&name) {
                continue;
            }
            warn_on_shape_issues(&name, &cfg);
            self.streams.insert(name, cfg);
        }
        self.recompute_cascade();
    }

    fn recompute_cascade(&mut self) {
        self.cascade.clear();
        let names: Vec<&String> = self.streams.keys().collect();
        for x in &names {
            let prefix = format!("{x}.");
            let children: Vec<String> =
                names.iter().filter(|y| y.starts_with(&prefix)).map(|y| (*y).clone()).collect();
            self.cascade.insert((*x).clone(), children);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.streams.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&StreamConfig> {
        self.streams.get(name)
    }

    pub fn cascade_children(&self, name: &str) -> &[String] {
        self.cascade.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

fn warn_on_shape_issues(name: &str, cfg: &StreamConfig) {
    for reason in shape_issues(cfg) {
        let err = epc_domain::DomainError::ConfigShape { stream: name.to_string(), reason };
        tracing::warn!(stream = name, error = %err, "stream admitted despite config shape issue");
    }
}

fn shape_issues(cfg: &StreamConfig) -> Vec<String> {
    let mut reasons = Vec::new();
    if cfg.missing_destination() {
        reasons.push("missing destination; its events will never be sent".to_string());
    }
    if let Some(rate) = cfg.sample.rate {
        if !(0.0..=1.0).contains(&rate) {
            reasons.push(format!("sample.rate {rate} out of [0,1]; sampling will admit everything"));
        }
    }
    if cfg.sample.one_in_every == Some(0) {
        reasons.push("sample.one_in_every is 0; sampling will admit everything".to_string());
    }
    reasons
}
