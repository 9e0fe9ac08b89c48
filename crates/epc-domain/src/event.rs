//! The event data model (spec §3 "Event").

use crate::error::DomainError;
use serde_json::{Map, Value};

/// Reserved sub-map carried under the `meta` key of every event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Meta {
    pub dt: Option<String>,
    pub id: Option<String>,
    pub stream: Option<String>,
    pub domain: Option<String>,
    pub uri: Option<String>,
    /// Supplemental: set when the admitting stream has `is_debug = true`.
    pub is_debug: Option<bool>,
}

impl Meta {
    fn to_json(&self) -> Value {
        let mut m = Map::new();
        if let Some(dt) = &self.dt {
            m.insert("dt".into(), Value::String(dt.clone()));
        }
        if let Some(id) = &self.id {
            m.insert("id".into(), Value::String(id.clone()));
        }
        if let Some(stream) = &self.stream {
            m.insert("stream".into(), Value::String(stream.clone()));
        }
        if let Some(domain) = &self.domain {
            m.insert("domain".into(), Value::String(domain.clone()));
        }
        if let Some(uri) = &self.uri {
            m.insert("uri".into(), Value::String(uri.clone()));
        }
        if let Some(is_debug) = self.is_debug {
            m.insert("is_debug".into(), Value::Bool(is_debug));
        }
        Value::Object(m)
    }

    fn from_json(v: &Value) -> Self {
        let obj = v.as_object();
        let get_str = |k: &str| obj.and_then(|o| o.get(k)).and_then(|v| v.as_str()).map(str::to_owned);
        Self {
            dt: get_str("dt"),
            id: get_str("id"),
            stream: get_str("stream"),
            domain: get_str("domain"),
            uri: get_str("uri"),
            is_debug: obj.and_then(|o| o.get("is_debug")).and_then(|v| v.as_bool()),
        }
    }
}

/// An application event addressed to a stream.
///
/// Holds application-supplied fields plus the reserved `meta` sub-map and
/// `$schema`. Once [`Event::into_canonical_json`] has been called the event
/// is consumed — there is no path back to a mutable `Event` (spec §3).
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    fields: Map<String, Value>,
}

impl Event {
    /// Wrap caller-supplied fields. Any `meta`/`$schema` keys already present
    /// are preserved as-is (e.g. when replaying from the deferred buffer).
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn has_meta(&self) -> bool {
        self.fields.contains_key("meta")
    }

    pub fn meta(&self) -> Meta {
        self.fields.get("meta").map(Meta::from_json).unwrap_or_default()
    }

    /// Step 1 of dispatch: stamp `meta.dt` if this is the first time the
    /// event has been seen. Idempotent — does nothing if `meta` is present.
    pub fn ensure_timestamp(&mut self, now_iso_8601: &str) {
        if !self.has_meta() {
            let meta = Meta { dt: Some(now_iso_8601.to_string()), ..Default::default() };
            self.fields.insert("meta".into(), meta.to_json());
        }
    }

    /// Step 8 enrichment: stamp identity/provenance fields onto a copy that
    /// has already passed every gate.
    pub fn enrich(&mut self, id: String, stream: String, schema: Option<String>, is_debug: bool) {
        let mut meta = self.meta();
        meta.id = Some(id);
        meta.stream = Some(stream);
        if is_debug {
            meta.is_debug = Some(true);
        }
        self.fields.insert("meta".into(), meta.to_json());
        if let Some(schema) = schema {
            self.fields.insert("$schema".into(), Value::String(schema));
        }
    }

    /// Attach the identity fields that privacy-preserving streams omit
    /// (spec §4.1 step 8).
    pub fn set_identity_fields(&mut self, pageview_id: &str, session_id: &str, activity_id: &str) {
        self.fields.insert("pageview_id".into(), Value::String(pageview_id.to_string()));
        self.fields.insert("session_id".into(), Value::String(session_id.to_string()));
        self.fields.insert("activity_id".into(), Value::String(activity_id.to_string()));
    }

    /// Shallow duplication sufficient to prevent downstream mutations from
    /// leaking back into the parent's event (spec §4.1 step 3). `Value` owns
    /// its data, so cloning the field map already gives every cascade child
    /// an independent copy while preserving `meta.dt`.
    pub fn duplicate_for_cascade(&self) -> Self {
        self.clone()
    }

    pub fn into_canonical_json(self) -> Result<String, DomainError> {
        let value = Value::Object(self.fields);
        // Round-trip through serde_json to catch genuinely unrepresentable
        // values (e.g. NaN floats) before canonicalising.
        serde_json::to_value(&value)?;
        Ok(crate::canonical_json::to_canonical_json(&value))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}
