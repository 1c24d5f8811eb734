// ── Configuration store seam ──
//
// The declarative store owns desired values, change tracking and the
// resource identifier. The core reads and writes it only through
// `ResourceData`. `MemoryResourceData` is a self-contained implementation
// with a prior (applied) snapshot and a planned overlay.

use serde_json::{Map, Value};

/// Accessors the lifecycle needs from the configuration store.
pub trait ResourceData: Send + Sync {
    /// Current value of `key`: planned if set, otherwise prior. `Null`
    /// when the key is unknown.
    fn get(&self, key: &str) -> Value;

    /// `Some` when `key` holds a non-zero value.
    fn get_ok(&self, key: &str) -> Option<Value> {
        let value = self.get(key);
        (!is_zero(&value)).then_some(value)
    }

    /// Whether the planned value of `key` differs from the prior one.
    fn has_change(&self, key: &str) -> bool;

    /// `(prior, current)` values of `key`.
    fn get_change(&self, key: &str) -> (Value, Value);

    /// Record a value produced by the remote side.
    fn set(&mut self, key: &str, value: Value);

    /// Record the resource identifier. An empty id marks the resource gone.
    fn set_id(&mut self, id: &str);

    fn id(&self) -> String;
}

/// The store's notion of "not declared".
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_u64() == Some(0) || n.as_i64() == Some(0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn differs(a: &Value, b: &Value) -> bool {
    a != b && !(is_zero(a) && is_zero(b))
}

/// In-memory store.
///
/// `plan` stages desired values; `commit` promotes them to the prior
/// snapshot, the way a declarative engine does after a successful apply.
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceData {
    id: String,
    prior: Map<String, Value>,
    planned: Map<String, Value>,
}

impl MemoryResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose planned values are the members of `values`, which
    /// must be a JSON object. Anything else yields an empty plan.
    pub fn planned(values: Value) -> Self {
        let mut d = Self::new();
        d.plan_all(values);
        d
    }

    pub fn plan(&mut self, key: &str, value: Value) {
        self.planned.insert(key.to_owned(), value);
    }

    pub fn plan_all(&mut self, values: Value) {
        if let Value::Object(map) = values {
            self.planned.extend(map);
        }
    }

    /// Stage removal of a declared value.
    pub fn unset(&mut self, key: &str) {
        self.plan(key, Value::Null);
    }

    /// Promote planned values over the prior snapshot.
    pub fn commit(&mut self) {
        for (key, value) in std::mem::take(&mut self.planned) {
            if value.is_null() {
                self.prior.remove(&key);
            } else {
                self.prior.insert(key, value);
            }
        }
    }

    pub fn prior(&self) -> &Map<String, Value> {
        &self.prior
    }
}

impl ResourceData for MemoryResourceData {
    fn get(&self, key: &str) -> Value {
        self.planned
            .get(key)
            .or_else(|| self.prior.get(key))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn has_change(&self, key: &str) -> bool {
        let (old, new) = self.get_change(key);
        differs(&old, &new)
    }

    fn get_change(&self, key: &str) -> (Value, Value) {
        let old = self.prior.get(key).cloned().unwrap_or(Value::Null);
        (old, self.get(key))
    }

    fn set(&mut self, key: &str, value: Value) {
        self.prior.insert(key.to_owned(), value);
    }

    fn set_id(&mut self, id: &str) {
        id.clone_into(&mut self.id);
    }

    fn id(&self) -> String {
        self.id.clone()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn planned_values_shadow_prior() {
        let mut d = MemoryResourceData::planned(json!({ "gw_size": "t3.small" }));
        d.commit();
        d.plan("gw_size", json!("t3.large"));

        assert_eq!(d.get("gw_size"), json!("t3.large"));
        assert_eq!(d.get_change("gw_size"), (json!("t3.small"), json!("t3.large")));
        assert!(d.has_change("gw_size"));
    }

    #[test]
    fn zero_values_are_not_changes() {
        let mut d = MemoryResourceData::new();
        d.plan("insane_mode", json!(false));
        d.plan("subnet", json!(""));
        assert!(!d.has_change("insane_mode"));
        assert!(!d.has_change("subnet"));
        assert_eq!(d.get_ok("subnet"), None);
    }

    #[test]
    fn commit_clears_changes() {
        let mut d = MemoryResourceData::planned(json!({ "enable_bgp": true }));
        assert!(d.has_change("enable_bgp"));
        d.commit();
        assert!(!d.has_change("enable_bgp"));
        assert_eq!(d.get_ok("enable_bgp"), Some(json!(true)));
    }

    #[test]
    fn unset_removes_on_commit() {
        let mut d = MemoryResourceData::planned(json!({ "ha_subnet": "10.0.2.0/24" }));
        d.commit();
        d.unset("ha_subnet");
        assert!(d.has_change("ha_subnet"));
        d.commit();
        assert_eq!(d.get("ha_subnet"), Value::Null);
    }

    #[test]
    fn empty_id_marks_gone() {
        let mut d = MemoryResourceData::new();
        d.set_id("spoke-1");
        assert_eq!(d.id(), "spoke-1");
        d.set_id("");
        assert!(d.id().is_empty());
    }
}
