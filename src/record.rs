//! The structured record built from one detail page, and its meta block.

use std::time::Instant;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const TYP_OSOBY_PRAVNICKA: &str = "pravnicka";
pub const TYP_OSOBY_FYZICKA: &str = "fyzicka";
pub const TYP_SUDU_OKRESNY: &str = "okresny";
pub const TYP_SUDU_MESTSKY: &str = "mestsky";

/// What one section routine produced for one block.
pub type Fragment = Map<String, Value>;

/// Accumulated extraction result; keys keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// Timing and host details supplied by the caller.
#[derive(Debug, Clone)]
pub struct MetaContext {
    pub started: Instant,
    pub server: String,
}

impl MetaContext {
    pub fn new(server: impl Into<String>) -> Self {
        MetaContext {
            started: Instant::now(),
            server: server.into(),
        }
    }
}

impl Default for MetaContext {
    fn default() -> Self {
        MetaContext::new("")
    }
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Merge a fragment: a later key replaces the earlier value whole.
    pub fn merge(mut self, fragment: Fragment) -> Self {
        self.0.extend(fragment);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Uppercase SHA-256 over the compact JSON form.
    pub fn signature(&self) -> String {
        let payload = serde_json::to_string(&self.0).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        format!("{:X}", hasher.finalize())
    }

    /// Prepend the meta block, signed over the record as it stands.
    pub fn finish(self, ctx: &MetaContext) -> Self {
        if self.0.contains_key("meta") {
            return self;
        }
        let meta = serde_json::json!({
            "api_version": API_VERSION,
            "sign": self.signature(),
            "server": ctx.server,
            "time": chrono::Local::now().format("%d.%m.%Y %H:%M:%S").to_string(),
            "sec": format!("{:.3}", ctx.started.elapsed().as_secs_f64()),
        });
        let mut out = Map::with_capacity(self.0.len() + 1);
        out.insert("meta".to_string(), meta);
        out.extend(self.0);
        Record(out)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Flatten into the fixed summary used for filling forms.
    pub fn summary(&self) -> Summary {
        let text = |key: &str| self.get_str(key).unwrap_or_default().to_string();
        let address = |key: &str| {
            self.get("adresa")
                .and_then(|a| a.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| text(key))
        };

        Summary {
            ico: text("ico"),
            obchodne_meno: text("obchodne_meno"),
            street: address("street"),
            number: address("number"),
            city: address("city"),
            zip: address("zip"),
            typ_osoby: text("typ_osoby"),
            hlavicka: text("hlavicka"),
            hlavicka_kratka: text("hlavicka_kratka"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub ico: String,
    pub obchodne_meno: String,
    pub street: String,
    pub number: String,
    pub city: String,
    pub zip: String,
    pub typ_osoby: String,
    pub hlavicka: String,
    pub hlavicka_kratka: String,
}

/// Build a fragment holding a single key.
pub fn fragment(key: &str, value: impl Into<Value>) -> Fragment {
    let mut map = Fragment::new();
    map.insert(key.to_string(), value.into());
    map
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn obj(v: Value) -> Fragment {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn later_fragment_overwrites() {
        let r = Record::new()
            .merge(fragment("ico", "1"))
            .merge(fragment("ico", "2"));
        assert_eq!(r.get_str("ico"), Some("2"));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn mappings_replaced_whole() {
        let r = Record::new()
            .merge(obj(json!({"adresa": {"street": "Hlavná", "zip": "82104", "district": "Staré Mesto"}})))
            .merge(obj(json!({"adresa": {"street": "Nová", "number": "5"}})));
        assert_eq!(r.get("adresa"), Some(&json!({"street": "Nová", "number": "5"})));
    }

    #[test]
    fn meta_is_first_and_signed_before_insert() {
        let r = Record::new().merge(fragment("obchodne_meno", "ACME s.r.o."));
        let sign = r.signature();
        let done = r.finish(&MetaContext::new("test"));
        assert_eq!(done.keys().next().map(String::as_str), Some("meta"));
        let meta = done.get("meta").unwrap();
        assert_eq!(meta["sign"], json!(sign));
        assert_eq!(meta["api_version"], json!(API_VERSION));
        assert_eq!(meta["server"], json!("test"));
        assert_eq!(sign.len(), 64);
        assert!(sign.chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn finish_twice_keeps_one_meta() {
        let ctx = MetaContext::default();
        let done = Record::new().finish(&ctx).finish(&ctx);
        assert_eq!(done.len(), 1);
    }

    #[test]
    fn summary_prefers_address_block() {
        let r = Record::new().merge(obj(json!({
            "ico": "36294268",
            "obchodne_meno": "MATADOR HOLDING, a.s.",
            "zip": "99999",
            "adresa": {"street": "Kamenná", "number": "1", "city": "Bratislava", "zip": ""}
        })));
        let s = r.summary();
        assert_eq!(s.street, "Kamenná");
        assert_eq!(s.zip, "99999");
        assert_eq!(s.typ_osoby, "");
    }
}
