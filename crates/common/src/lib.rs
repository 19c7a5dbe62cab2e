//! Shared helpers for the metrics admin binaries: logging setup, runtime
//! directory checks and small wire types.

pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::types::{Ack, Health};

    #[test]
    fn wire_types_serialize_flat() {
        let health = serde_json::to_value(Health { status: "ok" }).unwrap();
        assert_eq!(health, serde_json::json!({"status": "ok"}));

        let ack: Ack = serde_json::from_str(r#"{"ok":false}"#).unwrap();
        assert!(!ack.ok);
        assert_eq!(serde_json::to_string(&Ack { ok: true }).unwrap(), r#"{"ok":true}"#);
    }
}
