//! Typed log events accepted by the ingestion endpoint.
//!
//! These are only ever built from input that already passed the field
//! table in `schema.rs`. Numbers are kept as `serde_json::Number` so the
//! canonical form carries the caller's value unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Number;

/// One log event as delivered by an upstream log drain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub id: String,
    pub deployment_id: String,
    pub source: String,
    pub host: String,
    pub timestamp: Number,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ja3_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ja4_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyInfo>,
}

/// Edge proxy details attached to request-level events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyInfo {
    pub timestamp: Number,
    pub method: String,
    pub host: String,
    pub path: String,
    pub user_agent: Vec<String>,
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_byte_size: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_type_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vercel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vercel_cache: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_rule_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_optionals_are_omitted() {
        let event: LogEvent = serde_json::from_value(json!({
            "id": "1",
            "deploymentId": "d",
            "source": "s",
            "host": "h",
            "timestamp": 1700000000,
            "projectId": "p"
        }))
        .unwrap();

        let serialized = serde_json::to_value(&event).unwrap();
        let obj = serialized.as_object().unwrap();
        assert_eq!(obj.len(), 6);
        assert!(!obj.contains_key("level"));
        assert_eq!(obj["timestamp"], json!(1700000000));
    }

    #[test]
    fn test_wire_names() {
        let event: LogEvent = serde_json::from_value(json!({
            "id": "1",
            "deploymentId": "d",
            "source": "edge",
            "host": "h",
            "timestamp": 1,
            "projectId": "p",
            "type": "middleware-invocation",
            "ja3Digest": "abc",
            "proxy": {
                "timestamp": 2,
                "method": "GET",
                "host": "h",
                "path": "/",
                "userAgent": ["curl/8"],
                "region": "iad1",
                "responseByteSize": 512
            }
        }))
        .unwrap();

        assert_eq!(event.event_type.as_deref(), Some("middleware-invocation"));
        assert_eq!(event.ja3_digest.as_deref(), Some("abc"));
        let proxy = event.proxy.as_ref().unwrap();
        assert_eq!(proxy.user_agent, vec!["curl/8".to_string()]);
        assert_eq!(proxy.response_byte_size, Some(Number::from(512)));
    }
}
