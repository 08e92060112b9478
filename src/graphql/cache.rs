//! Cache rules for the partner API.
//!
//! Normalization itself is not done here: this module only holds the rule
//! table (how each type is keyed, which fields are relay-paginated) and the
//! relay merge used when several pages of a connection are fetched.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// How an object of a given type is identified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRule {
    /// Keyed by its `id` (or `_id`) field.
    Id,
    /// Keyed by the named field.
    Field(String),
    /// Never keyed; embedded in its parent.
    Embedded,
}

/// Which end of a connection incoming pages are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// Forward pagination: incoming edges go after the existing ones.
    Inwards,
    /// Backward pagination: incoming edges go before the existing ones.
    Outwards,
}

/// Relay-paginated fields of the partner schema, by parent type.
const PARTNER_PAGINATED: &[(&str, &[&str])] = &[
    ("Query", &["accounts", "accountMemberships", "cards"]),
    ("AccountMembership", &["cards"]),
    (
        "Account",
        &[
            "invoices",
            "memberships",
            "statements",
            "transactions",
            "virtualIbanEntries",
        ],
    ),
    ("Card", &["transactions"]),
    ("StandingOrder", &["payments"]),
    ("User", &["accountMemberships"]),
];

#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    keys: HashMap<String, KeyRule>,
    pagination: HashMap<String, HashMap<String, MergeMode>>,
}

impl CacheConfig {
    /// Rules for the partner API, given the schema's id-less object types.
    pub fn partner<I, S>(idless_objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();

        for typename in idless_objects {
            config.keys.insert(typename.into(), KeyRule::Embedded);
        }
        config
            .keys
            .insert("ValidIban".to_string(), KeyRule::Field("iban".to_string()));

        for (typename, fields) in PARTNER_PAGINATED {
            for field in *fields {
                config.paginate(typename, field, MergeMode::Inwards);
            }
        }

        config
    }

    /// Reads id-less object type names from a JSON array file.
    pub fn load_idless_objects(path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn paginate(&mut self, typename: &str, field: &str, mode: MergeMode) {
        self.pagination
            .entry(typename.to_string())
            .or_default()
            .insert(field.to_string(), mode);
    }

    pub fn key_rule(&self, typename: &str) -> &KeyRule {
        self.keys.get(typename).unwrap_or(&KeyRule::Id)
    }

    /// Cache key of an object, such as `Account:42`.
    ///
    /// Objects without `__typename`, embedded types, and objects missing
    /// their key field have no key.
    pub fn key_of(&self, object: &Value) -> Option<String> {
        let typename = object.get("__typename")?.as_str()?;
        let id = match self.key_rule(typename) {
            KeyRule::Id => scalar(object.get("id").or_else(|| object.get("_id"))?)?,
            KeyRule::Field(field) => scalar(object.get(field)?)?,
            KeyRule::Embedded => return None,
        };
        Some(format!("{}:{}", typename, id))
    }

    pub fn pagination(&self, typename: &str, field: &str) -> Option<MergeMode> {
        self.pagination.get(typename)?.get(field).copied()
    }

    /// Merges an incoming page of a relay connection into the existing one.
    ///
    /// Edges whose node is already present are dropped from the incoming
    /// page; nodes without a key are always kept.
    pub fn merge_connection(&self, mode: MergeMode, existing: &Value, incoming: &Value) -> Value {
        let mut merged = match incoming {
            Value::Object(map) => map.clone(),
            _ => return existing.clone(),
        };
        let Value::Object(existing_map) = existing else {
            return incoming.clone();
        };

        for list in ["edges", "nodes"] {
            let (Some(Value::Array(old)), Some(Value::Array(new))) =
                (existing_map.get(list), merged.get(list))
            else {
                continue;
            };
            let combined = match mode {
                MergeMode::Inwards => self.concat_unique(old, new),
                MergeMode::Outwards => self.concat_unique(new, old),
            };
            merged.insert(list.to_string(), Value::Array(combined));
        }

        if let Some(page_info) = merge_page_info(mode, existing_map, &merged) {
            merged.insert("pageInfo".to_string(), page_info);
        }

        Value::Object(merged)
    }

    fn concat_unique(&self, first: &[Value], second: &[Value]) -> Vec<Value> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::with_capacity(first.len() + second.len());

        for item in first.iter().chain(second) {
            let node = item.get("node").unwrap_or(item);
            if let Some(key) = self.key_of(node) {
                if !seen.insert(key) {
                    continue;
                }
            }
            out.push(item.clone());
        }

        out
    }
}

fn merge_page_info(
    mode: MergeMode,
    existing: &Map<String, Value>,
    incoming: &Map<String, Value>,
) -> Option<Value> {
    let old = existing.get("pageInfo")?.as_object()?;
    let mut page_info = incoming.get("pageInfo")?.as_object()?.clone();

    // The end we did not fetch keeps the existing cursor.
    let kept: &[&str] = match mode {
        MergeMode::Inwards => &["hasPreviousPage", "startCursor"],
        MergeMode::Outwards => &["hasNextPage", "endCursor"],
    };
    for field in kept {
        if let Some(value) = old.get(*field) {
            page_info.insert(field.to_string(), value.clone());
        }
    }

    Some(Value::Object(page_info))
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn config() -> CacheConfig {
        CacheConfig::partner(["Amount", "Address"])
    }

    #[test]
    fn test_key_rules() {
        let config = config();

        assert_eq!(
            config.key_of(&json!({ "__typename": "Account", "id": "acc_1" })),
            Some("Account:acc_1".to_string())
        );
        assert_eq!(
            config.key_of(&json!({ "__typename": "Card", "_id": 7 })),
            Some("Card:7".to_string())
        );
        assert_eq!(
            config.key_of(&json!({ "__typename": "ValidIban", "iban": "FR7630006000011234567890189" })),
            Some("ValidIban:FR7630006000011234567890189".to_string())
        );
        assert_eq!(config.key_of(&json!({ "__typename": "ValidIban", "iban": null })), None);
        assert_eq!(config.key_of(&json!({ "__typename": "Amount", "value": "1.00" })), None);
        assert_eq!(config.key_of(&json!({ "id": "no-typename" })), None);
    }

    #[test]
    fn test_partner_pagination_fields() {
        let config = config();

        assert_eq!(config.pagination("Query", "accounts"), Some(MergeMode::Inwards));
        assert_eq!(config.pagination("Account", "virtualIbanEntries"), Some(MergeMode::Inwards));
        assert_eq!(config.pagination("StandingOrder", "payments"), Some(MergeMode::Inwards));
        assert_eq!(config.pagination("User", "accountMemberships"), Some(MergeMode::Inwards));
        assert_eq!(config.pagination("Account", "standingOrders"), None);
        assert_eq!(config.pagination("Unknown", "cards"), None);
    }

    #[test]
    fn test_merge_inwards() {
        let config = config();
        let existing = json!({
            "totalCount": 3,
            "pageInfo": { "hasPreviousPage": false, "startCursor": "a", "hasNextPage": true, "endCursor": "b" },
            "edges": [
                { "cursor": "a", "node": { "__typename": "Card", "id": "1" } },
                { "cursor": "b", "node": { "__typename": "Card", "id": "2" } }
            ]
        });
        let incoming = json!({
            "totalCount": 4,
            "pageInfo": { "hasPreviousPage": true, "startCursor": "b", "hasNextPage": false, "endCursor": "d" },
            "edges": [
                { "cursor": "b", "node": { "__typename": "Card", "id": "2" } },
                { "cursor": "c", "node": { "__typename": "Card", "id": "3" } },
                { "cursor": "d", "node": { "__typename": "Card", "id": "4" } }
            ]
        });

        let merged = config.merge_connection(MergeMode::Inwards, &existing, &incoming);

        let cursors: Vec<_> = merged["edges"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["cursor"].as_str().unwrap())
            .collect();
        assert_eq!(cursors, vec!["a", "b", "c", "d"]);
        assert_eq!(merged["totalCount"], 4);
        assert_eq!(merged["pageInfo"]["hasPreviousPage"], false);
        assert_eq!(merged["pageInfo"]["startCursor"], "a");
        assert_eq!(merged["pageInfo"]["hasNextPage"], false);
        assert_eq!(merged["pageInfo"]["endCursor"], "d");
    }

    #[test]
    fn test_merge_outwards_prepends() {
        let config = config();
        let existing = json!({
            "pageInfo": { "hasPreviousPage": true, "startCursor": "c", "hasNextPage": false, "endCursor": "d" },
            "nodes": [{ "__typename": "Invoice", "id": "3" }]
        });
        let incoming = json!({
            "pageInfo": { "hasPreviousPage": false, "startCursor": "a", "hasNextPage": true, "endCursor": "b" },
            "nodes": [{ "__typename": "Invoice", "id": "1" }]
        });

        let merged = config.merge_connection(MergeMode::Outwards, &existing, &incoming);

        assert_eq!(merged["nodes"][0]["id"], "1");
        assert_eq!(merged["nodes"][1]["id"], "3");
        assert_eq!(merged["pageInfo"]["startCursor"], "a");
        assert_eq!(merged["pageInfo"]["endCursor"], "d");
        assert_eq!(merged["pageInfo"]["hasNextPage"], false);
    }

    #[test]
    fn test_merge_keeps_unkeyed_nodes() {
        let config = config();
        let existing = json!({ "edges": [{ "node": { "__typename": "Amount", "value": "1" } }] });
        let incoming = json!({ "edges": [{ "node": { "__typename": "Amount", "value": "1" } }] });

        let merged = config.merge_connection(MergeMode::Inwards, &existing, &incoming);
        assert_eq!(merged["edges"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_load_idless_objects() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("partner-idless-objects.json");
        fs::write(&path, r#"["Amount", "Address", "AccountMembershipRestrictedTo"]"#).unwrap();

        let idless = CacheConfig::load_idless_objects(&path).unwrap();
        let config = CacheConfig::partner(idless);

        assert_eq!(config.key_rule("AccountMembershipRestrictedTo"), &KeyRule::Embedded);
        assert_eq!(config.key_rule("Account"), &KeyRule::Id);
    }
}
