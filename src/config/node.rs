use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A free-form config value used for file declarations.
///
/// Sections such as `input_files` nest strings inside arbitrary maps and
/// lists; every string leaf is treated as a declared path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigNode {
    Text(String),
    Sequence(Vec<ConfigNode>),
    Mapping(BTreeMap<String, ConfigNode>),
    Other(serde_json::Value),
}

impl ConfigNode {
    /// Look up a key on a mapping node
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        match self {
            ConfigNode::Mapping(map) => map.get(key),
            _ => None,
        }
    }

    /// Follow a chain of mapping keys
    pub fn lookup(&self, keys: &[&str]) -> Option<&ConfigNode> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    /// The trimmed string value of a text node, if non-empty
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigNode::Text(value) => {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }

    /// Direct children of a mapping node in key order
    pub fn entries(&self) -> Vec<(&str, &ConfigNode)> {
        match self {
            ConfigNode::Mapping(map) => map.iter().map(|(k, v)| (k.as_str(), v)).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the node carries nothing worth scanning
    pub fn is_empty(&self) -> bool {
        match self {
            ConfigNode::Text(value) => value.trim().is_empty(),
            ConfigNode::Sequence(items) => items.is_empty(),
            ConfigNode::Mapping(map) => map.is_empty(),
            ConfigNode::Other(value) => value.is_null(),
        }
    }

    /// Collect every non-empty string leaf, depth first
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        self.collect_paths(&mut paths);
        paths
    }

    fn collect_paths(&self, paths: &mut Vec<String>) {
        match self {
            ConfigNode::Text(value) => {
                let cleaned = value.trim();
                if !cleaned.is_empty() {
                    paths.push(cleaned.to_string());
                }
            }
            ConfigNode::Mapping(map) => {
                for nested in map.values() {
                    nested.collect_paths(paths);
                }
            }
            ConfigNode::Sequence(items) => {
                for item in items {
                    item.collect_paths(paths);
                }
            }
            ConfigNode::Other(_) => {}
        }
    }
}

impl From<&str> for ConfigNode {
    fn from(value: &str) -> Self {
        ConfigNode::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> ConfigNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_untagged_variants() {
        assert_eq!(node(json!("a.csv")), ConfigNode::Text("a.csv".to_string()));
        assert!(matches!(node(json!(["a.csv"])), ConfigNode::Sequence(_)));
        assert!(matches!(node(json!({"k": "a.csv"})), ConfigNode::Mapping(_)));
        assert!(matches!(node(json!(3)), ConfigNode::Other(_)));
        assert!(matches!(node(json!(null)), ConfigNode::Other(_)));
    }

    #[test]
    fn test_file_paths_recurses_through_maps_and_lists() {
        let tree = node(json!({
            "a": " data/bva/one.csv ",
            "b": ["data/two.csv", {"c": "three.json", "d": ""}],
            "e": {"f": {"g": "four.csv"}, "enabled": true},
        }));

        assert_eq!(
            tree.file_paths(),
            vec!["data/bva/one.csv", "data/two.csv", "three.json", "four.csv"]
        );
    }

    #[test]
    fn test_lookup_and_as_str() {
        let tree = node(json!({"processed_scans": {"this_year": "scan_this.csv", "blank": "  "}}));

        assert_eq!(
            tree.lookup(&["processed_scans", "this_year"]).and_then(ConfigNode::as_str),
            Some("scan_this.csv")
        );
        assert_eq!(
            tree.lookup(&["processed_scans", "blank"]).and_then(ConfigNode::as_str),
            None
        );
        assert!(tree.lookup(&["missing", "this_year"]).is_none());
    }

    #[test]
    fn test_is_empty() {
        assert!(node(json!("")).is_empty());
        assert!(node(json!({})).is_empty());
        assert!(node(json!(null)).is_empty());
        assert!(!node(json!(["x"])).is_empty());
    }
}
