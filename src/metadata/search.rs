//! Catalog search scoring
//!
//! Scores are additive over case-insensitive substring matches:
//!
//! | field | weight |
//! |---|---|
//! | name | 10 |
//! | description | 5 |
//! | any tag | 3 |
//! | any attribute value | 2 |
//! | system | 1 |

use serde::{Deserialize, Serialize};

use super::{DataResource, ResourceType};

const NAME_WEIGHT: f64 = 10.0;
const DESCRIPTION_WEIGHT: f64 = 5.0;
const TAG_WEIGHT: f64 = 3.0;
const ATTRIBUTE_WEIGHT: f64 = 2.0;
const SYSTEM_WEIGHT: f64 = 1.0;

const SNIPPET_CHARS: usize = 200;

/// Exact-match filters applied before scoring
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, rename = "type")]
    pub resource_type: Option<ResourceType>,
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    /// Resource must carry this tag
    #[serde(default)]
    pub tag: Option<String>,
}

impl SearchFilters {
    pub fn matches(&self, resource: &DataResource) -> bool {
        self.resource_type.map_or(true, |t| resource.resource_type == t)
            && self.system.as_ref().map_or(true, |s| &resource.system == s)
            && self
                .owner
                .as_ref()
                .map_or(true, |o| resource.owner.as_ref() == Some(o))
            && self.tag.as_ref().map_or(true, |t| resource.tags.contains(t))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub resource: DataResource,
    pub score: f64,
    pub matching_fields: Vec<String>,
    pub snippet: String,
}

/// Score one resource, returning the score and the fields that matched
pub fn score(resource: &DataResource, query: &str) -> (f64, Vec<String>) {
    let query = query.to_lowercase();
    let hit = |text: &str| text.to_lowercase().contains(&query);

    let mut score = 0.0;
    let mut fields = Vec::new();

    if hit(&resource.name) {
        score += NAME_WEIGHT;
        fields.push("name".to_string());
    }
    if resource.description.as_deref().is_some_and(hit) {
        score += DESCRIPTION_WEIGHT;
        fields.push("description".to_string());
    }
    if resource.tags.iter().any(|t| hit(t)) {
        score += TAG_WEIGHT;
        fields.push("tags".to_string());
    }
    if let Some((key, _)) = resource.metadata.iter().find(|(_, attr)| hit(&attr.value_text())) {
        score += ATTRIBUTE_WEIGHT;
        fields.push(format!("metadata.{key}"));
    }
    if hit(&resource.system) {
        score += SYSTEM_WEIGHT;
        fields.push("system".to_string());
    }

    (score, fields)
}

pub fn snippet(resource: &DataResource) -> String {
    match resource.description.as_deref() {
        Some(description) if description.chars().count() > SNIPPET_CHARS => {
            let truncated: String = description.chars().take(SNIPPET_CHARS).collect();
            format!("{truncated}...")
        }
        Some(description) => description.to_string(),
        None => format!("{} in {}", resource.resource_type, resource.system),
    }
}

/// Filter, score and rank resources; zero scores are dropped
pub fn rank(
    resources: impl IntoIterator<Item = DataResource>,
    query: &str,
    filters: &SearchFilters,
    limit: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = resources
        .into_iter()
        .filter(|r| filters.matches(r))
        .filter_map(|resource| {
            let (score, matching_fields) = score(&resource, query);
            (score > 0.0).then(|| SearchResult {
                snippet: snippet(&resource),
                resource,
                score,
                matching_fields,
            })
        })
        .collect();

    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataAttribute;

    fn resource(name: &str, description: Option<&str>, tags: &[&str]) -> DataResource {
        let mut r = DataResource::new(name, ResourceType::Table, "warehouse");
        r.description = description.map(str::to_string);
        r.tags = tags.iter().map(|t| t.to_string()).collect();
        r
    }

    #[test]
    fn test_name_and_description_outrank_tag() {
        let both = resource("user_orders", Some("Customer order history"), &[]);
        let tagged = resource("shipments", None, &["order"]);

        let (s1, f1) = score(&both, "order");
        let (s2, f2) = score(&tagged, "order");
        assert_eq!(s1, 15.0);
        assert_eq!(f1, vec!["name", "description"]);
        assert_eq!(s2, 3.0);
        assert_eq!(f2, vec!["tags"]);

        let ranked = rank(vec![tagged, both], "ORDER", &SearchFilters::default(), 10);
        assert_eq!(ranked[0].resource.name, "user_orders");
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_attribute_and_system_matches() {
        let mut r = resource("t", None, &[]);
        r.metadata
            .insert("owner_team".to_string(), MetadataAttribute::new("owner_team", "payments"));
        let (s, fields) = score(&r, "pay");
        assert_eq!(s, 2.0);
        assert_eq!(fields, vec!["metadata.owner_team"]);

        let (s, _) = score(&r, "house");
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_filters_exclude_before_scoring() {
        let mut owned = resource("orders", None, &["finance"]);
        owned.owner = Some("ana".to_string());
        let other = resource("orders_archive", None, &[]);

        let filters = SearchFilters {
            owner: Some("ana".to_string()),
            ..Default::default()
        };
        let ranked = rank(vec![owned.clone(), other.clone()], "orders", &filters, 10);
        assert_eq!(ranked.len(), 1);

        let filters = SearchFilters {
            tag: Some("finance".to_string()),
            resource_type: Some(ResourceType::View),
            ..Default::default()
        };
        assert!(rank(vec![owned, other], "orders", &filters, 10).is_empty());
    }

    #[test]
    fn test_zero_scores_and_limit() {
        let resources = vec![
            resource("a_orders", None, &[]),
            resource("b_orders", None, &[]),
            resource("c", None, &[]),
        ];
        let ranked = rank(resources, "orders", &SearchFilters::default(), 1);
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_snippet() {
        let long = "x".repeat(250);
        let r = resource("t", Some(&long), &[]);
        let s = snippet(&r);
        assert_eq!(s.len(), 203);
        assert!(s.ends_with("..."));

        assert_eq!(snippet(&resource("t", None, &[])), "table in warehouse");
        assert_eq!(snippet(&resource("t", Some("short"), &[])), "short");
    }
}
