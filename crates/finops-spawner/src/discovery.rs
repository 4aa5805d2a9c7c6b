//! Resources observed in cost data, accumulated across cycles.

use finops_table::Records;
use tracing::info;

use crate::chain::ReferenceChain;

pub const RESOURCE_ID_COLUMN: &str = "ResourceId";
pub const RESOURCE_TYPE_COLUMN: &str = "ResourceType";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredResource {
    pub resource_id: String,
    pub resource_type: String,
}

/// Append-only, insertion-ordered set keyed case-insensitively on
/// resource id. A resource's position is its stable child index.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredResources {
    items: Vec<DiscoveredResource>,
}

impl DiscoveredResources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource unless its id is already known. Returns whether it
    /// was added.
    pub fn insert(&mut self, resource: DiscoveredResource) -> bool {
        if resource.resource_id.is_empty() || self.contains(&resource.resource_id) {
            return false;
        }
        self.items.push(resource);
        true
    }

    pub fn contains(&self, resource_id: &str) -> bool {
        self.items
            .iter()
            .any(|r| r.resource_id.eq_ignore_ascii_case(resource_id))
    }

    /// Scan `records` for rows whose resource type the chain covers.
    /// Returns how many resources were new.
    pub fn observe(&mut self, records: &Records, chain: &ReferenceChain) -> usize {
        let (Some(id_idx), Some(type_idx)) = (
            records.index_of(RESOURCE_ID_COLUMN),
            records.index_of(RESOURCE_TYPE_COLUMN),
        ) else {
            return 0;
        };

        let mut added = 0;
        for row in records.rows() {
            let (Some(id), Some(kind)) = (row.get(id_idx), row.get(type_idx)) else {
                continue;
            };
            if !chain.covers(kind) {
                continue;
            }
            let resource = DiscoveredResource {
                resource_id: id.clone(),
                resource_type: kind.clone(),
            };
            if self.insert(resource) {
                info!(resource_id = %id, resource_type = %kind, index = self.items.len() - 1, "resource discovered");
                added += 1;
            }
        }
        added
    }

    pub fn iter(&self) -> impl Iterator<Item = &DiscoveredResource> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ResourceMetrics;

    fn chain(focus: &[&str]) -> ReferenceChain {
        ReferenceChain {
            resources: focus
                .iter()
                .map(|f| ResourceMetrics {
                    focus_name: f.to_string(),
                    metrics: Vec::new(),
                })
                .collect(),
        }
    }

    fn records(rows: &[[&str; 3]]) -> Records {
        Records::new(
            vec!["BilledCost".into(), "ResourceType".into(), "ResourceId".into()],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn observes_matching_types_only() {
        let mut found = DiscoveredResources::new();
        let added = found.observe(
            &records(&[
                ["1", "Virtual machine", "vm-1"],
                ["2", "Disk", "disk-1"],
                ["3", "virtual MACHINE", "vm-2"],
            ]),
            &chain(&["Virtual machine"]),
        );
        assert_eq!(added, 2);
        let ids: Vec<&str> = found.iter().map(|r| r.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["vm-1", "vm-2"]);
    }

    #[test]
    fn dedup_is_case_insensitive_and_order_stable() {
        let mut found = DiscoveredResources::new();
        let chain = chain(&["Virtual machine"]);
        found.observe(&records(&[["1", "Virtual machine", "VM-1"]]), &chain);
        let added = found.observe(
            &records(&[
                ["1", "Virtual machine", "vm-1"],
                ["1", "Virtual machine", "vm-0"],
            ]),
            &chain,
        );
        assert_eq!(added, 1);
        let ids: Vec<&str> = found.iter().map(|r| r.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["VM-1", "vm-0"]);
    }

    #[test]
    fn empty_ids_ignored() {
        let mut found = DiscoveredResources::new();
        let added = found.observe(&records(&[["1", "Virtual machine", ""]]), &chain(&["Virtual machine"]));
        assert_eq!(added, 0);
        assert!(found.is_empty());
    }

    #[test]
    fn missing_columns_discover_nothing() {
        let mut found = DiscoveredResources::new();
        let records = Records::new(
            vec!["BilledCost".into(), "ResourceId".into()],
            vec![vec!["1".into(), "vm-1".into()]],
        );
        assert_eq!(found.observe(&records, &chain(&["Virtual machine"])), 0);
    }
}
