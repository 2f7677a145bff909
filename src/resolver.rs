use std::collections::BTreeSet;

use crate::catalog::CatalogLookup;
use crate::error::Result;
use crate::model::{EdgeMode, ForeignKeyEdge, FullTables};

/// The two edge sets produced by resolving a root table.
#[derive(Debug, Default, Clone)]
pub struct ResolvedEdges {
    pub outbound_non_recursive: Vec<ForeignKeyEdge>,
    pub outbound_recursive: Vec<ForeignKeyEdge>,
}

/// Given `(root_table, full_tables)`, computes the outgoing foreign-key
/// edges partitioned into non-recursive and recursive. Does not
/// transitively expand; that is the Query Planner's job, reached by
/// repeated invocation of this resolver.
pub async fn resolve<C: CatalogLookup>(
    catalog: &C,
    root_table: &str,
    full_tables: &FullTables,
) -> Result<ResolvedEdges> {
    let non_recursive = catalog
        .foreign_keys_of(root_table, EdgeMode::NonRecursive, full_tables)
        .await?;
    let recursive = catalog
        .foreign_keys_of(root_table, EdgeMode::Recursive, full_tables)
        .await?;

    Ok(ResolvedEdges {
        outbound_non_recursive: coalesce(non_recursive),
        outbound_recursive: coalesce(recursive),
    })
}

/// Coalesces duplicate edges identified by `(from_column, to_table,
/// to_column)`: the same constraint can otherwise be reported more than
/// once by metadata (e.g. composite-key constraints spanning one column
/// here, or driver duplication).
fn coalesce(edges: Vec<ForeignKeyEdge>) -> Vec<ForeignKeyEdge> {
    let mut seen: BTreeSet<(String, String, String)> = BTreeSet::new();
    let mut out = Vec::with_capacity(edges.len());
    for edge in edges {
        let key = (
            edge.from_column.clone(),
            edge.to_table.clone(),
            edge.to_column.clone(),
        );
        if seen.insert(key) {
            out.push(edge);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from_col: &str, to_table: &str, to_col: &str, constraint: &str) -> ForeignKeyEdge {
        ForeignKeyEdge {
            from_table: "employees".to_string(),
            from_column: from_col.to_string(),
            to_table: to_table.to_string(),
            to_column: to_col.to_string(),
            constraint_name: constraint.to_string(),
        }
    }

    #[test]
    fn coalesce_drops_duplicate_constraints() {
        let edges = vec![
            edge("manager_id", "employees", "id", "fk_manager"),
            edge("manager_id", "employees", "id", "fk_manager_dup"),
            edge("referrer_id", "employees", "id", "fk_referrer"),
        ];
        let result = coalesce(edges);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].constraint_name, "fk_manager");
        assert_eq!(result[1].constraint_name, "fk_referrer");
    }

    #[test]
    fn is_recursive_detects_self_reference() {
        let e = edge("manager_id", "employees", "id", "fk_manager");
        assert!(e.is_recursive());

        let mut other = edge("group_id", "groups", "id", "fk_group");
        other.from_table = "employees".to_string();
        assert!(!other.is_recursive());
    }
}
