use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::CatalogLookup;
use crate::error::Result;
use crate::model::{ForeignKeyEdge, FullTables, PartialSpec, TableId};
use crate::resolver::resolve;

/// One target's fully-planned selection, ready to be executed and archived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTarget {
    pub table: TableId,
    pub sql: String,
}

/// Produces, for a set of partial roots (plus full tables treated as
/// trivially-all-rows, traversal-only roots), the ordered sequence of
/// `(target_table, selection_sql)` pairs to execute and archive in addition
/// to the roots themselves.
///
/// `roots` are the explicit partial-spec entries in caller order; their own
/// archive entries are included in the returned plan (coalesced with any
/// relation-target contributions reaching the same table, per multi-root
/// coalescing). Full tables never appear as plan targets but do act as
/// traversal sources.
///
/// A table can receive contributions from more than one root or edge, and
/// those contributions can arrive after the table has already been
/// expanded once (e.g. a later root's table is only reachable through an
/// earlier root's own relation closure). The worklist re-enqueues a table
/// whenever its accumulator grows past the count it was last expanded
/// with, so every contribution gets its own downstream closure — not just
/// the first one to arrive.
pub async fn plan<C: CatalogLookup>(
    catalog: &C,
    roots: &PartialSpec,
    full_table_roots: &[TableId],
    full_tables: &FullTables,
) -> Result<Vec<PlannedTarget>> {
    let mut order: Vec<TableId> = Vec::new();
    let mut accumulator: Vec<(TableId, Vec<String>)> = Vec::new();
    let mut full_table_sql: Vec<(TableId, String)> = Vec::new();
    let mut queue: VecDeque<TableId> = VecDeque::new();
    let mut queued: HashSet<TableId> = HashSet::new();
    let mut expanded_through: HashMap<TableId, usize> = HashMap::new();

    for (table, sql) in roots {
        push_contribution(&mut accumulator, &mut order, &mut queue, &mut queued, table, sql.clone());
    }
    for table in full_table_roots {
        full_table_sql.push((table.clone(), format!("SELECT * FROM {table}")));
        if queued.insert(table.clone()) {
            queue.push_back(table.clone());
        }
    }

    while let Some(table) = queue.pop_front() {
        queued.remove(&table);
        let is_full = crate::model::contains(full_tables, &table);

        if !is_full {
            let pending = lookup_many(&accumulator, &table).len();
            if expanded_through.get(&table).copied().unwrap_or(0) >= pending {
                continue;
            }
        }

        let base = if is_full {
            lookup(&full_table_sql, &table)
                .expect("full table root must be seeded")
                .to_string()
        } else {
            union_of(lookup_many(&accumulator, &table))
        };

        let resolved = resolve(catalog, &table, full_tables).await?;

        let enriched = if is_full || resolved.outbound_recursive.is_empty() {
            base
        } else {
            let mut closures = Vec::with_capacity(resolved.outbound_recursive.len());
            for edge in &resolved.outbound_recursive {
                let cte = build_recursive_cte(edge, &base);
                push_contribution(&mut accumulator, &mut order, &mut queue, &mut queued, &table, cte.clone());
                closures.push(cte);
            }
            union_of(closures.iter().map(String::as_str).collect())
        };

        if !is_full {
            expanded_through.insert(table.clone(), lookup_many(&accumulator, &table).len());
        }

        for edge in &resolved.outbound_non_recursive {
            let flat = build_flat_query(edge, &enriched);
            push_contribution(&mut accumulator, &mut order, &mut queue, &mut queued, &edge.to_table, flat);
        }
    }

    Ok(order
        .into_iter()
        .map(|table| {
            let selections = lookup_many(&accumulator, &table);
            let sql = union_of(selections);
            PlannedTarget { table, sql }
        })
        .collect())
}

/// Appends `sql` to `table`'s accumulated contributions and re-queues the
/// table so the new contribution gets its own downstream expansion.
fn push_contribution(
    accumulator: &mut Vec<(TableId, Vec<String>)>,
    order: &mut Vec<TableId>,
    queue: &mut VecDeque<TableId>,
    queued: &mut HashSet<TableId>,
    table: &str,
    sql: String,
) {
    if let Some((_, entries)) = accumulator.iter_mut().find(|(t, _)| t == table) {
        entries.push(sql);
    } else {
        accumulator.push((table.to_string(), vec![sql]));
        order.push(table.to_string());
    }
    if queued.insert(table.to_string()) {
        queue.push_back(table.to_string());
    }
}

fn lookup<'a>(table_sql: &'a [(TableId, String)], table: &str) -> Option<&'a str> {
    table_sql
        .iter()
        .find(|(t, _)| t == table)
        .map(|(_, s)| s.as_str())
}

fn lookup_many<'a>(accumulator: &'a [(TableId, Vec<String>)], table: &str) -> Vec<&'a str> {
    accumulator
        .iter()
        .find(|(t, _)| t == table)
        .map(|(_, entries)| entries.iter().map(String::as_str).collect())
        .unwrap_or_default()
}

/// `UNION` (not `UNION ALL`) over the contributing selections, giving
/// row-level de-duplication for free.
fn union_of(selections: Vec<&str>) -> String {
    match selections.len() {
        0 => String::new(),
        1 => selections[0].to_string(),
        _ => selections
            .into_iter()
            .map(|s| format!("({s})"))
            .collect::<Vec<_>>()
            .join("\nUNION\n"),
    }
}

/// Non-recursive expansion: wraps `source_sql` as a subquery so arbitrary
/// user SQL (including LIMIT/ORDER BY) is honored.
fn build_flat_query(edge: &ForeignKeyEdge, source_sql: &str) -> String {
    format!(
        "SELECT * FROM {target} WHERE {tcol} IN\n  (SELECT DISTINCT {col} FROM ({source_sql}) _src WHERE {col} IS NOT NULL)",
        target = edge.to_table,
        tcol = edge.to_column,
        col = edge.from_column,
    )
}

/// Recursive expansion for a self-referencing edge: a single alias (`t`)
/// names the self-joined table throughout, rather than switching aliases
/// between the base case and the join.
fn build_recursive_cte(edge: &ForeignKeyEdge, base_selection: &str) -> String {
    format!(
        "WITH RECURSIVE base AS ({base_selection}),\n     closure AS (\n       SELECT * FROM base\n       UNION\n       SELECT t.* FROM {target} t\n         INNER JOIN closure ON closure.{col} = t.{tcol}\n     )\nSELECT * FROM closure",
        target = edge.to_table,
        col = edge.from_column,
        tcol = edge.to_column,
    )
}
