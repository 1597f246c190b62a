#![forbid(unsafe_code)]

mod deferred;
mod row;
mod select;

use super::stories::{ensure_branch_in_story_tx, ensure_story_tx, insert_branch_tx};
use super::*;
use rusqlite::TransactionBehavior;
use select::Selection;
use sf_core::{
    CloneConfig, ForkScope, ID_FIELD, IdMaps, STORY_FIELD, SchemaRegistry, SqlFilter, quote_ident,
};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use std::time::{Duration, Instant};

impl SqliteStore {
    /// Clones the qualifying rows of a story into a new branch.
    ///
    /// Runs in one `BEGIN IMMEDIATE` transaction: forks on the same database
    /// are serialized, and any error leaves no row of the new branch behind.
    pub fn fork(
        &mut self,
        registry: &SchemaRegistry,
        request: ForkRequest,
    ) -> Result<ForkOutcome, StoreError> {
        let result = self.fork_tx(registry, &request);
        match &result {
            Ok(outcome) => tracing::info!(
                story_id = request.source_story_id,
                source_branch_id = ?request.source_branch_id,
                cutoff = request.fork_cutoff,
                branch_id = outcome.branch_id,
                rows = outcome.rows_cloned.values().sum::<usize>(),
                deferred_nulled = outcome.deferred_nulled,
                elapsed_ms = outcome.elapsed_ms,
                "story forked"
            ),
            Err(err) => tracing::warn!(
                story_id = request.source_story_id,
                source_branch_id = ?request.source_branch_id,
                cutoff = request.fork_cutoff,
                table = ?err.table(),
                error = %err,
                "fork rolled back"
            ),
        }
        result
    }

    fn fork_tx(
        &mut self,
        registry: &SchemaRegistry,
        request: &ForkRequest,
    ) -> Result<ForkOutcome, StoreError> {
        let label = request.target_branch_label.trim();
        if label.is_empty() {
            return Err(StoreError::InvalidInput(
                "target branch label must not be empty",
            ));
        }
        let issues = registry.plan_issues();
        if !issues.is_empty() {
            return Err(StoreError::InvalidRegistry(
                issues.iter().map(ToString::to_string).collect(),
            ));
        }

        let started = Instant::now();
        let settings = self.settings.clone();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        ensure_story_tx(&tx, request.source_story_id)?;
        if let Some(source_branch_id) = request.source_branch_id {
            ensure_branch_in_story_tx(&tx, request.source_story_id, source_branch_id)?;
        }
        let branch_id = insert_branch_tx(
            &tx,
            request.source_story_id,
            label,
            request.source_branch_id,
            request.fork_cutoff,
        )?;

        let scope = ForkScope {
            story_id: request.source_story_id,
            source_branch_id: request.source_branch_id,
            cutoff: request.fork_cutoff,
        };
        let mut run = ForkRun::prepare(&tx, registry, &settings, scope, branch_id, started)?;
        run.clone_tables()?;
        let stats = run.deferred_pass()?;
        let outcome = run.finish(request, stats);

        tx.commit()?;
        Ok(outcome)
    }
}

struct TablePlan {
    schema: TableSchema,
    /// Highest id present before the fork started; rows above it are clones.
    ceiling: i64,
}

#[derive(Clone, Copy)]
struct ParentLink<'a> {
    field: &'a str,
    new_id: i64,
}

/// A reference on an inserted clone that is rewritten after more rows exist.
struct PendingRef {
    table: String,
    source_id: i64,
    new_id: i64,
    field: String,
    target: String,
    old_value: i64,
    not_null: bool,
}

#[derive(Default)]
struct DeferredStats {
    resolved: usize,
    nulled: usize,
}

struct ForkRun<'a> {
    conn: &'a Connection,
    registry: &'a SchemaRegistry,
    scope: ForkScope,
    branch_id: i64,
    branch_column: &'a str,
    page_size: usize,
    started: Instant,
    deadline: Option<Duration>,
    order: Vec<String>,
    nested: BTreeSet<String>,
    tables: BTreeMap<String, Rc<TablePlan>>,
    id_maps: IdMaps,
    self_refs: Vec<PendingRef>,
    deferred: Vec<PendingRef>,
    rows_cloned: BTreeMap<String, usize>,
}

impl<'a> ForkRun<'a> {
    fn prepare(
        conn: &'a Connection,
        registry: &'a SchemaRegistry,
        settings: &'a StoreSettings,
        scope: ForkScope,
        branch_id: i64,
        started: Instant,
    ) -> Result<Self, StoreError> {
        let mut tables = BTreeMap::new();
        let mut problems = Vec::new();
        for config in registry.iter() {
            let schema = TableSchema::load(conn, &config.table_name)?;
            problems.extend(missing_columns(config, &schema, &settings.branch_column));
            let ceiling = conn
                .query_row(
                    &format!(
                        "SELECT MAX({}) FROM {}",
                        quote_ident(ID_FIELD),
                        quote_ident(&config.table_name)
                    ),
                    [],
                    |row| row.get::<_, Option<i64>>(0),
                )?
                .unwrap_or(0);
            tables.insert(
                config.table_name.clone(),
                Rc::new(TablePlan { schema, ceiling }),
            );
        }
        for config in registry.iter() {
            for child in &config.nested_entities {
                let Some(child_config) = registry.get_by_entity_type(&child.entity_type) else {
                    continue;
                };
                let has_parent_column = tables
                    .get(&child_config.table_name)
                    .is_some_and(|plan| plan.schema.has_column(&child.parent_fk_field));
                if !has_parent_column {
                    problems.push(format!(
                        "{} has no column {}",
                        child_config.table_name, child.parent_fk_field
                    ));
                }
            }
        }
        if !problems.is_empty() {
            return Err(StoreError::InvalidRegistry(problems));
        }

        Ok(Self {
            conn,
            registry,
            scope,
            branch_id,
            branch_column: &settings.branch_column,
            page_size: settings.page_size,
            started,
            deadline: settings.fork_timeout,
            order: registry.clone_order(),
            nested: registry.nested_entity_types(),
            tables,
            id_maps: IdMaps::new(),
            self_refs: Vec::new(),
            deferred: Vec::new(),
            rows_cloned: BTreeMap::new(),
        })
    }

    fn clone_tables(&mut self) -> Result<(), StoreError> {
        let registry = self.registry;
        for table in std::mem::take(&mut self.order) {
            let Some(config) = registry.get(&table) else {
                continue;
            };
            if self.nested.contains(&config.entity_type) {
                continue;
            }
            let table_started = Instant::now();
            self.clone_table(config)?;
            self.flush_self_refs()?;
            tracing::debug!(
                table = %table,
                rows = self.rows_cloned.get(&table).copied().unwrap_or(0),
                elapsed_ms = table_started.elapsed().as_millis(),
                "table cloned"
            );
        }
        Ok(())
    }

    fn clone_table(&mut self, config: &'a CloneConfig) -> Result<(), StoreError> {
        let plan = self.plan(&config.table_name)?;
        let predicate = self.predicate(config)?;

        if let Some(target) = config.iterate_via_mapping.as_deref() {
            let Some(link) = config.via_mapping_field() else {
                return Err(StoreError::InvalidRegistry(vec![format!(
                    "{} iterates via {target} without a link field",
                    config.table_name
                )]));
            };
            let parents = self.id_maps.old_ids(target);
            for chunk in parents.chunks(self.page_size) {
                let mut selection = Selection::any_of(link, chunk);
                selection.and(predicate.as_ref());
                self.clone_selection(config, &plan, &selection, None)?;
            }
            return Ok(());
        }

        // clone_all takes every row of the story, whatever branch it sits on.
        let mut selection = Selection::equals(STORY_FIELD, self.scope.story_id);
        if config.has_branch_scope && !config.clone_all {
            selection.and_branch(self.branch_column, self.scope.source_branch_id);
        }
        selection.and(predicate.as_ref());
        self.clone_selection(config, &plan, &selection, None)
    }

    /// Clones every row matching `selection`, one page at a time.
    fn clone_selection(
        &mut self,
        config: &'a CloneConfig,
        plan: &TablePlan,
        selection: &Selection,
        parent: Option<ParentLink<'a>>,
    ) -> Result<(), StoreError> {
        let mut after = i64::MIN;
        loop {
            self.check_deadline(&config.table_name)?;
            let page = select::select_page(self.conn, plan, selection, after, self.page_size)?;
            for row in &page {
                self.clone_row(config, plan, row, parent)?;
            }
            match page.last() {
                Some(last) if page.len() == self.page_size => after = last.id,
                _ => return Ok(()),
            }
        }
    }

    fn clone_nested(
        &mut self,
        config: &'a CloneConfig,
        old_parent_id: i64,
        new_parent_id: i64,
    ) -> Result<(), StoreError> {
        let registry = self.registry;
        for child in &config.nested_entities {
            let Some(child_config) = registry.get_by_entity_type(&child.entity_type) else {
                continue;
            };
            let plan = self.plan(&child_config.table_name)?;
            let predicate = self.predicate(child_config)?;
            let mut selection = Selection::equals(&child.parent_fk_field, old_parent_id);
            selection.and(predicate.as_ref());
            let link = ParentLink {
                field: &child.parent_fk_field,
                new_id: new_parent_id,
            };
            self.clone_selection(child_config, &plan, &selection, Some(link))?;
        }
        Ok(())
    }

    /// Rewrites self references whose parent was cloned after the child.
    fn flush_self_refs(&mut self) -> Result<(), StoreError> {
        for pending in std::mem::take(&mut self.self_refs) {
            if let Some(new_parent) = self.id_maps.resolve(&pending.target, pending.old_value) {
                row::update_field(
                    self.conn,
                    &pending.table,
                    &pending.field,
                    pending.new_id,
                    Some(new_parent),
                )?;
            }
        }
        Ok(())
    }

    fn plan(&self, table: &str) -> Result<Rc<TablePlan>, StoreError> {
        self.tables.get(table).cloned().ok_or_else(|| {
            StoreError::InvalidRegistry(vec![format!("table {table} was not prepared")])
        })
    }

    fn predicate(&self, config: &CloneConfig) -> Result<Option<SqlFilter>, StoreError> {
        if config.clone_all {
            return Ok(None);
        }
        let Some(predicate) = config.filter_predicate.as_ref() else {
            return Ok(None);
        };
        let filter = predicate(&self.scope);
        if filter.placeholder_count() != filter.params.len() {
            return Err(StoreError::InvalidRegistry(vec![format!(
                "{} filter has {} placeholders but {} params",
                config.table_name,
                filter.placeholder_count(),
                filter.params.len()
            )]));
        }
        Ok(Some(filter))
    }

    fn check_deadline(&self, table: &str) -> Result<(), StoreError> {
        let elapsed = self.started.elapsed();
        match self.deadline {
            Some(limit) if elapsed > limit => Err(StoreError::Timeout {
                table: table.to_string(),
                elapsed_ms: elapsed.as_millis(),
            }),
            _ => Ok(()),
        }
    }

    fn finish(self, request: &ForkRequest, stats: DeferredStats) -> ForkOutcome {
        let registry = self.registry;
        let mut id_maps = self.id_maps;
        id_maps.retain(|entity_type| {
            registry
                .get_by_entity_type(entity_type)
                .is_some_and(|config| config.creates_mapping)
        });

        ForkOutcome {
            branch_id: self.branch_id,
            source_story_id: request.source_story_id,
            source_branch_id: request.source_branch_id,
            fork_cutoff: request.fork_cutoff,
            id_maps: id_maps.into_inner(),
            rows_cloned: self.rows_cloned,
            deferred_resolved: stats.resolved,
            deferred_nulled: stats.nulled,
            elapsed_ms: self.started.elapsed().as_millis(),
        }
    }
}

/// Columns a config names that the live table lacks.
fn missing_columns(config: &CloneConfig, schema: &TableSchema, branch_column: &str) -> Vec<String> {
    let mut named: Vec<&str> = vec![ID_FIELD];
    if config.has_story_scope {
        named.push(STORY_FIELD);
    }
    if config.has_branch_scope {
        named.push(branch_column);
    }
    named.extend(config.fk_remappings.keys().map(String::as_str));
    named.extend(config.deferred_fk_remappings.keys().map(String::as_str));
    named.extend(config.special_handlers.keys().map(String::as_str));
    named.extend(config.reset_fields.keys().map(String::as_str));
    named.extend(config.self_ref_fk.as_deref());

    named
        .into_iter()
        .filter(|column| !schema.has_column(column))
        .map(|column| format!("{} has no column {column}", schema.table))
        .collect()
}
