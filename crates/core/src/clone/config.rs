#![forbid(unsafe_code)]

use super::value::FieldValue;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const DEFAULT_PRIORITY: i32 = 100;
pub const ID_FIELD: &str = "id";
pub const STORY_FIELD: &str = "story_id";
pub const BRANCH_FIELD: &str = "branch_id";

/// Selection predicate evaluated against the fork being executed.
pub type FilterPredicate = Arc<dyn Fn(&ForkScope) -> SqlFilter + Send + Sync>;

/// Pure value transform `(old_value, new_branch_id) -> new_value`.
pub type SpecialHandler = Arc<dyn Fn(&FieldValue, i64) -> FieldValue + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkScope {
    pub story_id: i64,
    pub source_branch_id: Option<i64>,
    pub cutoff: i64,
}

/// A SQL boolean fragment using positional `?` placeholders, plus its bindings.
#[derive(Clone, Debug, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<FieldValue>,
}

impl SqlFilter {
    pub fn new(clause: impl Into<String>, params: Vec<FieldValue>) -> Self {
        Self {
            clause: clause.into(),
            params,
        }
    }

    pub fn placeholder_count(&self) -> usize {
        self.clause.matches('?').count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NestedEntity {
    pub entity_type: String,
    pub parent_fk_field: String,
}

/// Clone rules for one entity type.
#[derive(Clone)]
pub struct CloneConfig {
    pub entity_type: String,
    pub table_name: String,
    pub priority: i32,
    pub depends_on: BTreeSet<String>,
    pub fk_remappings: BTreeMap<String, String>,
    pub self_ref_fk: Option<String>,
    pub deferred_fk_remappings: BTreeMap<String, String>,
    pub filter_predicate: Option<FilterPredicate>,
    pub creates_mapping: bool,
    pub special_handlers: BTreeMap<String, SpecialHandler>,
    pub skip_fields: BTreeSet<String>,
    pub nested_entities: Vec<NestedEntity>,
    pub clone_all: bool,
    pub reset_fields: BTreeMap<String, FieldValue>,
    pub has_story_scope: bool,
    pub has_branch_scope: bool,
    pub iterate_via_mapping: Option<String>,
}

impl CloneConfig {
    pub fn new(entity_type: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            table_name: table_name.into(),
            priority: DEFAULT_PRIORITY,
            depends_on: BTreeSet::new(),
            fk_remappings: BTreeMap::new(),
            self_ref_fk: None,
            deferred_fk_remappings: BTreeMap::new(),
            filter_predicate: None,
            creates_mapping: false,
            special_handlers: BTreeMap::new(),
            skip_fields: [ID_FIELD, "created_at", "updated_at"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            nested_entities: Vec::new(),
            clone_all: false,
            reset_fields: BTreeMap::new(),
            has_story_scope: true,
            has_branch_scope: true,
            iterate_via_mapping: None,
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn depends_on<I, S>(mut self, entity_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on
            .extend(entity_types.into_iter().map(Into::into));
        self
    }

    pub fn remap(mut self, field: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.fk_remappings.insert(field.into(), entity_type.into());
        self
    }

    pub fn self_ref(mut self, field: impl Into<String>) -> Self {
        self.self_ref_fk = Some(field.into());
        self
    }

    pub fn deferred(mut self, field: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.deferred_fk_remappings
            .insert(field.into(), entity_type.into());
        self
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&ForkScope) -> SqlFilter + Send + Sync + 'static,
    {
        self.filter_predicate = Some(Arc::new(predicate));
        self
    }

    /// Keeps rows whose `column` is at or before the fork cutoff.
    pub fn cutoff_on(self, column: &str) -> Self {
        let column = quote_ident(column);
        self.filter(move |scope| {
            SqlFilter::new(format!("{column} <= ?"), vec![FieldValue::Integer(scope.cutoff)])
        })
    }

    pub fn creates_mapping(mut self) -> Self {
        self.creates_mapping = true;
        self
    }

    pub fn special<F>(mut self, field: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&FieldValue, i64) -> FieldValue + Send + Sync + 'static,
    {
        self.special_handlers.insert(field.into(), Arc::new(handler));
        self
    }

    pub fn skip(mut self, field: impl Into<String>) -> Self {
        self.skip_fields.insert(field.into());
        self
    }

    pub fn nested(
        mut self,
        entity_type: impl Into<String>,
        parent_fk_field: impl Into<String>,
    ) -> Self {
        self.nested_entities.push(NestedEntity {
            entity_type: entity_type.into(),
            parent_fk_field: parent_fk_field.into(),
        });
        self
    }

    pub fn clone_all(mut self) -> Self {
        self.clone_all = true;
        self
    }

    pub fn reset(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.reset_fields.insert(field.into(), value.into());
        self
    }

    pub fn story_scope(mut self, enabled: bool) -> Self {
        self.has_story_scope = enabled;
        self
    }

    pub fn branch_scope(mut self, enabled: bool) -> Self {
        self.has_branch_scope = enabled;
        self
    }

    /// Child tables with no story/branch column of their own.
    pub fn unscoped(self) -> Self {
        self.story_scope(false).branch_scope(false)
    }

    pub fn via_mapping(mut self, entity_type: impl Into<String>) -> Self {
        self.iterate_via_mapping = Some(entity_type.into());
        self
    }

    /// The column that links this entity to the map it iterates over.
    pub fn via_mapping_field(&self) -> Option<&str> {
        let target = self.iterate_via_mapping.as_deref()?;
        self.fk_remappings
            .iter()
            .find(|(_, entity_type)| entity_type.as_str() == target)
            .map(|(field, _)| field.as_str())
    }

    /// Entity types whose id maps this config reads while cloning.
    pub fn mapping_reads(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fk_remappings
            .iter()
            .chain(self.deferred_fk_remappings.iter())
            .map(|(field, target)| (field.as_str(), target.as_str()))
    }

    pub fn is_skipped(&self, field: &str) -> bool {
        self.skip_fields.contains(field)
    }
}

impl std::fmt::Debug for CloneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneConfig")
            .field("entity_type", &self.entity_type)
            .field("table_name", &self.table_name)
            .field("priority", &self.priority)
            .field("depends_on", &self.depends_on)
            .field("fk_remappings", &self.fk_remappings)
            .field("self_ref_fk", &self.self_ref_fk)
            .field("deferred_fk_remappings", &self.deferred_fk_remappings)
            .field("filter_predicate", &self.filter_predicate.is_some())
            .field("creates_mapping", &self.creates_mapping)
            .field(
                "special_handlers",
                &self.special_handlers.keys().collect::<Vec<_>>(),
            )
            .field("skip_fields", &self.skip_fields)
            .field("nested_entities", &self.nested_entities)
            .field("clone_all", &self.clone_all)
            .field("reset_fields", &self.reset_fields)
            .field("has_story_scope", &self.has_story_scope)
            .field("has_branch_scope", &self.has_branch_scope)
            .field("iterate_via_mapping", &self.iterate_via_mapping)
            .finish()
    }
}

/// Double-quotes an SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
