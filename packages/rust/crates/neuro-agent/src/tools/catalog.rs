//! Registered tool definitions and the stage-filtered visible subset.

use std::collections::{BTreeSet, HashMap};

use neuro_types::{StageSnapshot, ToolDefinition};
use serde_json::Value;

use super::registry::RegistryError;

/// Every tool definition, registered once at startup. Registration order is display order.
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDefinition>,
    by_name: HashMap<String, usize>,
}

impl ToolCatalog {
    /// Validate and register definitions. Names must be unique.
    pub fn new(definitions: Vec<ToolDefinition>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(definitions.len());
        for (position, definition) in definitions.iter().enumerate() {
            definition
                .validate()
                .map_err(|error| RegistryError::InvalidDefinition(error.to_string()))?;
            if by_name.insert(definition.name.clone(), position).is_some() {
                return Err(RegistryError::DuplicateTool(definition.name.clone()));
            }
        }
        Ok(Self {
            tools: definitions,
            by_name,
        })
    }

    /// Definition by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.by_name.get(name).map(|position| &self.tools[*position])
    }

    /// All definitions in registration order.
    #[must_use]
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    /// All tool names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// JSON schema of every tool.
    #[must_use]
    pub fn json_schemas(&self) -> Vec<Value> {
        self.tools.iter().map(ToolDefinition::json_schema).collect()
    }

    /// Tools permitted by `stage`: catalog ∩ `stage.permitted_tools`, in registration order.
    #[must_use]
    pub fn visible<'a>(&'a self, stage: &'a StageSnapshot) -> VisibleTools<'a> {
        let tools = self
            .tools
            .iter()
            .filter(|tool| stage.permits(&tool.name))
            .collect();
        VisibleTools { stage, tools }
    }
}

/// The subset of the catalog shown to the engine and accepted by verification.
#[derive(Debug, Clone)]
pub struct VisibleTools<'a> {
    stage: &'a StageSnapshot,
    tools: Vec<&'a ToolDefinition>,
}

impl<'a> VisibleTools<'a> {
    /// Stage the subset was computed for.
    #[must_use]
    pub fn stage(&self) -> &'a StageSnapshot {
        self.stage
    }

    /// Visible definitions in catalog order.
    #[must_use]
    pub fn tools(&self) -> &[&'a ToolDefinition] {
        &self.tools
    }

    /// Visible definition by exact name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'a ToolDefinition> {
        self.tools.iter().copied().find(|tool| tool.name == name)
    }

    /// Resolve a proposed name. The flag is `true` for an exact match, `false` when
    /// only the normalized form (case, `-`, spaces) matched.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<(&'a ToolDefinition, bool)> {
        if let Some(tool) = self.get(name) {
            return Some((tool, true));
        }
        let wanted = normalize_name(name);
        self.tools
            .iter()
            .copied()
            .find(|tool| normalize_name(&tool.name) == wanted)
            .map(|tool| (tool, false))
    }

    /// Visible tool names.
    #[must_use]
    pub fn names(&self) -> Vec<&'a str> {
        self.tools.iter().map(|tool| tool.name.as_str()).collect()
    }

    /// Categories of the visible tools.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<String> {
        self.tools.iter().map(|tool| tool.category.clone()).collect()
    }

    /// Whether no tool is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|ch| match ch {
            '-' | ' ' | '.' => '_',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(vec![
            ToolDefinition::new("load_data", "Load", "data"),
            ToolDefinition::new("apply_filter", "Filter", "preprocessing"),
            ToolDefinition::new("clear_dataset", "Clear", "data").destructive(),
        ])
        .unwrap()
    }

    #[test]
    fn visible_is_catalog_intersect_permitted() {
        let catalog = catalog();
        let stage = StageSnapshot::new("data_loaded", &["apply_filter", "clear_dataset", "unknown_op"]);
        let visible = catalog.visible(&stage);
        assert_eq!(visible.names(), vec!["apply_filter", "clear_dataset"]);
        assert_eq!(
            visible.categories().into_iter().collect::<Vec<_>>(),
            vec!["data".to_string(), "preprocessing".to_string()]
        );
    }

    #[test]
    fn resolve_prefers_exact_then_normalized() {
        let catalog = catalog();
        let stage = StageSnapshot::new("data_loaded", &["apply_filter"]);
        let visible = catalog.visible(&stage);
        assert!(matches!(visible.resolve("apply_filter"), Some((_, true))));
        assert!(matches!(visible.resolve("Apply-Filter"), Some((_, false))));
        assert!(visible.resolve("load_data").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = ToolCatalog::new(vec![
            ToolDefinition::new("get_status", "a", "info"),
            ToolDefinition::new("get_status", "b", "info"),
        ]);
        assert!(matches!(result, Err(RegistryError::DuplicateTool(name)) if name == "get_status"));
    }
}
