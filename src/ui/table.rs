use crate::adapter::AdapterRegistry;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct AdapterRow {
    #[tabled(rename = "Adapter")]
    pub name: String,
    #[tabled(rename = "Language")]
    pub language: String,
    #[tabled(rename = "Grammar")]
    pub grammar: String,
    #[tabled(rename = "Default")]
    pub default: String,
}

pub struct TableBuilder {
    rows: Vec<AdapterRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, name: &str, language: &str, grammar: &str, default: bool) {
        self.rows.push(AdapterRow {
            name: name.to_string(),
            language: language.to_string(),
            grammar: grammar.to_string(),
            default: if default { "*".to_string() } else { String::new() },
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Table of registered adapters, marking the one selected by default
pub fn adapter_table(registry: &AdapterRegistry, default: &str) -> String {
    let mut builder = TableBuilder::new();
    for adapter in registry.adapters() {
        builder.add_row(&adapter.name, &adapter.language, &adapter.grammar, adapter.name == default);
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::default_registry;
    use crate::config::TesterConfig;

    #[test]
    fn test_adapter_table() {
        let registry = default_registry(&TesterConfig::default()).unwrap();
        let table = adapter_table(&registry, "json");
        assert!(table.contains("rhai"));
        assert!(table.contains("Grammar"));
        assert!(table.lines().any(|l| l.contains("json") && l.contains('*')));
        assert!(TableBuilder::new().build().is_empty());
    }
}
