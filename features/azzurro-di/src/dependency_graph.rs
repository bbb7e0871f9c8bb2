use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::registry::ModuleRegistry;

/// Graph of the module dependencies
/// Used to compute the resolution order and to check for missing or circular dependencies
pub struct DependencyGraph {
    map: BTreeMap<String, DependencyGraphEntry>,
    /// Module names in declaration order
    declared: Vec<String>,
}
impl DependencyGraph {
    /// Snapshot of the modules currently declared in the registry
    pub fn new(registry: &ModuleRegistry) -> Self {
        let mut graph = Self {
            map: Default::default(),
            declared: Vec::new(),
        };

        for name in registry.module_names() {
            if let Ok(module) = registry.get_module(name) {
                graph.add(name, module.dependencies().to_vec());
            }
        }

        graph
    }

    fn add(&mut self, name: &str, dependencies: Vec<String>) {
        self.map
            .insert(name.to_string(), DependencyGraphEntry { dependencies });
        self.declared.push(name.to_string());
    }

    /// Computes the order in which the modules reachable from `root` are resolved.
    ///
    /// Dependencies come before their dependents. Modules are visited depth first,
    /// dependencies in the order they were declared.
    pub fn resolution_order(&self, root: &str) -> Result<Vec<String>, DependencyGraphError> {
        let mut resolved = HashSet::new();
        let mut order = Vec::new();
        let mut dependency_chain = Vec::new();

        visit(
            self,
            root,
            None,
            &mut resolved,
            &mut order,
            &mut dependency_chain,
        )?;

        return Ok(order);

        fn visit(
            graph: &DependencyGraph,
            name: &str,
            required_by: Option<&str>,
            resolved: &mut HashSet<String>,
            order: &mut Vec<String>,
            dependency_chain: &mut Vec<String>,
        ) -> Result<(), DependencyGraphError> {
            if resolved.contains(name) {
                return Ok(());
            }

            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|entry| entry == name) {
                let mut chain = dependency_chain[start..].to_vec();
                chain.push(name.to_string());
                return Err(DependencyGraphError::CircularDependency {
                    from: dependency_chain[start].clone(),
                    to: dependency_chain.last().cloned().unwrap_or_default(),
                    chain,
                });
            }

            let entry = graph
                .map
                .get(name)
                .ok_or_else(|| DependencyGraphError::ModuleNotFound {
                    module: name.to_string(),
                    required_by: required_by.map(str::to_string),
                })?;

            dependency_chain.push(name.to_string());
            for dependency in &entry.dependencies {
                visit(
                    graph,
                    dependency,
                    Some(name),
                    resolved,
                    order,
                    dependency_chain,
                )?;
            }
            dependency_chain.pop();

            resolved.insert(name.to_string());
            order.push(name.to_string());
            Ok(())
        }
    }

    /// Validate the whole graph, not only what is reachable from the app module
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = Vec::new();
        for name in &self.declared {
            let mut dependency_chain = Vec::new();
            check_recurse(self, &mut checked, &mut errors, &mut dependency_chain, name);
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph,
            checked: &mut HashSet<String>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<String>,
            name: &str,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|entry| entry == name) {
                let mut chain = dependency_chain[start..].to_vec();
                chain.push(name.to_string());

                errors.push(DependencyGraphError::CircularDependency {
                    from: dependency_chain[start].clone(),
                    to: dependency_chain.last().cloned().unwrap_or_default(),
                    chain,
                });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(name.to_string()) {
                return;
            };

            let Some(entry) = graph.map.get(name) else {
                return;
            };

            dependency_chain.push(name.to_string());

            for dependency in &entry.dependencies {
                if !graph.map.contains_key(dependency) {
                    errors.push(DependencyGraphError::ModuleNotFound {
                        module: dependency.clone(),
                        required_by: Some(name.to_string()),
                    });
                    continue;
                }

                check_recurse(graph, checked, errors, dependency_chain, dependency);
            }

            dependency_chain.pop();
        }
    }
}

struct DependencyGraphEntry {
    dependencies: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyGraphError {
    #[error("Module '{module}' has not been registered{}", .required_by.as_ref().map(|by| format!(", required by '{by}'")).unwrap_or_default())]
    ModuleNotFound {
        module: String,
        required_by: Option<String>,
    },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {chain:?}")]
    CircularDependency {
        from: String,
        to: String,
        chain: Vec<String>,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
