//! Snapshot-based probe store.

use arc_swap::ArcSwap;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::probe::Probe;
use crate::registry::error::RegistryError;

/// A registered probe together with its indexing keys.
pub struct RegistryEntry {
    name: String,
    component_type: String,
    priority: i32,
    seq: u64,
    probe: Arc<dyn Probe>,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn probe(&self) -> &Arc<dyn Probe> {
        &self.probe
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("name", &self.name)
            .field("component_type", &self.component_type)
            .field("priority", &self.priority)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Immutable view of the registry at one point in time.
#[derive(Default)]
struct Snapshot {
    /// Entries in iteration order.
    entries: Vec<Arc<RegistryEntry>>,
    by_name: HashMap<String, usize>,
    by_type: HashMap<String, Vec<usize>>,
}

impl Snapshot {
    fn from_entries(mut entries: Vec<Arc<RegistryEntry>>) -> Self {
        entries.sort_by_key(|e| (Reverse(e.priority), e.seq));

        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_type: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, entry) in entries.iter().enumerate() {
            by_name.insert(entry.name.clone(), idx);
            by_type.entry(entry.component_type.clone()).or_default().push(idx);
        }

        Self {
            entries,
            by_name,
            by_type,
        }
    }
}

/// Thread-safe registry mapping component names to probes.
pub struct ProbeRegistry {
    snapshot: ArcSwap<Snapshot>,
    next_seq: AtomicU64,
}

impl ProbeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(Snapshot::default()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Register a probe with default priority.
    pub fn register(&self, probe: Arc<dyn Probe>) -> Result<(), RegistryError> {
        self.register_with_priority(probe, 0)
    }

    /// Register a probe. Higher priority probes are iterated first.
    ///
    /// A probe whose name is already registered replaces the previous one,
    /// keeping its position among equal priorities.
    pub fn register_with_priority(
        &self,
        probe: Arc<dyn Probe>,
        priority: i32,
    ) -> Result<(), RegistryError> {
        let name = probe.component_name().to_string();
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidProbe(
                "component name must not be empty".to_string(),
            ));
        }
        let component_type = probe.component_type().to_string();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);

        let previous = self.snapshot.rcu(|current| {
            let mut entries = current.entries.clone();
            match current.by_name.get(&name) {
                Some(&idx) => {
                    entries[idx] = Arc::new(RegistryEntry {
                        name: name.clone(),
                        component_type: component_type.clone(),
                        priority,
                        seq: entries[idx].seq,
                        probe: probe.clone(),
                    });
                }
                None => entries.push(Arc::new(RegistryEntry {
                    name: name.clone(),
                    component_type: component_type.clone(),
                    priority,
                    seq,
                    probe: probe.clone(),
                })),
            }
            Snapshot::from_entries(entries)
        });

        if let Some(&idx) = previous.by_name.get(&name) {
            tracing::warn!(
                component = %name,
                previous_type = %previous.entries[idx].component_type,
                component_type = %component_type,
                "Probe re-registered, replacing previous registration"
            );
        } else {
            tracing::debug!(component = %name, component_type = %component_type, priority, "Probe registered");
        }
        Ok(())
    }

    /// Remove a probe. Returns whether anything was removed.
    pub fn deregister(&self, name: &str) -> bool {
        if !self.snapshot.load().by_name.contains_key(name) {
            return false;
        }

        let previous = self.snapshot.rcu(|current| {
            let entries = current
                .entries
                .iter()
                .filter(|e| e.name != name)
                .cloned()
                .collect();
            Snapshot::from_entries(entries)
        });

        let removed = previous.by_name.contains_key(name);
        if removed {
            tracing::info!(component = %name, "Probe deregistered");
        }
        removed
    }

    /// Registered entries in iteration order.
    pub fn entries(&self) -> Vec<Arc<RegistryEntry>> {
        self.snapshot.load().entries.clone()
    }

    /// All probes in iteration order.
    pub fn all_probes(&self) -> Vec<Arc<dyn Probe>> {
        self.snapshot
            .load()
            .entries
            .iter()
            .map(|e| e.probe.clone())
            .collect()
    }

    /// Probes of the given component type, in iteration order.
    pub fn probes_by_type(&self, component_type: &str) -> Vec<Arc<dyn Probe>> {
        let snapshot = self.snapshot.load();
        snapshot
            .by_type
            .get(component_type)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&idx| snapshot.entries[idx].probe.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Look up a probe by component name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Probe>> {
        let snapshot = self.snapshot.load();
        snapshot
            .by_name
            .get(name)
            .map(|&idx| snapshot.entries[idx].probe.clone())
    }

    /// Look up the full entry by component name.
    pub fn entry(&self, name: &str) -> Option<Arc<RegistryEntry>> {
        let snapshot = self.snapshot.load();
        snapshot.by_name.get(name).map(|&idx| snapshot.entries[idx].clone())
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Component names in iteration order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot
            .load()
            .entries
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    /// Distinct component types, sorted.
    pub fn types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.snapshot.load().by_type.keys().cloned().collect();
        types.sort();
        types
    }

    /// Structural sanity check, meant to run once after wiring.
    ///
    /// Returns every violation found, not just the first.
    pub fn validate(&self) -> Result<(), Vec<RegistryError>> {
        let snapshot = self.snapshot.load();
        let mut errors = Vec::new();

        for (idx, entry) in snapshot.entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                errors.push(RegistryError::InvalidProbe(format!(
                    "entry at position {} has an empty component name",
                    idx
                )));
            }

            let declared = entry.probe.component_name();
            if declared != entry.name {
                errors.push(RegistryError::NameMismatch {
                    key: entry.name.clone(),
                    declared: declared.to_string(),
                });
            }

            if snapshot.by_name.get(&entry.name) != Some(&idx) {
                errors.push(RegistryError::IndexCorrupted(format!(
                    "name index does not point at '{}'",
                    entry.name
                )));
            }

            let in_type_index = snapshot
                .by_type
                .get(&entry.component_type)
                .is_some_and(|indexes| indexes.contains(&idx));
            if !in_type_index {
                errors.push(RegistryError::IndexCorrupted(format!(
                    "type index is missing '{}'",
                    entry.name
                )));
            }
        }

        if snapshot.by_name.len() != snapshot.entries.len() {
            errors.push(RegistryError::IndexCorrupted(format!(
                "{} names indexed for {} entries",
                snapshot.by_name.len(),
                snapshot.entries.len()
            )));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl std::fmt::Debug for ProbeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeRegistry")
            .field("names", &self.names())
            .finish()
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProbeResult;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    struct NamedProbe {
        name: String,
        component_type: String,
        renamed: AtomicBool,
    }

    impl NamedProbe {
        fn arc(name: &str, component_type: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                component_type: component_type.to_string(),
                renamed: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl Probe for NamedProbe {
        fn component_name(&self) -> &str {
            if self.renamed.load(Ordering::SeqCst) {
                "renamed"
            } else {
                &self.name
            }
        }

        fn component_type(&self) -> &str {
            &self.component_type
        }

        async fn execute(&self) -> ProbeResult {
            ProbeResult::up(self.component_name(), &self.component_type, Duration::ZERO)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ProbeRegistry::new();
        registry.register(NamedProbe::arc("db", "database")).unwrap();
        registry.register(NamedProbe::arc("broker", "kafka")).unwrap();
        registry.register(NamedProbe::arc("replica", "database")).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["db", "broker", "replica"]);
        assert!(registry.get("broker").is_some());
        assert!(registry.get("missing").is_none());

        let databases: Vec<String> = registry
            .probes_by_type("database")
            .iter()
            .map(|p| p.component_name().to_string())
            .collect();
        assert_eq!(databases, vec!["db", "replica"]);
        assert!(registry.probes_by_type("ftp").is_empty());
        assert_eq!(registry.types(), vec!["database", "kafka"]);
    }

    #[test]
    fn test_rejects_empty_name() {
        let registry = ProbeRegistry::new();
        let err = registry.register(NamedProbe::arc("  ", "database")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidProbe(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_last_registration_wins_in_place() {
        let registry = ProbeRegistry::new();
        registry.register(NamedProbe::arc("db", "database")).unwrap();
        registry.register(NamedProbe::arc("cache", "redis")).unwrap();
        registry.register(NamedProbe::arc("db", "postgres")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["db", "cache"]);
        assert_eq!(registry.get("db").unwrap().component_type(), "postgres");
        assert!(registry.probes_by_type("database").is_empty());
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_deregister() {
        let registry = ProbeRegistry::new();
        registry.register(NamedProbe::arc("db", "database")).unwrap();
        registry.register(NamedProbe::arc("cache", "redis")).unwrap();

        assert!(registry.deregister("db"));
        assert!(!registry.deregister("db"));
        assert_eq!(registry.names(), vec!["cache"]);
        assert!(registry.probes_by_type("database").is_empty());
    }

    #[test]
    fn test_priority_order_is_stable() {
        let registry = ProbeRegistry::new();
        registry.register_with_priority(NamedProbe::arc("low", "t"), -1).unwrap();
        registry.register(NamedProbe::arc("a", "t")).unwrap();
        registry.register_with_priority(NamedProbe::arc("high", "t"), 10).unwrap();
        registry.register(NamedProbe::arc("b", "t")).unwrap();

        let expected = vec!["high", "a", "b", "low"];
        for _ in 0..3 {
            assert_eq!(registry.names(), expected);
        }
    }

    #[test]
    fn test_validate_detects_name_drift() {
        let registry = ProbeRegistry::new();
        let probe = NamedProbe::arc("db", "database");
        registry.register(probe.clone()).unwrap();
        assert!(registry.validate().is_ok());

        probe.renamed.store(true, Ordering::SeqCst);
        let errors = registry.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![RegistryError::NameMismatch {
                key: "db".to_string(),
                declared: "renamed".to_string(),
            }]
        );
    }

    #[test]
    fn test_concurrent_registration() {
        let registry = Arc::new(ProbeRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let registry = registry.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        registry
                            .register(NamedProbe::arc(&format!("p-{}-{}", t, i), "t"))
                            .unwrap();
                        let _ = registry.all_probes();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(registry.len(), 200);
        assert!(registry.validate().is_ok());
    }
}
