use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Result};

use crate::config::model::StackConfig;
use crate::orchestrator::outcome::{OrchestratorError, UnitDescriptor, UnitKind};

/// Read-only map of every managed unit, keyed by port. Built once from
/// configuration at startup; a duplicate port is a fatal construction
/// error, never a runtime one.
#[derive(Debug)]
pub struct UnitRegistry {
    units: BTreeMap<u16, UnitDescriptor>,
}

impl UnitRegistry {
    pub fn from_config(config: &StackConfig, base_dir: &Path) -> Result<Self> {
        let mut units: BTreeMap<u16, UnitDescriptor> = BTreeMap::new();
        let jars_dir = base_dir.join(&config.paths.jars);

        let mut insert = |desc: UnitDescriptor| -> Result<()> {
            if let Some(existing) = units.get(&desc.port) {
                bail!(
                    "duplicate port {} shared by '{}' and '{}'",
                    desc.port,
                    existing.name,
                    desc.name
                );
            }
            units.insert(desc.port, desc);
            Ok(())
        };

        for (name, server) in &config.servers {
            let dir = server.dir.as_deref().unwrap_or(name);
            insert(UnitDescriptor {
                name: name.clone(),
                port: server.port,
                kind: UnitKind::ApplicationServer,
                executable: jars_dir.join(dir).join(&server.jar),
                working_dir: jars_dir.clone(),
            })?;
        }

        if let Some(chain) = &config.blockchain {
            let dir = base_dir.join(&chain.path);
            insert(UnitDescriptor {
                name: "blockchain".to_string(),
                port: chain.port,
                kind: UnitKind::BlockchainNetwork,
                executable: dir.clone(),
                working_dir: dir,
            })?;
        }

        if let Some(db) = &config.database {
            let dir = base_dir.join(&db.path);
            insert(UnitDescriptor {
                name: "database".to_string(),
                port: db.port,
                kind: UnitKind::Database,
                executable: dir.clone(),
                working_dir: dir,
            })?;
        }

        Ok(Self { units })
    }

    pub fn resolve(&self, port: u16) -> Result<&UnitDescriptor, OrchestratorError> {
        self.units.get(&port).ok_or(OrchestratorError::NotFound(port))
    }

    /// All units in ascending port order. Batches iterate in this order.
    pub fn all_units(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.units.values()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(toml: &str) -> StackConfig {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn resolves_registered_port() {
        let cfg = config(
            r#"
[servers.tas]
port = 8090
jar = "did-ta-server.jar"
dir = "TAS"
"#,
        );
        let registry = UnitRegistry::from_config(&cfg, &PathBuf::from("/opt/stack")).unwrap();

        let unit = registry.resolve(8090).unwrap();
        assert_eq!(unit.name, "tas");
        assert_eq!(unit.kind, UnitKind::ApplicationServer);
        assert_eq!(
            unit.executable,
            PathBuf::from("/opt/stack/jars/TAS/did-ta-server.jar")
        );
        assert_eq!(unit.working_dir, PathBuf::from("/opt/stack/jars"));
    }

    #[test]
    fn unknown_port_is_not_found() {
        let cfg = config(
            r#"
[servers.tas]
port = 8090
jar = "did-ta-server.jar"
"#,
        );
        let registry = UnitRegistry::from_config(&cfg, &PathBuf::from(".")).unwrap();
        assert!(matches!(
            registry.resolve(9999),
            Err(OrchestratorError::NotFound(9999))
        ));
    }

    #[test]
    fn duplicate_port_fails_at_construction() {
        let cfg = config(
            r#"
[servers.tas]
port = 8090
jar = "a.jar"

[servers.issuer]
port = 8090
jar = "b.jar"
"#,
        );
        let err = UnitRegistry::from_config(&cfg, &PathBuf::from(".")).unwrap_err();
        assert!(err.to_string().contains("duplicate port 8090"));
    }

    #[test]
    fn script_units_join_the_registry() {
        let cfg = config(
            r#"
[servers.tas]
port = 8090
jar = "did-ta-server.jar"

[blockchain]
port = 7050
channel = "mychannel"
chaincode = "opendid"

[database]
port = 5432
user = "omn"
password = "omn"
name = "omn"
"#,
        );
        let registry = UnitRegistry::from_config(&cfg, &PathBuf::from("/opt/stack")).unwrap();
        assert_eq!(registry.len(), 3);

        let kinds: Vec<_> = registry.all_units().map(|u| u.kind).collect();
        // Ascending port order: 5432 database, 7050 blockchain, 8090 server.
        assert_eq!(
            kinds,
            vec![
                UnitKind::Database,
                UnitKind::BlockchainNetwork,
                UnitKind::ApplicationServer,
            ]
        );
        assert_eq!(
            registry.resolve(7050).unwrap().working_dir,
            PathBuf::from("/opt/stack/shells/Fabric")
        );
    }

    #[test]
    fn database_port_collision_with_server_fails() {
        let cfg = config(
            r#"
[servers.tas]
port = 5432
jar = "a.jar"

[database]
port = 5432
user = "omn"
password = "omn"
name = "omn"
"#,
        );
        assert!(UnitRegistry::from_config(&cfg, &PathBuf::from(".")).is_err());
    }
}
