use std::collections::BTreeMap;
use std::sync::Arc;

use crate::kind::InstallerKind;
use crate::strategy::{DirectCopy, ExtractionStrategy, GenericArchive, InnoExtract, NativeInstallerApi};

type Strategies = Vec<Arc<dyn ExtractionStrategy>>;

/// Ordered extraction strategies per installer kind, most faithful first.
///
/// Immutable once built; share it behind an `Arc` between jobs.
#[derive(Clone, Default)]
pub struct Registry {
    table: BTreeMap<InstallerKind, Strategies>,
}

impl Registry {
    /// The built-in table covering every [`InstallerKind`].
    pub fn standard() -> Self {
        let inno: Arc<dyn ExtractionStrategy> = Arc::new(InnoExtract);
        let archive: Arc<dyn ExtractionStrategy> = Arc::new(GenericArchive);
        let msi: Arc<dyn ExtractionStrategy> = Arc::new(NativeInstallerApi);
        let copy: Arc<dyn ExtractionStrategy> = Arc::new(DirectCopy);

        Self::empty()
            .with(InstallerKind::InnoSetup, vec![inno, archive.clone()])
            .with(InstallerKind::Nsis, vec![archive.clone()])
            .with(InstallerKind::InstallShield, vec![archive.clone()])
            .with(InstallerKind::WiXMsi, vec![archive.clone()])
            .with(InstallerKind::ArchiveZip, vec![archive.clone()])
            .with(InstallerKind::ArchiveRar, vec![archive.clone()])
            .with(InstallerKind::Msi, vec![msi, archive.clone()])
            .with(InstallerKind::StandaloneExecutable, vec![copy.clone()])
            .with(InstallerKind::Unknown, vec![archive, copy])
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the strategy list for `kind`.
    pub fn with(mut self, kind: InstallerKind, strategies: Strategies) -> Self {
        self.table.insert(kind, strategies);
        self
    }

    /// Strategies for `kind` in preference order; empty if none are registered.
    pub fn strategies_for(&self, kind: InstallerKind) -> &[Arc<dyn ExtractionStrategy>] {
        self.table.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn ids_for(&self, kind: InstallerKind) -> Vec<&'static str> {
        self.strategies_for(kind).iter().map(|s| s.id()).collect()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for kind in self.table.keys() {
            map.entry(kind, &self.ids_for(*kind));
        }
        map.finish()
    }
}
