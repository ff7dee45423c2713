//! All spawn groups of one world or area.
//!
//! The table owns its groups: removing a group (or clearing the table when the area unloads)
//! tears it down, so its pending respawn tasks become no-ops.
//!
use crate::indices::TemplateId;
use crate::spawn::SpawnGroup;
use slog::{debug, info, Logger};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug)]
pub struct SpawnTable {
    logger: Logger,
    groups: RwLock<Vec<Arc<SpawnGroup>>>,
}

impl SpawnTable {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            groups: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<Vec<Arc<SpawnGroup>>> {
        self.groups.read().unwrap_or_else(|err| err.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<Vec<Arc<SpawnGroup>>> {
        self.groups.write().unwrap_or_else(|err| err.into_inner())
    }

    pub fn add(&self, group: Arc<SpawnGroup>) {
        self.write().push(group);
    }

    /// Remove and tear down `group`. Returns false if it was not part of this table.
    pub fn remove(&self, group: &Arc<SpawnGroup>) -> bool {
        let removed = {
            let mut groups = self.write();
            let len = groups.len();
            groups.retain(|g| !Arc::ptr_eq(g, group));
            groups.len() != len
        };
        if removed {
            group.teardown();
            debug!(self.logger, "Removed spawn {}", group);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn groups(&self) -> Vec<Arc<SpawnGroup>> {
        self.read().clone()
    }

    pub fn get_by_template(&self, template: TemplateId) -> Vec<Arc<SpawnGroup>> {
        self.read()
            .iter()
            .filter(|g| g.template_id() == Some(template))
            .cloned()
            .collect()
    }

    /// Fill every group. Returns the number of npcs spawned.
    pub fn fill_all(&self) -> u32 {
        let groups = self.groups();

        #[cfg(not(feature = "disable-parallelism"))]
        let spawned: u32 = {
            use rayon::prelude::*;
            groups.par_iter().map(|g| g.fill()).sum()
        };
        #[cfg(feature = "disable-parallelism")]
        let spawned: u32 = groups.iter().map(|g| g.fill()).sum();

        info!(
            self.logger,
            "Spawned {} npcs from {} spawn groups",
            spawned,
            groups.len()
        );
        spawned
    }

    pub fn stop_all_respawns(&self) {
        for group in self.read().iter() {
            group.stop_respawn();
        }
    }

    /// Tear down and drop every group
    pub fn clear(&self) {
        let groups = std::mem::replace(&mut *self.write(), Vec::new());
        for group in groups.iter() {
            group.teardown();
        }
        debug!(self.logger, "Cleared {} spawn groups", groups.len());
    }
}
