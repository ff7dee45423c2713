//! Npc construction keyed by [NpcKind].
//!
//! A spawn group resolves its constructor once, when it is bound to its template, so an
//! unknown kind is reported when the group is built rather than on every spawn.
//!
use crate::error::FactoryError;
use crate::indices::ObjectId;
use crate::npc::{Npc, NpcKind, NpcTemplate};
use std::collections::HashMap;
use std::sync::Arc;

pub trait NpcConstructor: Send + Sync {
    fn construct(&self, id: ObjectId, template: &Arc<NpcTemplate>) -> Result<Npc, FactoryError>;
}

impl<F> NpcConstructor for F
where
    F: Fn(ObjectId, &Arc<NpcTemplate>) -> Result<Npc, FactoryError> + Send + Sync,
{
    fn construct(&self, id: ObjectId, template: &Arc<NpcTemplate>) -> Result<Npc, FactoryError> {
        self(id, template)
    }
}

/// Builds a plain [Npc] from its template
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericConstructor;

impl NpcConstructor for GenericConstructor {
    fn construct(&self, id: ObjectId, template: &Arc<NpcTemplate>) -> Result<Npc, FactoryError> {
        Ok(Npc::new(id, Arc::clone(template)))
    }
}

#[derive(Default, Clone)]
pub struct EntityRegistry {
    constructors: HashMap<NpcKind, Arc<dyn NpcConstructor>>,
}

impl std::fmt::Debug for EntityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRegistry")
            .field("kinds", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the [GenericConstructor] for every kind spawn groups construct
    pub fn with_defaults() -> Self {
        use NpcKind::*;

        let mut registry = Self::new();
        let generic: Arc<dyn NpcConstructor> = Arc::new(GenericConstructor);
        for kind in [
            Monster,
            RaidBoss,
            GrandBoss,
            Minion,
            Guard,
            SiegeGuard,
            FriendlyMob,
            Folk,
            Merchant,
            Artefact,
            Chest,
            FeedableBeast,
            TamedBeast,
        ]
        .iter()
        {
            registry.constructors.insert(*kind, Arc::clone(&generic));
        }
        registry
    }

    /// Register a constructor, replacing the previous one of `kind`
    pub fn register<C>(&mut self, kind: NpcKind, constructor: C) -> &mut Self
    where
        C: NpcConstructor + 'static,
    {
        self.constructors.insert(kind, Arc::new(constructor));
        self
    }

    pub fn unregister(&mut self, kind: NpcKind) -> Option<Arc<dyn NpcConstructor>> {
        self.constructors.remove(&kind)
    }

    pub fn resolve(&self, kind: NpcKind) -> Result<Arc<dyn NpcConstructor>, FactoryError> {
        self.constructors
            .get(&kind)
            .cloned()
            .ok_or(FactoryError::UnknownKind(kind))
    }

    pub fn create(
        &self,
        id: ObjectId,
        template: &Arc<NpcTemplate>,
    ) -> Result<Npc, FactoryError> {
        self.resolve(template.kind)?.construct(id, template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::TemplateId;

    #[test]
    fn defaults_do_not_construct_excluded_kinds() {
        let registry = EntityRegistry::with_defaults();
        assert!(registry.resolve(NpcKind::Monster).is_ok());
        for kind in [NpcKind::Pet, NpcKind::Decoy, NpcKind::Trap, NpcKind::EffectPoint].iter() {
            assert!(matches!(
                registry.resolve(*kind),
                Err(FactoryError::UnknownKind(k)) if k == *kind
            ));
        }
    }

    #[test]
    fn closures_can_be_registered() {
        let mut registry = EntityRegistry::new();
        registry.register(
            NpcKind::Guard,
            |id: ObjectId, template: &Arc<NpcTemplate>| -> Result<Npc, FactoryError> {
                let mut npc = Npc::new(id, Arc::clone(template));
                npc.no_random_walk = true;
                Ok(npc)
            },
        );

        let template = Arc::new(NpcTemplate::new(TemplateId(30), NpcKind::Guard));
        let npc = registry.create(ObjectId(5), &template).unwrap();
        assert_eq!(npc.id, ObjectId(5));
        assert!(npc.no_random_walk);
    }

    #[test]
    fn binding_errors_are_forwarded() {
        let mut registry = EntityRegistry::new();
        registry.register(
            NpcKind::Monster,
            |_: ObjectId, template: &Arc<NpcTemplate>| -> Result<Npc, FactoryError> {
                Err(FactoryError::Binding {
                    template: template.id,
                    reason: "no skills loaded".to_owned(),
                })
            },
        );
        let template = Arc::new(NpcTemplate::new(TemplateId(1), NpcKind::Monster));
        assert!(matches!(
            registry.create(ObjectId(1), &template),
            Err(FactoryError::Binding { .. })
        ));
    }
}
