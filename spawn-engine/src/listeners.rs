use crate::indices::ListenerId;
use crate::npc::Npc;
use slog::{error, warn, Logger};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard};

/// Observer of every npc a spawn group puts into the world
pub trait SpawnListener: Send + Sync {
    fn npc_spawned(&self, npc: &Npc) -> anyhow::Result<()>;
}

impl<F> SpawnListener for F
where
    F: Fn(&Npc) -> anyhow::Result<()> + Send + Sync,
{
    fn npc_spawned(&self, npc: &Npc) -> anyhow::Result<()> {
        self(npc)
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn SpawnListener>)>,
}

/// Insertion ordered set of spawn listeners.
///
/// Owned by the world/server context and shared by reference with every spawn group.
pub struct SpawnListenerRegistry {
    logger: Logger,
    listeners: Mutex<Listeners>,
}

impl std::fmt::Debug for SpawnListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl SpawnListenerRegistry {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            listeners: Mutex::new(Listeners::default()),
        }
    }

    fn lock(&self) -> MutexGuard<Listeners> {
        self.listeners.lock().unwrap_or_else(|err| err.into_inner())
    }

    pub fn register<L>(&self, listener: L) -> ListenerId
    where
        L: SpawnListener + 'static,
    {
        self.register_shared(Arc::new(listener))
    }

    pub fn register_shared(&self, listener: Arc<dyn SpawnListener>) -> ListenerId {
        let mut listeners = self.lock();
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, listener));
        id
    }

    /// Returns whether the listener was registered
    pub fn unregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let len = listeners.entries.len();
        listeners.entries.retain(|(i, _)| *i != id);
        listeners.entries.len() != len
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every listener, in registration order.
    ///
    /// Listeners are called on a snapshot taken under the lock, so they may (un)register
    /// listeners themselves and a slow listener never blocks registration.
    /// A failing or panicking listener does not stop the others.
    pub fn notify_spawned(&self, npc: &Npc) {
        let snapshot: Vec<_> = self.lock().entries.clone();
        for (id, listener) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| listener.npc_spawned(npc))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(
                    self.logger,
                    "Spawn listener {} failed on npc {}: {:?}", id, npc.id, err
                ),
                Err(_) => error!(
                    self.logger,
                    "Spawn listener {} panicked on npc {}", id, npc.id
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::{ObjectId, TemplateId};
    use crate::npc::{NpcKind, NpcTemplate};
    use crate::utils::{setup_testing, test_logger};

    fn npc() -> Npc {
        Npc::new(
            ObjectId(42),
            Arc::new(NpcTemplate::new(TemplateId(1), NpcKind::Monster)),
        )
    }

    #[test]
    fn notifies_in_registration_order() {
        setup_testing();
        let registry = SpawnListenerRegistry::new(test_logger());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let seen = Arc::clone(&seen);
            registry.register(move |npc: &Npc| -> anyhow::Result<()> {
                seen.lock().unwrap().push((i, npc.id));
                Ok(())
            });
        }
        registry.notify_spawned(&npc());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(0, ObjectId(42)), (1, ObjectId(42)), (2, ObjectId(42))]
        );
    }

    #[test]
    fn failing_listeners_do_not_stop_the_rest() {
        setup_testing();
        let registry = SpawnListenerRegistry::new(test_logger());
        let seen = Arc::new(Mutex::new(0));

        registry.register(|_: &Npc| -> anyhow::Result<()> { Err(anyhow::anyhow!("boom")) });
        registry.register(|_: &Npc| -> anyhow::Result<()> { panic!("listener panic") });
        let s = Arc::clone(&seen);
        registry.register(move |_: &Npc| -> anyhow::Result<()> {
            *s.lock().unwrap() += 1;
            Ok(())
        });

        registry.notify_spawned(&npc());
        registry.notify_spawned(&npc());
        assert_eq!(*seen.lock().unwrap(), 2);
    }

    #[test]
    fn unregister_removes_only_the_given_listener() {
        setup_testing();
        let registry = SpawnListenerRegistry::new(test_logger());
        let a = registry.register(|_: &Npc| -> anyhow::Result<()> { Ok(()) });
        let b = registry.register(|_: &Npc| -> anyhow::Result<()> { Ok(()) });
        assert!(registry.unregister(a));
        assert!(!registry.unregister(a));
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(b));
        assert!(registry.is_empty());
    }

    #[test]
    fn listeners_may_unregister_during_notification() {
        setup_testing();
        let registry = Arc::new(SpawnListenerRegistry::new(test_logger()));
        let r = Arc::clone(&registry);
        let id = Arc::new(Mutex::new(None));
        let id2 = Arc::clone(&id);
        let listener_id = registry.register(move |_: &Npc| -> anyhow::Result<()> {
            if let Some(id) = *id2.lock().unwrap() {
                r.unregister(id);
            }
            Ok(())
        });
        *id.lock().unwrap() = Some(listener_id);

        registry.notify_spawned(&npc());
        assert!(registry.is_empty());
    }
}
