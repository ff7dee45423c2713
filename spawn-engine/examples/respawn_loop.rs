//! Runs a small world for a few simulated minutes, killing a random npc every tick.
//!
use rand::Rng;
use slog::{info, o};
use spawn_engine::prelude::*;
use spawn_engine::services::AreaBounds;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct World {
    npcs: Mutex<Vec<Npc>>,
}

impl WorldView for World {
    fn insert(&self, npc: Npc, _position: WorldPosition) {
        self.npcs.lock().unwrap().push(npc);
    }
}

fn main() {
    std::env::set_var("RUST_LOG", "info,spawn_engine=debug");
    let logger = spawn_engine::default_logger();

    let world = Arc::new(World::default());
    let scheduler = Arc::new(TickScheduler::new());
    let areas = Arc::new(StaticAreas::default());
    areas.insert(
        LocationId(1),
        AreaBounds {
            min: WorldPosition::new(-500, -500, -20),
            max: WorldPosition::new(500, 500, 20),
        },
    );

    let context = Arc::new(
        SpawnContext::new(
            logger.new(o!("world" => "demo")),
            SpawnConfig::default(),
            world.clone(),
            scheduler.clone(),
        )
        .with_areas(areas),
    );
    let registry = EntityRegistry::with_defaults();

    let table = SpawnTable::new(logger.clone());
    for (id, amount) in [(20001, 6), (20002, 3)].iter() {
        let mut template = NpcTemplate::new(TemplateId(*id), NpcKind::Monster);
        template.level = 25;
        let group = SpawnGroup::new(context.clone(), Arc::new(template), &registry)
            .expect("default registry constructs monsters");
        group.set_location_id(LocationId(1));
        group.set_heading(RANDOM_HEADING);
        group.set_amount(*amount);
        group.set_respawn_delay(20, 5);
        table.add(group);
    }
    table.fill_all();

    let mut rng = rand::thread_rng();
    for tick in 0..180 {
        let victim = {
            let mut npcs = world.npcs.lock().unwrap();
            if npcs.is_empty() {
                None
            } else {
                let i = rng.gen_range(0, npcs.len());
                Some(npcs.swap_remove(i))
            }
        };
        if let Some(npc) = victim {
            notify_removed(npc);
        }
        scheduler.advance(Duration::from_secs(1));

        if tick % 30 == 0 {
            info!(
                logger,
                "tick {}: {} npcs alive, {} respawns pending",
                tick,
                world.npcs.lock().unwrap().len(),
                scheduler.pending()
            );
        }
    }
    table.clear();
}
