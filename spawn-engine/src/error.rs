use crate::indices::{LocationId, TemplateId};
use crate::npc::NpcKind;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum FactoryError {
    #[error("No constructor is registered for npc kind {0:?}")]
    UnknownKind(NpcKind),
    #[error("Failed to bind template {template} to a new npc: {reason}")]
    Binding { template: TemplateId, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum SpawnError {
    #[error("Template {template} names npc kind {kind:?}, which has no constructor")]
    UnknownKind { template: TemplateId, kind: NpcKind },
    #[error("Area {0} is unknown to the area resolver")]
    UnknownArea(LocationId),
    #[error("Spawn of template {0} has neither coordinates nor an area")]
    NoSpawnLocation(TemplateId),
    #[error("Failed to construct npc: {0}")]
    Construction(#[from] FactoryError),
    #[error("Spawn of template {0} is full")]
    CapacityReached(TemplateId),
    #[error("Spawn group has no template")]
    Inert,
}
