//! Domain models produced by the parsers and consumed by the generators.

pub mod process;
pub mod schema;

pub use process::{
    Activity, ActivityConfig, ActivityKind, ActivitySettings, FaultHandler, Group, GroupKind,
    Mapping, MappingKind, Position, Process, Starter, StarterKind, Transition, TransitionKind,
    Variable, VariableScope, UNNAMED_PROCESS,
};
pub use schema::{
    Element, Import, MaxOccurs, Restriction, RestrictionKind, RestrictionValue, Schema,
    SchemaType, TypeKind, UNBOUNDED,
};
