// adsync-core: Referentially consistent directory graph with load/synchronize
// against a Directory Connector.

pub mod config;
pub mod connector;
pub mod error;
pub mod graph;
pub mod model;
pub mod plan;
pub mod reconcile;
pub mod registry;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ContainerSpec, DirectoryConfig};
pub use connector::{
    AttributeMap, AttributeValue, ConnectorError, DirectoryConnector, Entry, Filter,
    MemoryDirectory, OperationResult, ResultCode, SearchScope, SecurityIdentifier,
};
pub use error::CoreError;
pub use graph::DirectoryGraph;
pub use plan::{Plan, PlanOutcome, PlannedGroup, PlannedPosix, PlannedUser, apply_plan};
pub use reconcile::{LoadReport, ReconcileIssue, Severity, SyncReport};
pub use registry::IdentityRegistry;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    // Objects
    Container, Group, User,
    // Handles and identifiers
    AccountId, ContainerHandle, GraphId, GroupHandle, GroupId, IdNamespace, ObjectKind,
    RelativeId, UserHandle,
    // Construction
    NewGroup, NewPosixAccount, NewPosixGroup, NewUser,
    // Supporting types
    AccountControl, ContainerKind, GroupType, ObjectState, PosixAccount, PosixAttributes,
    PosixGroup, PosixGroupAttributes, ShadowFields,
};
