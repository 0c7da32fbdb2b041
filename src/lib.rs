//! Knowledge-graph exploration core: a node/link store with nested
//! sessions, a force-directed layout engine, type filtering and selection,
//! and a boundary for background suggestion providers.

pub mod config;
pub mod expansion;
pub mod explorer;
pub mod filter;
pub mod graph;
pub mod logging;
pub mod notify;
pub mod physics;
pub mod session;
pub mod util;

pub use config::ExplorerConfig;
pub use explorer::{Explorer, RenderLink, RenderNode, RenderSnapshot};
pub use graph::{GraphData, GraphError, GraphStore, Link, LinkKind, Node, NodePatch, NodeType};
pub use physics::{PhysicsConfig, PhysicsEngine};
pub use session::{SeedFile, SeedFileError, SessionSnapshot, Workspace};
