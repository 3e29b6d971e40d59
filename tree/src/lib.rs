//! Canopy Tree
//!
//! Hierarchical content storage addressed by workspace and dimension point.
//!
//! - `TreeAccessor` is the read/write trait the patch engine works against
//! - `ContentRepository` is the in-memory implementation, with snapshots
//!   used to undo a unit of work

mod accessor;
mod node;
mod repository;
mod subgraph;

pub use accessor::{CreateNodeCommand, TreeAccessor, TreeContext};
pub use node::{AssetInfo, NodeView};
pub use repository::{ContentRepository, RepositorySnapshot};
pub use subgraph::is_valid_node_name;
