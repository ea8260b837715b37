//! Built-in lint rules.

pub mod duplicate_assignment;
pub mod empty_block;
pub mod unresolved_node;

pub use duplicate_assignment::DuplicateAssignmentRule;
pub use empty_block::EmptyBlockRule;
pub use unresolved_node::UnresolvedNodeRule;
