// Git module.
// Working-copy operations and the run lock used by the publisher.

pub mod lock;
pub mod repo;

pub use lock::RunLock;
pub use repo::Repository;
