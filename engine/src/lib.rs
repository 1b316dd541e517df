//! An in-memory genealogy database over already-parsed GEDCOM record trees: arena-backed nodes,
//! a record index, a name index, lineage traversal, a validator, and a Sequence algebra for
//! ancestor/descendant/sibling/spouse queries and set operations.
//!
//! This crate does not parse GEDCOM text itself. It consumes record roots that some external
//! reader has already produced (see [`Database::ingest`]) and builds everything downstream of
//! that: indexing, validation, and querying.

pub mod algebra;
pub mod cancel;
pub mod database;
pub mod error;
pub mod key;
pub mod lineage;
pub mod name_index;
pub mod node;
pub mod partition;
pub mod record_index;
pub mod sequence;
pub mod validator;

pub use cancel::CancelToken;
pub use database::{Database, DatabaseConfig};
pub use error::{EngineError, ErrorEntry, ErrorKind, ErrorLog};
pub use key::{RecordKey, RecordType};
pub use node::{Arena, NodeId};
pub use partition::ReachabilityTable;
pub use sequence::{Annotation, Sequence, SortType};
