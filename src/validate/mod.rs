//! Cycle and consistency validation
//!
//! - [`batch`]: whole-hierarchy checks after an import
//! - [`edge`]: single-change checks before a reparent is committed
//! - [`precheck`]: the in-memory shortcut run before a request is even sent

pub mod batch;
pub mod edge;
pub mod precheck;

pub use batch::{check_consistency, find_cycles, validate_employees, ValidationSummary};
pub use edge::{
    validate_move, Directory, DirectoryError, EditErrorCode, EditOutcome, EditRejection,
    EditValidation, MoveRequest,
};
pub use precheck::precheck_move;
