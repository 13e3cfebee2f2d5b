//! Runtime services: CRUD through the safe SQL builder, record validation, relation expansion.

mod crud;
mod expand;
mod validation;
pub use crud::CrudService;
pub use expand::expand;
pub use validation::{RecordValidator, WriteMode};
