// querypilot-db: Postgres query execution and schema introspection
//
// Wraps a sqlx connection pool behind the QueryBackend trait the agent's
// tools depend on, with retry handling for transient failures.

pub mod error;
pub mod executor;
pub mod retry;

pub use error::{DbError, Result};
pub use executor::{QueryBackend, QueryRows, SchemaDescriptor, SqlExecutor};
pub use retry::RetryPolicy;
