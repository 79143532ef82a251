// querypilot-agent: the SQL analytics assistant
//
// Binds the control loop from querypilot-core to the Postgres backend from
// querypilot-db: the two database tools, the system prompt, environment
// settings and the Assistant entrypoint that owns per-thread state.

pub mod assistant;
pub mod prompts;
pub mod settings;
pub mod tools;

pub use assistant::Assistant;
pub use settings::Settings;
pub use tools::{GetSchemaTool, RunQueryTool};
