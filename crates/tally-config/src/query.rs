//! Free-form query configuration.

use serde::{Deserialize, Serialize};
use tally_core::enums::SqlPolicy;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Which model-authored statements may run.
    #[serde(default)]
    pub policy: SqlPolicy,
}
