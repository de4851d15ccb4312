use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A row of the `profiles` table; `id` is the auth account id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileRow {
    pub id: Uuid,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfilePatch {
    pub full_name: String,
}
