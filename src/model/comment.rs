use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::model::user::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub defect_id: String,
    pub text: String,
    pub author: Role,
    pub created_at: DateTime<Utc>,
}
