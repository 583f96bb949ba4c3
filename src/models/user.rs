use serde::{Deserialize, Serialize};

/// Public view of an account. The password hash never leaves the
/// database layer.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}
