use serde::{Deserialize, Serialize};

use super::enums::Role;

/// Identity record owned by the backend; the client holds a read-only,
/// session-scoped copy. Ids are backend-issued opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub name: String,
    pub phone: Option<String>,
}

impl User {
    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }
}
