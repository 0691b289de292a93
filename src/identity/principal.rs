use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRef {
    pub name: String,
}

/// Student record linked to the logged-in account, if any.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentLink {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub student_id_number: String,
    #[serde(default)]
    pub full_name: String,
}

/// The authenticated principal as returned by the identity endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleRef>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub student: Option<StudentLink>,
}

impl Identity {
    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}
