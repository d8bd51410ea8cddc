use serde::{Deserialize, Serialize};

/// Reserved prefix marking ad-hoc members that do not come from the HR registry.
pub const EXTERNAL_ID_PREFIX: &str = "prestador_";

/// Sector assigned to externally-sourced members, who have no HR sector of their own.
pub const EXTERNAL_SECTOR: &str = "Prestador de serviço";

/// Identity shared by leaders and collaborators (HR registration number or synthetic id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub String);

impl PersonId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Build a synthetic identity for someone outside the HR registry.
    pub fn external(suffix: &str) -> Self {
        Self(format!("{EXTERNAL_ID_PREFIX}{suffix}"))
    }

    pub fn is_external(&self) -> bool {
        self.0.starts_with(EXTERNAL_ID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChaplainId(pub String);

impl ChaplainId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChaplainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaderRole {
    Admin,
    Leader,
    Chaplain,
}

impl LeaderRole {
    pub const fn label(self) -> &'static str {
        match self {
            LeaderRole::Admin => "ADMIN",
            LeaderRole::Leader => "LEADER",
            LeaderRole::Chaplain => "CHAPLAIN",
        }
    }
}

/// Person responsible for exactly one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub contact: String,
    pub unit: String,
    pub sector: String,
    pub group_name: String,
    pub role: LeaderRole,
}

impl Leader {
    pub fn is_admin(&self) -> bool {
        self.role == LeaderRole::Admin
    }
}

/// Member record, either sourced from HR or created ad hoc for an external person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    pub id: PersonId,
    pub name: String,
    pub sector: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Collaborator {
    /// Synthetic record for a person outside the HR registry.
    pub fn external(id: PersonId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sector: EXTERNAL_SECTOR.to_string(),
            group: None,
            active: true,
        }
    }

    pub fn is_external(&self) -> bool {
        self.id.is_external()
    }

    /// Group the member currently counts towards, if any.
    pub fn active_group(&self) -> Option<&str> {
        if !self.active {
            return None;
        }
        self.group
            .as_deref()
            .map(str::trim)
            .filter(|group| !group.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chaplain {
    pub id: ChaplainId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub unit: String,
}

/// Case- and whitespace-insensitive form used when comparing sectors, units and group names.
pub fn normalize_label(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn same_label(left: &str, right: &str) -> bool {
    normalize_label(left) == normalize_label(right)
}
