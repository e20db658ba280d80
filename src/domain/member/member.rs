use serde::{Deserialize, Deserializer};
use uuid::Uuid;

/// Member aggregate root
///
/// A member may hold a non-owning reference to a team through `team_id`
/// (wire name `teamId`). Whether that reference points at a live team is
/// enforced at write time by the referential-integrity gate, not here and
/// not by a database constraint.
///
/// # Invariants
/// - Name and role cannot be empty
/// - Id is system-generated and immutable after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: Uuid,
    name: String,
    role: String,
    team_id: Option<Uuid>,
}

impl Member {
    /// Creates a new Member with a generated id
    ///
    /// # Returns
    /// * `Ok(Member)` - New member
    /// * `Err(String)` - If the name or role is empty
    pub fn new(data: MemberData) -> Result<Self, String> {
        data.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            name: data.name,
            role: data.role,
            team_id: data.team_id,
        })
    }

    /// Returns the member's ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the member's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the member's role
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Returns the referenced team id if the member belongs to a team
    pub fn team_id(&self) -> Option<Uuid> {
        self.team_id
    }

    /// Reconstructs a Member from persistence layer data
    ///
    /// Bypasses validation since the data was validated when written.
    /// Only to be used by repository implementations.
    pub fn from_persistence(id: Uuid, name: String, role: String, team_id: Option<Uuid>) -> Self {
        Self {
            id,
            name,
            role,
            team_id,
        }
    }
}

/// Full (non-id) member payload used by create and replace operations
#[derive(Debug, Clone, Deserialize)]
pub struct MemberData {
    pub name: String,
    pub role: String,
    #[serde(default, rename = "teamId")]
    pub team_id: Option<Uuid>,
}

impl MemberData {
    /// Checks the required-field rules
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Member name cannot be empty".to_string());
        }

        if self.role.trim().is_empty() {
            return Err("Member role cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Partial member payload used by patch operations
///
/// `team_id` distinguishes three states: field absent leaves the stored
/// value unchanged, explicit `null` clears the team association, and a
/// value sets it (subject to the referential-integrity gate).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(
        default,
        rename = "teamId",
        deserialize_with = "deserialize_double_option"
    )]
    pub team_id: Option<Option<Uuid>>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.role.is_none() && self.team_id.is_none()
    }

    /// Checks the rules for any fields the patch provides
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Member name cannot be empty".to_string());
            }
        }

        if let Some(role) = &self.role {
            if role.trim().is_empty() {
                return Err("Member role cannot be empty".to_string());
            }
        }

        Ok(())
    }
}

/// Keeps the outer Option as presence and the inner as nullability, so a
/// patch can tell "teamId absent" apart from "teamId: null"
fn deserialize_double_option<'de, D>(deserializer: D) -> Result<Option<Option<Uuid>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Uuid>::deserialize(deserializer).map(Some)
}
