use serde::Deserialize;
use uuid::Uuid;

/// Team aggregate root
///
/// A team owns zero or more members by reference: members carry an optional
/// `teamId` pointing back at a team. Deleting a team does not cascade, so
/// dangling references are possible by design.
///
/// # Invariants
/// - Name cannot be empty
/// - Id is system-generated and immutable after creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl Team {
    /// Creates a new Team with a generated id
    ///
    /// # Returns
    /// * `Ok(Team)` - New team
    /// * `Err(String)` - If the name is empty
    pub fn new(data: TeamData) -> Result<Self, String> {
        data.validate()?;

        Ok(Self {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
        })
    }

    /// Returns the team's ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns the team's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the team's description if one was set
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Reconstructs a Team from persistence layer data
    ///
    /// Bypasses validation since the data was validated when written.
    /// Only to be used by repository implementations.
    pub fn from_persistence(id: Uuid, name: String, description: Option<String>) -> Self {
        Self {
            id,
            name,
            description,
        }
    }
}

/// Full (non-id) team payload used by create and replace operations
#[derive(Debug, Clone, Deserialize)]
pub struct TeamData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl TeamData {
    /// Checks the required-field rules
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Team name cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Partial team payload used by patch operations
///
/// Absent fields leave the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl TeamPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }

    /// Checks the rules for any fields the patch provides
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Team name cannot be empty".to_string());
            }
        }

        Ok(())
    }
}
