//! User records.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::record::Record;
use super::role::Role;
use super::validation::ValidationError;

/// A customer (or operator) account as the dashboard sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone1: String,
    #[serde(default)]
    pub phone2: String,
    /// Per-user PIN. Not used by the dashboard login gate.
    #[serde(default)]
    pub pin: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    /// Loyalty points.
    #[serde(default)]
    pub points: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub role: Role,
}

impl User {
    /// `"City, Country"`, skipping blank parts.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        let parts: Vec<&str> = [self.city.as_str(), self.country.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub phone1: String,
    pub phone2: String,
    pub pin: String,
    pub city: String,
    pub country: String,
    pub points: u32,
    pub role: Role,
}

impl NewUser {
    /// Check creation input before it reaches either store.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Required`] if the name is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required { field: "name" });
        }
        Ok(())
    }
}

/// Partial update for a user.
///
/// Only set fields are serialised. `password` is write-only: it is forwarded
/// to the remote store by the adapter but is never serialised here, so it can
/// never reach the local fallback blob.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip)]
    pub password: Option<SecretString>,
}

impl UserPatch {
    /// Patch that only sets the loyalty points.
    #[must_use]
    pub fn points(points: u32) -> Self {
        Self {
            points: Some(points),
            ..Self::default()
        }
    }

    /// Whether the patch changes anything, password included.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.name.is_none()
            && self.phone1.is_none()
            && self.phone2.is_none()
            && self.pin.is_none()
            && self.city.is_none()
            && self.country.is_none()
            && self.points.is_none()
            && self.role.is_none()
            && self.password.is_none()
    }

    /// Check update input before it reaches either store.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyUpdate`] for a patch with no fields and
    /// [`ValidationError::Required`] if the name is set to a blank value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ValidationError::Required { field: "name" });
        }
        Ok(())
    }
}

impl Record for User {
    type Id = UserId;
    type New = NewUser;
    type Patch = UserPatch;

    const KIND: &'static str = "user";

    fn validate_new(new: &NewUser) -> Result<(), ValidationError> {
        new.validate()
    }

    fn validate_patch(patch: &UserPatch) -> Result<(), ValidationError> {
        patch.validate()
    }

    fn id(&self) -> &UserId {
        &self.id
    }

    fn create(id: UserId, created_at: DateTime<Utc>, new: NewUser) -> Self {
        Self {
            id,
            email: new.email,
            name: new.name,
            phone1: new.phone1,
            phone2: new.phone2,
            pin: new.pin,
            city: new.city,
            country: new.country,
            points: new.points,
            created_at,
            role: new.role,
        }
    }

    fn patched(&self, patch: &UserPatch) -> Self {
        let mut user = self.clone();
        if let Some(email) = &patch.email {
            user.email.clone_from(email);
        }
        if let Some(name) = &patch.name {
            user.name.clone_from(name);
        }
        if let Some(phone1) = &patch.phone1 {
            user.phone1.clone_from(phone1);
        }
        if let Some(phone2) = &patch.phone2 {
            user.phone2.clone_from(phone2);
        }
        if let Some(pin) = &patch.pin {
            user.pin.clone_from(pin);
        }
        if let Some(city) = &patch.city {
            user.city.clone_from(city);
        }
        if let Some(country) = &patch.country {
            user.country.clone_from(country);
        }
        if let Some(points) = patch.points {
            user.points = points;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        user
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn alice() -> User {
        serde_json::from_value(serde_json::json!({
            "id": "1",
            "email": "alice@example.com",
            "name": "Alice Johnson",
            "phone1": "555-0101",
            "phone2": "555-0199",
            "pin": "1234",
            "city": "New York",
            "country": "USA",
            "points": 120,
            "created_at": "2023-01-15T10:00:00Z",
            "role": "user"
        }))
        .unwrap()
    }

    #[test]
    fn test_patch_changes_only_set_fields() {
        let user = alice();
        let updated = user.patched(&UserPatch::points(220));
        assert_eq!(updated.points, 220);
        assert_eq!(
            User {
                points: 120,
                ..updated
            },
            user
        );
    }

    #[test]
    fn test_patch_never_serialises_password() {
        let patch = UserPatch {
            password: Some(SecretString::from("hunter2")),
            ..UserPatch::points(5)
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "points": 5 }));
    }

    #[test]
    fn test_password_only_patch_is_not_empty() {
        let patch = UserPatch {
            password: Some(SecretString::from("hunter2")),
            ..UserPatch::default()
        };
        assert!(!patch.is_empty());
        assert!(patch.validate().is_ok());
        assert_eq!(
            UserPatch::default().validate(),
            Err(ValidationError::EmptyUpdate)
        );
    }

    #[test]
    fn test_missing_role_reads_as_user() {
        let mut raw = serde_json::to_value(alice()).unwrap();
        raw.as_object_mut().unwrap().remove("role");
        let user: User = serde_json::from_value(raw).unwrap();
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn test_location() {
        let mut user = alice();
        assert_eq!(user.location().as_deref(), Some("New York, USA"));
        user.city.clear();
        assert_eq!(user.location().as_deref(), Some("USA"));
        user.country.clear();
        assert_eq!(user.location(), None);
    }

    #[test]
    fn test_new_user_requires_name() {
        assert_eq!(
            NewUser::default().validate(),
            Err(ValidationError::Required { field: "name" })
        );
    }
}
