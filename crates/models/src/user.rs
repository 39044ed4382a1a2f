use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Public projection of a user, as returned by `?action=me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_serializes_null_image() {
        let profile = UserProfile {
            id: Uuid::nil(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            image: None,
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["email"], "ann@x.com");
        assert!(json["image"].is_null());
        assert_eq!(json.as_object().unwrap().len(), 4);
    }
}
