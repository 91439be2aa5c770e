use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Identity ---

/// Role
///
/// The RBAC discriminator. Serialized lowercase on the wire and stored as text in
/// the `profiles.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Student,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = UserRowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "admin" => Ok(Role::Admin),
            other => Err(UserRowError::UnknownRole(other.to_string())),
        }
    }
}

/// StudentProfile
///
/// Student-only profile data. `onboarded` flips once the first-run flow completes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StudentProfile {
    pub onboarded: bool,
}

/// User
///
/// The canonical identity resolved during authentication, keyed by role so that
/// role-specific fields only exist where they make sense. Serialized with an
/// internal `role` tag, e.g. `{"role":"student","id":...,"studentProfile":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "role", rename_all = "lowercase")]
#[ts(export)]
pub enum User {
    Student {
        id: Uuid,
        email: String,
        #[serde(rename = "studentProfile", default)]
        student_profile: Option<StudentProfile>,
    },
    Instructor {
        id: Uuid,
        email: String,
    },
    Admin {
        id: Uuid,
        email: String,
    },
}

impl User {
    pub fn id(&self) -> Uuid {
        match self {
            User::Student { id, .. } | User::Instructor { id, .. } | User::Admin { id, .. } => *id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            User::Student { email, .. }
            | User::Instructor { email, .. }
            | User::Admin { email, .. } => email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            User::Student { .. } => Role::Student,
            User::Instructor { .. } => Role::Instructor,
            User::Admin { .. } => Role::Admin,
        }
    }
}

/// UserRow
///
/// Flat mapping of the `public.profiles` table. `onboarded` is only meaningful for
/// students; it is NULL for every other role and for students without a profile.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub onboarded: Option<bool>,
}

/// Raised when a persisted profile cannot be turned back into a `User`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserRowError {
    #[error("unknown role `{0}` in profiles table")]
    UnknownRole(String),
}

impl TryFrom<UserRow> for User {
    type Error = UserRowError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let user = match row.role.parse::<Role>()? {
            Role::Student => User::Student {
                id: row.id,
                email: row.email,
                student_profile: row.onboarded.map(|onboarded| StudentProfile { onboarded }),
            },
            Role::Instructor => User::Instructor {
                id: row.id,
                email: row.email,
            },
            Role::Admin => User::Admin {
                id: row.id,
                email: row.email,
            },
        };
        Ok(user)
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        let onboarded = match user {
            User::Student {
                student_profile, ..
            } => student_profile.as_ref().map(|p| p.onboarded),
            _ => None,
        };
        UserRow {
            id: user.id(),
            email: user.email().to_string(),
            role: user.role().as_str().to_string(),
            onboarded,
        }
    }
}

/// CreateProfileRequest
///
/// Request body for `POST /api/me/profile`. The id comes from the token subject.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateProfileRequest {
    pub email: String,
    pub role: Role,
}

// --- Courses ---

/// Course
///
/// A course record from the `public.courses` table, owned by the instructor who created it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    // Short catalogue code, e.g. "CS101".
    pub code: String,
    pub title: String,
    pub description: String,
    // FK to public.profiles.id (Owner).
    pub instructor_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// CreateCourseRequest
///
/// Request body for `POST /api/courses`. The owner is taken from the authenticated
/// identity, never from the payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCourseRequest {
    pub code: String,
    pub title: String,
    pub description: String,
}

/// UpdateCourseRequest
///
/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateCourseRequest {
    pub code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// OnboardingResponse
///
/// Returned by `POST /api/me/onboarding` with the refreshed identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OnboardingResponse {
    pub user: User,
}
