use crate::models::{Course, CreateCourseRequest, UpdateCourseRequest, User, UserRow};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The persistence contract used by handlers and the auth extractor. Handlers only see
/// `Arc<dyn Repository>`, so Postgres and the in-memory store are interchangeable.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- User/Auth ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    async fn create_user(&self, user: User) -> Option<User>;
    /// Marks a student's profile as onboarded. Returns `None` for unknown ids and
    /// for non-student users.
    async fn set_onboarded(&self, id: Uuid) -> Option<User>;

    // --- Courses ---
    async fn list_courses(&self) -> Vec<Course>;
    async fn get_course(&self, id: Uuid) -> Option<Course>;
    async fn create_course(&self, req: CreateCourseRequest, instructor_id: Uuid) -> Option<Course>;
    // Partial update. `None` fields keep their stored value.
    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> Option<Course>;
    async fn delete_course(&self, id: Uuid) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

fn user_from_row(row: UserRow) -> Option<User> {
    User::try_from(row)
        .map_err(|e| tracing::error!("profile row rejected: {e}"))
        .ok()
}

// --- Postgres ---

const COURSE_COLUMNS: &str = "id, code, title, description, instructor_id, created_at";

/// PostgresRepository
///
/// `Repository` backed by the `profiles` and `courses` tables (see `sql/schema.sql`).
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, UserRow>("SELECT id, email, role, onboarded FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
            .and_then(user_from_row)
    }

    async fn create_user(&self, user: User) -> Option<User> {
        let row = UserRow::from(&user);
        sqlx::query_as::<_, UserRow>(
            "INSERT INTO profiles (id, email, role, onboarded) VALUES ($1, $2, $3, $4) \
             RETURNING id, email, role, onboarded",
        )
        .bind(row.id)
        .bind(row.email)
        .bind(row.role)
        .bind(row.onboarded)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| tracing::error!("create_user error: {:?}", e))
        .ok()
        .and_then(user_from_row)
    }

    /// set_onboarded
    ///
    /// The `role = 'student'` predicate keeps the flag NULL for every other role.
    async fn set_onboarded(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, UserRow>(
            "UPDATE profiles SET onboarded = true WHERE id = $1 AND role = 'student' \
             RETURNING id, email, role, onboarded",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_onboarded error: {:?}", e);
            None
        })
        .and_then(user_from_row)
    }

    async fn list_courses(&self) -> Vec<Course> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses ORDER BY code ASC");
        match sqlx::query_as::<_, Course>(&sql).fetch_all(&self.pool).await {
            Ok(courses) => courses,
            Err(e) => {
                tracing::error!("list_courses error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_course(&self, id: Uuid) -> Option<Course> {
        let sql = format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1");
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_course error: {:?}", e);
                None
            })
    }

    async fn create_course(&self, req: CreateCourseRequest, instructor_id: Uuid) -> Option<Course> {
        let sql = format!(
            "INSERT INTO courses (id, code, title, description, instructor_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.code)
            .bind(req.title)
            .bind(req.description)
            .bind(instructor_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| tracing::error!("create_course error: {:?}", e))
            .ok()
    }

    /// update_course
    ///
    /// `COALESCE` maps `Option<T>` onto "keep the stored column".
    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> Option<Course> {
        let sql = format!(
            "UPDATE courses \
             SET code = COALESCE($2, code), \
                 title = COALESCE($3, title), \
                 description = COALESCE($4, description) \
             WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        );
        sqlx::query_as::<_, Course>(&sql)
            .bind(id)
            .bind(req.code)
            .bind(req.title)
            .bind(req.description)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("update_course error: {:?}", e);
                None
            })
    }

    async fn delete_course(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_course error: {:?}", e);
                false
            }
        }
    }
}

// --- In-memory ---

/// InMemoryRepository
///
/// Process-local `Repository` used when no `DATABASE_URL` is configured in local mode,
/// and as the test double for handler tests.
#[derive(Default)]
pub struct InMemoryRepository {
    users: RwLock<HashMap<Uuid, User>>,
    courses: RwLock<HashMap<Uuid, Course>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let users = users.into_iter().map(|u| (u.id(), u)).collect();
        Self {
            users: RwLock::new(users),
            courses: RwLock::default(),
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.read().await.get(&id).cloned()
    }

    async fn create_user(&self, user: User) -> Option<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id()) {
            return None;
        }
        users.insert(user.id(), user.clone());
        Some(user)
    }

    async fn set_onboarded(&self, id: Uuid) -> Option<User> {
        let mut users = self.users.write().await;
        match users.get_mut(&id)? {
            User::Student {
                student_profile, ..
            } => {
                student_profile.get_or_insert_with(Default::default).onboarded = true;
            }
            User::Instructor { .. } | User::Admin { .. } => return None,
        }
        users.get(&id).cloned()
    }

    async fn list_courses(&self) -> Vec<Course> {
        let mut courses: Vec<Course> = self.courses.read().await.values().cloned().collect();
        courses.sort_by(|a, b| a.code.cmp(&b.code));
        courses
    }

    async fn get_course(&self, id: Uuid) -> Option<Course> {
        self.courses.read().await.get(&id).cloned()
    }

    async fn create_course(&self, req: CreateCourseRequest, instructor_id: Uuid) -> Option<Course> {
        let course = Course {
            id: Uuid::new_v4(),
            code: req.code,
            title: req.title,
            description: req.description,
            instructor_id,
            created_at: Utc::now(),
        };
        self.courses.write().await.insert(course.id, course.clone());
        Some(course)
    }

    async fn update_course(&self, id: Uuid, req: UpdateCourseRequest) -> Option<Course> {
        let mut courses = self.courses.write().await;
        let course = courses.get_mut(&id)?;
        if let Some(code) = req.code {
            course.code = code;
        }
        if let Some(title) = req.title {
            course.title = title;
        }
        if let Some(description) = req.description {
            course.description = description;
        }
        Some(course.clone())
    }

    async fn delete_course(&self, id: Uuid) -> bool {
        self.courses.write().await.remove(&id).is_some()
    }
}
