#![allow(dead_code)]

use course_portal::{
    AppConfig, AppState, InMemoryRepository, MemStorage,
    auth::Claims,
    config::Env,
    models::{StudentProfile, User},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{path::Path, sync::Arc, time::SystemTime};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

pub const STUDENT_ID: Uuid = Uuid::from_u128(1);
pub const ONBOARDED_STUDENT_ID: Uuid = Uuid::from_u128(2);
pub const INSTRUCTOR_ID: Uuid = Uuid::from_u128(3);
pub const OTHER_INSTRUCTOR_ID: Uuid = Uuid::from_u128(4);
pub const ADMIN_ID: Uuid = Uuid::from_u128(5);

pub const INDEX_HTML: &str = "<!doctype html><div id=\"root\"></div>";

pub fn student(onboarded: bool) -> User {
    User::Student {
        id: STUDENT_ID,
        email: "student@example.com".to_string(),
        student_profile: Some(StudentProfile { onboarded }),
    }
}

pub fn instructor() -> User {
    User::Instructor {
        id: INSTRUCTOR_ID,
        email: "instructor@example.com".to_string(),
    }
}

pub fn admin() -> User {
    User::Admin {
        id: ADMIN_ID,
        email: "admin@example.com".to_string(),
    }
}

pub fn seeded_users() -> Vec<User> {
    vec![
        student(false),
        User::Student {
            id: ONBOARDED_STUDENT_ID,
            email: "returning@example.com".to_string(),
            student_profile: Some(StudentProfile { onboarded: true }),
        },
        instructor(),
        User::Instructor {
            id: OTHER_INSTRUCTOR_ID,
            email: "other@example.com".to_string(),
        },
        admin(),
    ]
}

pub fn create_token(user_id: Uuid, exp_offset: i64) -> String {
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let claims = Claims {
        sub: user_id,
        iat: now as usize,
        exp: (now + exp_offset) as usize,
    };

    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

pub fn create_app_state(env: Env, repo: InMemoryRepository, static_dir: &Path) -> AppState {
    let mut config = AppConfig::default();
    config.env = env;
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    config.static_dir = static_dir.to_path_buf();

    AppState {
        repo: Arc::new(repo),
        storage: Arc::new(MemStorage::new()),
        config,
    }
}

/// A throwaway build directory containing `index.html` and one asset.
pub fn build_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), INDEX_HTML).unwrap();
    std::fs::create_dir(dir.path().join("assets")).unwrap();
    std::fs::write(dir.path().join("assets/app.js"), "console.log('app');").unwrap();
    dir
}
