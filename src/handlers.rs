use crate::{
    AppState,
    auth::{AuthUser, TokenSubject},
    guard::ONBOARDED_KEY,
    models::{
        Course, CreateCourseRequest, CreateProfileRequest, OnboardingResponse, Role,
        StudentProfile, UpdateCourseRequest, User,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

/// Whether `caller` may modify `course`: admins always, instructors only their own.
fn can_manage(caller: &AuthUser, course: &Course) -> bool {
    match caller.role {
        Role::Admin => true,
        Role::Instructor => course.instructor_id == caller.id,
        Role::Student => false,
    }
}

// --- Identity ---

/// get_me
///
/// [Authenticated Route] Returns the resolved identity, including the student profile.
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_me(AuthUser { user, .. }: AuthUser) -> Json<User> {
    Json(user)
}

/// create_profile
///
/// [Token Route] Provisions the profile for a token subject that has none yet.
/// Students start with an un-onboarded profile. Admins are never self-provisioned.
#[utoipa::path(
    post,
    path = "/api/me/profile",
    request_body = CreateProfileRequest,
    responses(
        (status = 201, description = "Profile created", body = User),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Admin profiles cannot be self-provisioned"),
        (status = 409, description = "Profile already exists"),
        (status = 422, description = "Blank email")
    )
)]
pub async fn create_profile(
    TokenSubject(id): TokenSubject,
    State(state): State<AppState>,
    Json(payload): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    let email = payload.email.trim().to_string();
    if email.is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let user = match payload.role {
        Role::Student => User::Student {
            id,
            email,
            student_profile: Some(StudentProfile::default()),
        },
        Role::Instructor => User::Instructor { id, email },
        Role::Admin => return Err(StatusCode::FORBIDDEN),
    };

    if state.repo.get_user(id).await.is_some() {
        return Err(StatusCode::CONFLICT);
    }

    let user = state
        .repo
        .create_user(user)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(user_id = %id, role = user.role().as_str(), "profile provisioned");
    Ok((StatusCode::CREATED, Json(user)))
}

/// complete_onboarding
///
/// [Authenticated Route] Marks the calling student as onboarded and sets the
/// `onboarded=true` cookie the page guard reads as its fallback flag.
#[utoipa::path(
    post,
    path = "/api/me/onboarding",
    responses(
        (status = 200, description = "Onboarded", body = OnboardingResponse),
        (status = 403, description = "Only students onboard"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn complete_onboarding(
    AuthUser { id, role, .. }: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<OnboardingResponse>), StatusCode> {
    if role != Role::Student {
        return Err(StatusCode::FORBIDDEN);
    }

    let user = state
        .repo
        .set_onboarded(id)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;

    tracing::info!(user_id = %id, "student onboarding completed");

    let cookie = Cookie::build((ONBOARDED_KEY, "true"))
        .path("/")
        .same_site(SameSite::Lax)
        .build();
    Ok((jar.add(cookie), Json(OnboardingResponse { user })))
}

// --- Courses ---

/// list_courses
///
/// [Authenticated Route] Lists every course, ordered by course code.
#[utoipa::path(
    get,
    path = "/api/courses",
    responses((status = 200, description = "Courses", body = [Course]))
)]
pub async fn list_courses(_caller: AuthUser, State(state): State<AppState>) -> Json<Vec<Course>> {
    Json(state.repo.list_courses().await)
}

/// get_course
///
/// [Authenticated Route] Retrieves a single course.
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    responses(
        (status = 200, description = "Course", body = Course),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_course(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Course>, StatusCode> {
    state
        .repo
        .get_course(id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// create_course
///
/// [Instructor/Admin Route] Creates a course owned by the caller.
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Created", body = Course),
        (status = 403, description = "Students cannot create courses")
    )
)]
pub async fn create_course(
    AuthUser { id, role, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, StatusCode> {
    if role == Role::Student {
        return Err(StatusCode::FORBIDDEN);
    }
    if payload.code.trim().is_empty() || payload.title.trim().is_empty() {
        return Err(StatusCode::UNPROCESSABLE_ENTITY);
    }

    let course = state
        .repo
        .create_course(payload, id)
        .await
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

    tracing::info!(course_id = %course.id, code = %course.code, "course created");
    Ok((StatusCode::CREATED, Json(course)))
}

/// update_course
///
/// [Instructor/Admin Route] Partial update. Instructors may only edit their own
/// courses; a course they do not own is reported as 404.
#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated", body = Course),
        (status = 403, description = "Students cannot edit courses"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_course(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCourseRequest>,
) -> Result<Json<Course>, StatusCode> {
    if caller.role == Role::Student {
        return Err(StatusCode::FORBIDDEN);
    }

    let course = state.repo.get_course(id).await.ok_or(StatusCode::NOT_FOUND)?;
    if !can_manage(&caller, &course) {
        return Err(StatusCode::NOT_FOUND);
    }

    state
        .repo
        .update_course(id, payload)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// delete_course
///
/// [Instructor/Admin Route] Admins may delete any course; instructors only their own.
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Students cannot delete courses"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_course(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if caller.role == Role::Student {
        return StatusCode::FORBIDDEN;
    }

    match state.repo.get_course(id).await {
        Some(course) if can_manage(&caller, &course) => {
            if state.repo.delete_course(id).await {
                tracing::info!(course_id = %id, "course deleted");
                StatusCode::NO_CONTENT
            } else {
                StatusCode::NOT_FOUND
            }
        }
        _ => StatusCode::NOT_FOUND,
    }
}
