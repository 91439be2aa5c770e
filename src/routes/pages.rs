use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    auth::resolve_auth_state,
    guard::{self, GuardParams, KeyValueStore, View},
    models::Role,
};

/// A client route whose HTML entry point is gated by the route guard.
#[derive(Debug, Clone, Copy)]
pub struct ProtectedPage {
    pub prefix: &'static str,
    pub params: GuardParams,
}

/// Protected client routes. Matching is by path segment prefix.
pub const PROTECTED_PAGES: &[ProtectedPage] = &[
    ProtectedPage {
        prefix: "/dashboard",
        params: GuardParams {
            required_role: None,
            require_onboarded: true,
        },
    },
    ProtectedPage {
        prefix: "/courses",
        params: GuardParams {
            required_role: None,
            require_onboarded: true,
        },
    },
    // Must not require onboarding, or students could never reach it.
    ProtectedPage {
        prefix: "/onboarding",
        params: GuardParams {
            required_role: None,
            require_onboarded: false,
        },
    },
    ProtectedPage {
        prefix: "/instructor",
        params: GuardParams {
            required_role: Some(Role::Instructor),
            require_onboarded: false,
        },
    },
    ProtectedPage {
        prefix: "/admin",
        params: GuardParams {
            required_role: Some(Role::Admin),
            require_onboarded: false,
        },
    },
];

/// Returns the guard parameters for `path`, or `None` if the path is not protected.
pub fn guard_params_for(path: &str) -> Option<GuardParams> {
    PROTECTED_PAGES
        .iter()
        .find(|page| {
            path.strip_prefix(page.prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .map(|page| page.params)
}

/// Request cookies stand in for browser local storage on the server side.
impl KeyValueStore for CookieJar {
    fn get(&self, key: &str) -> Option<String> {
        CookieJar::get(self, key).map(|cookie| cookie.value().to_string())
    }
}

/// page_guard
///
/// Evaluates the route guard for protected client paths before the SPA entry point
/// is served:
/// - redirect: `303 See Other` to the guard's target
/// - nothing to render: `204 No Content`
/// - children: the request continues to the static service
pub async fn page_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(params) = guard_params_for(request.uri().path()) else {
        return next.run(request).await;
    };

    let (parts, body) = request.into_parts();
    let auth = resolve_auth_state(&parts, &state.repo, &state.config).await;
    let jar = CookieJar::from_headers(&parts.headers);
    let outcome = guard::evaluate(&auth, &params, &jar);

    if let Some(target) = outcome.navigate {
        tracing::debug!(path = %parts.uri.path(), to = target.path(), "page guard redirect");
        return Redirect::to(target.path()).into_response();
    }

    match outcome.view {
        View::Children => next.run(Request::from_parts(parts, body)).await,
        View::Loading | View::Nothing => StatusCode::NO_CONTENT.into_response(),
    }
}
