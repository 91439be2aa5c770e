use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::{Role, User};

/// The key under which the onboarding fallback flag is stored.
pub const ONBOARDED_KEY: &str = "onboarded";

/// AuthState
///
/// The session state supplied by whatever resolves identity (browser auth hook,
/// request extractor). The guard only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Unauthenticated,
    /// Authenticated, with the user object once it has been fetched.
    Authenticated(Option<User>),
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated(user) => user.as_ref(),
            _ => None,
        }
    }
}

/// GuardParams
///
/// Per-route requirements. Both default to "not required".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardParams {
    pub required_role: Option<Role>,
    pub require_onboarded: bool,
}

impl GuardParams {
    pub fn authenticated() -> Self {
        Self::default()
    }

    pub fn role(role: Role) -> Self {
        Self {
            required_role: Some(role),
            ..Self::default()
        }
    }

    pub fn onboarded(mut self) -> Self {
        self.require_onboarded = true;
        self
    }
}

/// Redirect
///
/// The fixed set of locations the guard ever navigates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    Login,
    Unauthorized,
    Onboarding,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Login => "/login",
            Redirect::Unauthorized => "/unauthorized",
            Redirect::Onboarding => "/onboarding",
        }
    }
}

/// What the guarded slot should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Nothing,
    Children,
}

/// GuardOutcome
///
/// Navigation side effect plus the view to render. `view` is never `Children` when
/// `navigate` is set, so protected content cannot flash before the redirect lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardOutcome {
    pub navigate: Option<Redirect>,
    pub view: View,
}

impl GuardOutcome {
    const fn show(view: View) -> Self {
        Self {
            navigate: None,
            view,
        }
    }

    const fn redirect(to: Redirect) -> Self {
        Self {
            navigate: Some(to),
            view: View::Nothing,
        }
    }
}

// --- Onboarding fallback storage ---

/// KeyValueStore
///
/// Read access to the client-side flag store (browser local storage, a cookie jar,
/// or an in-memory map in tests).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
}

/// Returns true only for the exact stored value `"true"`.
pub fn flag_set(store: &dyn KeyValueStore, key: &str) -> bool {
    store.get(key).as_deref() == Some("true")
}

/// MemoryStore
///
/// A process-local `KeyValueStore`. Interior mutability lets a shared guard observe
/// writes made elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), value.into());
        }
    }

    pub fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.write() {
            entries.remove(key);
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().ok()?.get(key).cloned()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

// --- Decision ---

/// Whether a student counts as onboarded: profile flag OR the stored fallback flag.
pub fn student_onboarded(user: &User, store: &dyn KeyValueStore) -> bool {
    match user {
        User::Student {
            student_profile, ..
        } => {
            student_profile.as_ref().is_some_and(|p| p.onboarded)
                || flag_set(store, ONBOARDED_KEY)
        }
        // Onboarding only gates students.
        User::Instructor { .. } | User::Admin { .. } => true,
    }
}

/// evaluate
///
/// The whole guard as a pure transition from `(auth, params)` to an outcome.
///
/// Order of checks: loading, unauthenticated, missing user, role, onboarding.
/// A role mismatch wins over the onboarding check.
pub fn evaluate(
    auth: &AuthState,
    params: &GuardParams,
    store: &dyn KeyValueStore,
) -> GuardOutcome {
    let user = match auth {
        AuthState::Loading => return GuardOutcome::show(View::Loading),
        AuthState::Unauthenticated => return GuardOutcome::redirect(Redirect::Login),
        AuthState::Authenticated(None) => return GuardOutcome::show(View::Nothing),
        AuthState::Authenticated(Some(user)) => user,
    };

    if let Some(required) = params.required_role {
        if user.role() != required {
            return GuardOutcome::redirect(Redirect::Unauthorized);
        }
    }

    if params.require_onboarded && !student_onboarded(user, store) {
        return GuardOutcome::redirect(Redirect::Onboarding);
    }

    GuardOutcome::show(View::Children)
}

// --- Reactive wrapper ---

/// Navigator
///
/// Imperative navigation hook. Fire-and-forget: no result, no retry.
pub trait Navigator {
    fn navigate(&mut self, path: &'static str);
}

/// The inputs whose change triggers a fresh navigation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Dependencies {
    is_loading: bool,
    is_authenticated: bool,
    user: Option<User>,
    params: GuardParams,
}

impl Dependencies {
    fn capture(auth: &AuthState, params: GuardParams) -> Self {
        Self {
            is_loading: auth.is_loading(),
            is_authenticated: auth.is_authenticated(),
            user: auth.user().cloned(),
            params,
        }
    }
}

/// RouteGuard
///
/// Wraps `evaluate` for an event-driven UI. Call `on_state_change` whenever the auth
/// source publishes; navigation fires at most once per change of the dependency set,
/// while the returned view is recomputed every time.
pub struct RouteGuard<N, S> {
    params: GuardParams,
    navigator: N,
    store: S,
    last: Option<Dependencies>,
}

impl<N: Navigator, S: KeyValueStore> RouteGuard<N, S> {
    pub fn new(params: GuardParams, navigator: N, store: S) -> Self {
        Self {
            params,
            navigator,
            store,
            last: None,
        }
    }

    /// Route parameters are part of the dependency set; changing them re-arms navigation.
    pub fn set_params(&mut self, params: GuardParams) {
        self.params = params;
    }

    pub fn on_state_change(&mut self, auth: &AuthState) -> View {
        let outcome = evaluate(auth, &self.params, &self.store);

        let deps = Dependencies::capture(auth, self.params);
        if self.last.as_ref() != Some(&deps) {
            if let Some(target) = outcome.navigate {
                tracing::debug!(to = target.path(), "route guard redirect");
                self.navigator.navigate(target.path());
            }
            self.last = Some(deps);
        }

        outcome.view
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }
}
