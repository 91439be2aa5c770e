/// Router Module Index
///
/// Routing is split by access level; authentication is applied as a layer per module
/// rather than per handler.

/// Routes accessible to anonymous clients.
pub mod public;

/// JSON API routes behind the `AuthUser` middleware.
pub mod authenticated;

/// Route-guard middleware for the single-page client's protected paths.
pub mod pages;
