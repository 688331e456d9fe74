/// Router Module Index
///
/// Routing is split by access level so the authentication boundary is
/// visible in the module structure rather than scattered per-route.

/// Routes accessible to all users: reading posts and comments, plus the
/// registration/login gateway.
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware. Requires a
/// live session.
pub mod authenticated;
