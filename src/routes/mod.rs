/// Router Module Index
///
/// Pages are split by whether they need a signed-in user. The split decides
/// which middleware wraps them; the handlers still do their own ownership checks.

/// Pages anyone can open. Handlers receive a `Requester` that may be anonymous
/// and filter by visibility themselves.
pub mod public;

/// Login-only pages, wrapped in the `AuthUser` middleware. Anonymous requests
/// are redirected to the login page before reaching a handler.
pub mod authenticated;
