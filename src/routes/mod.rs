/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules. Access control is applied explicitly at the module level (via
/// Axum layers), so a protected endpoint can never be exposed by accident.
///
/// The three modules map directly to the defined access roles.

/// Routes accessible to all users (anonymous browsing, registration, login).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated session token (or the local dev bypass).
pub mod authenticated;

/// Routes restricted exclusively to administrators.
/// Every handler performs the admin check itself.
pub mod admin;
