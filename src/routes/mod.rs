/// Router Module Index
///
/// One module per guard. Each router is wrapped in exactly one guard layer when it
/// is assembled in `create_router`, so a route's admission rule is decided by the
/// module it lives in.

/// No guard. Spot data here still passes through the visibility filter.
pub mod public;

/// `Guard::GuestOnly`: login and registration.
pub mod guest;

/// `Guard::Authenticated`: any signed-in user.
pub mod authenticated;

/// `Guard::Admin`: catalog maintenance, nested under `/admin`.
pub mod admin;
