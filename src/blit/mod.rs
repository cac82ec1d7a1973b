//! Per-frame blit configuration and the rotation table.

/// Rotation enum and its axis-flag table.
pub mod rotation;
/// Two-phase blit session.
pub mod session;
