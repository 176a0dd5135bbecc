//! Bearer token verification.
//!
//! Tokens are issued by the identity service; this server only checks the
//! HS256 signature and expiry against the shared secret.

pub mod jwt;
