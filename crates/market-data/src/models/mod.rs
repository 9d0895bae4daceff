//! Market data models
//!
//! Read-only value objects produced by parsing vendor JSON:
//! - `types` - Type aliases for common identifiers (Mic, Currency)
//! - `security` - Search results (Security), profiles (SecurityInfo) and SecurityKind
//! - `price` - Daily prices (Price)

mod price;
mod security;
mod types;

pub use price::Price;
pub use security::{Security, SecurityInfo, SecurityKind};
pub use types::{Currency, Mic, DEFAULT_CURRENCY};
