//! Network-backed collaborators for legisync.
//!
//! - [`legis::LegisClient`]: the paged legislation listing endpoint
//! - [`sheets::SheetsRowStore`]: a Google Sheets tab used as the row store
//!
//! Both use blocking `reqwest`; a run is strictly sequential, so there is
//! nothing to gain from an async runtime here.

pub mod legis;
pub mod sheets;

pub use legis::{form_fields, parse_page, LegisClient, DEFAULT_ENDPOINT};
pub use sheets::{SheetsError, SheetsRowStore, TOKEN_ENV};
