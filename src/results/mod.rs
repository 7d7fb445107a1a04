//! Result state for the console
//!
//! Holds the one result set the console is showing, static or streamed,
//! and the page window over it.
//!
//! # Guarantees
//!
//! - All changes go through explicit transitions of `ResultState`
//! - `total_pages == ceil(total_records / page_size)`, 0 when empty
//! - The active record is always clamped to the visible page
//! - At most one streamed page is held in memory
//! - Superseded page reads and query responses are discarded, never applied

mod controller;
mod errors;
mod pagination;
mod reader;
mod state;

pub use controller::{QueryTicket, ResultsController};
pub use errors::{ResultError, ResultsResult};
pub use pagination::{total_pages, PaginationWindow};
pub use reader::load_page;
pub use state::{ResultMode, ResultState, StreamStatus};
