//! Call log view
//!
//! Filter state, table rendering, detail loading and the retry workflow,
//! tied together by [`CallLogViewModel`].

pub mod detail;
pub mod filter;
pub mod model;
pub mod retry;
pub mod table;

pub use detail::{load_detail, DetailField, DetailView, PLACEHOLDER};
pub use filter::{validate_custom_range, DateRange, FilterCriteria, FilterState};
pub use model::{CallLogViewModel, Notice};
pub use retry::{Confirm, Preconfirmed, RetryCoordinator, RetryOutcome, RetryState};
pub use table::{badge_class, render, BadgeClass, RowAction, RowView};
