//! TUI screens

mod calls;
mod customers;
mod dashboard;

pub use calls::{CallsScreen, FilterField, FilterForm, FormAction};
pub use customers::CustomersScreen;
pub use dashboard::DashboardScreen;
