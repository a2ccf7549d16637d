pub mod controller;
pub mod loop_worker;

pub use controller::RefreshController;
pub use loop_worker::run_refresh_cycle;
