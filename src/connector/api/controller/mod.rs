pub mod check_controller;
pub mod implementors_controller;
pub mod implements_controller;
pub mod stats_controller;

pub use check_controller::CheckController;
pub use implementors_controller::ImplementorsController;
pub use implements_controller::ImplementsController;
pub use stats_controller::StatsController;
