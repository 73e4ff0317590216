use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{
    CheckController, ImplementorsController, ImplementsController, StatsController,
};

pub struct Router<'a> {
    implementors_controller: ImplementorsController<'a>,
    implements_controller: ImplementsController<'a>,
    check_controller: CheckController<'a>,
    stats_controller: StatsController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            implementors_controller: ImplementorsController::new(container),
            implements_controller: ImplementsController::new(container),
            check_controller: CheckController::new(container),
            stats_controller: StatsController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Implementors {
                interface,
                format,
                timeout_ms,
            } => {
                self.implementors_controller
                    .implementors(interface, format, timeout_ms)
                    .await
            }
            Commands::Implements { type_name, format } => {
                self.implements_controller
                    .implements(type_name, format)
                    .await
            }
            Commands::Check { format } => self.check_controller.check(format).await,
            Commands::Stats => self.stats_controller.stats().await,
        }
    }
}
