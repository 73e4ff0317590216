use anyhow::Result;

use crate::domain::RegistryStats;

use super::super::Container;

pub struct StatsController<'a> {
    container: &'a Container,
}

impl<'a> StatsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn stats(&self) -> Result<String> {
        self.container.loaded().await?;
        let stats = self.container.query_use_case().stats().await;
        Ok(self.format_stats(&stats))
    }

    fn format_stats(&self, stats: &RegistryStats) -> String {
        let crates = if stats.crates.is_empty() {
            "-".to_string()
        } else {
            stats.crates.join(", ")
        };

        format!(
            "ImplIndex Statistics\n====================\nInterfaces:   {}\nImplementors: {}\nEmpty:        {}\nCrates:       {}\nFragments:    {}\nSession:      {}",
            stats.interface_count,
            stats.implementor_count,
            stats.empty_interface_count,
            crates,
            self.container.fragments_dir(),
            self.container.session_id()
        )
    }
}
