use anyhow::Result;

use crate::cli::OutputFormat;
use crate::domain::ImplementedInterface;

use super::super::Container;

pub struct ImplementsController<'a> {
    container: &'a Container,
}

impl<'a> ImplementsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn implements(&self, type_name: String, format: OutputFormat) -> Result<String> {
        self.container.loaded().await?;
        let interfaces = self
            .container
            .query_use_case()
            .implemented_by(&type_name)
            .await?;

        Ok(match format {
            OutputFormat::Json => serde_json::to_string_pretty(&interfaces)?,
            OutputFormat::Text => self.format_interfaces(&type_name, &interfaces),
        })
    }

    fn format_interfaces(&self, type_name: &str, interfaces: &[ImplementedInterface]) -> String {
        if interfaces.is_empty() {
            return format!("No loaded interface lists '{}' as an implementor.", type_name);
        }

        let mut out = format!(
            "Interfaces implemented by '{}' ({})\n─────────────────────────────────────────\n",
            type_name,
            interfaces.len()
        );
        for entry in interfaces {
            out.push_str(&format!(
                "  • {}  via {}\n",
                entry.interface,
                entry.implementor.display_name()
            ));
        }
        out
    }
}
