use std::time::Duration;

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::OutputFormat;
use crate::domain::{ImplementorDescriptor, ImplementorLookup, InterfaceId};

use super::super::Container;

#[derive(Serialize)]
struct ImplementorsView<'a> {
    interface: &'a str,
    known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    implementors: Option<&'a [ImplementorDescriptor]>,
}

pub struct ImplementorsController<'a> {
    container: &'a Container,
}

impl<'a> ImplementorsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Answers as soon as the interface is registered, without waiting for the
    /// remaining fragments. Reports it unknown once loading finishes without it.
    pub async fn implementors(
        &self,
        interface: String,
        format: OutputFormat,
        timeout_ms: Option<u64>,
    ) -> Result<String> {
        let use_case = self.container.query_use_case();
        let id = InterfaceId::parse(&interface)?;

        let (registration, receiver) = use_case.subscribe(&id).await;
        let wait_for_interface = async {
            tokio::select! {
                set = receiver => Ok(set.ok()),
                summary = self.container.loaded() => summary.map(|_| None),
            }
        };

        let arrived = match timeout_ms {
            Some(ms) => {
                match tokio::time::timeout(Duration::from_millis(ms), wait_for_interface).await {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!("Timed out after {}ms waiting for '{}'", ms, id);
                        None
                    }
                }
            }
            None => wait_for_interface.await?,
        };
        use_case.withdraw(registration).await;

        let lookup = match arrived {
            Some(set) => ImplementorLookup::Registered(set),
            None => use_case.implementors(id.as_str()).await?,
        };
        debug!("Lookup of '{}' resolved, known: {}", id, lookup.is_known());

        Ok(match format {
            OutputFormat::Json => serde_json::to_string_pretty(&ImplementorsView {
                interface: id.as_str(),
                known: lookup.is_known(),
                implementors: lookup.implementors().map(|set| set.as_slice()),
            })?,
            OutputFormat::Text => self.format_lookup(&id, &lookup),
        })
    }

    fn format_lookup(&self, id: &InterfaceId, lookup: &ImplementorLookup) -> String {
        let set = match lookup.implementors() {
            Some(set) => set,
            None => {
                return format!(
                    "Interface '{}' is unknown: no loaded fragment registers it.",
                    id
                )
            }
        };
        if set.is_empty() {
            return format!("Interface '{}' is registered with no implementors.", id);
        }

        let mut out = format!(
            "Implementors of '{}' ({})\n─────────────────────────────────────────\n",
            id,
            set.len()
        );
        for (idx, implementor) in set.iter().enumerate() {
            out.push_str(&format!("{:>3}. {}\n", idx + 1, implementor.display_name()));
            if let Some(crate_name) = implementor.crate_name() {
                out.push_str(&format!("     crate: {}\n", crate_name));
            }
            if let Some(link) = implementor.doc_link() {
                out.push_str(&format!("     docs:  {}\n", link));
            }
            if let Some(bounds) = implementor.annotation("where") {
                out.push_str(&format!("     where: {}\n", bounds));
            }
        }
        out
    }
}
