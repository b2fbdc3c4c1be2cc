//! `spec` command.

use anyhow::Result;

use crate::application::{specification, Specification};
use crate::cli::output::{output, CommandOutput};

impl CommandOutput for Specification {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("{} {}", self.name, self.version),
            self.summary.clone(),
            format!("Author: {}", self.author),
        ];
        for (title, params) in [
            ("Source parameters", &self.source_params),
            ("Destination parameters", &self.destination_params),
        ] {
            lines.push(String::new());
            lines.push(format!("{title}:"));
            for (key, param) in params {
                let requirement = if param.required {
                    "required".to_string()
                } else if param.default.is_empty() {
                    "optional".to_string()
                } else {
                    format!("default {}", param.default)
                };
                lines.push(format!("  {key:<18} {requirement:<12} {}", param.description));
            }
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn execute(json_mode: bool) -> Result<()> {
    output(&specification(), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_output_lists_parameters() {
        let text = specification().to_human();
        assert!(text.contains("zendesk.apiToken"));
        assert!(text.contains("default 2m"));
        assert!(text.contains("Destination parameters:"));
    }

    #[test]
    fn test_json_output() {
        let value = specification().to_json();
        assert_eq!(value["name"], "zendesk");
        assert_eq!(value["source_params"]["pollingPeriod"]["required"], false);
    }
}
