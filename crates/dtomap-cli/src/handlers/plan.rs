//! Plan command handler

use super::utils;
use crate::cli::PlanArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use tracing::instrument;

/// Handle the plan command
#[instrument(skip(args, config, output), fields(type_id = %args.type_id))]
pub fn handle_plan(args: PlanArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let catalog = utils::catalog_path(args.catalog.catalog.as_deref(), config)?;
    let engine = utils::load_engine(&catalog, config.engine.clone(), output)?;
    let overrides = utils::build_overrides(&args.overrides)?;

    let plan = engine.resolve_plan(&args.type_id, &overrides)?;
    output.plan(&plan)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{self, CATALOG};
    use super::*;
    use crate::cli::{CatalogArgs, OutputFormat, OverrideArgs};
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn test_plan_shows_winning_sources() {
        let dir = TempDir::new().unwrap();
        let catalog = fixtures::write(dir.path(), "types.yaml", CATALOG);

        let args = PlanArgs {
            catalog: CatalogArgs {
                catalog: Some(catalog),
            },
            type_id: "User".to_string(),
            overrides: OverrideArgs {
                pipeline: vec!["trim".to_string()],
                ..OverrideArgs::default()
            },
        };

        let (mut out, buffer) = fixtures::writer(OutputFormat::Json);
        handle_plan(args, &Config::default(), &mut out).unwrap();

        let plan: Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(plan["type"], "User");
        assert_eq!(plan["fields"][0]["source"], "convention");
        assert_eq!(plan["fields"][1]["source"], "declared");
        assert_eq!(plan["fields"][1]["expression"], "user.full_name");
        assert_eq!(plan["fields"][2]["filters"][0], "lower");
        assert_eq!(plan["pipeline"][0], "trim");
    }
}
