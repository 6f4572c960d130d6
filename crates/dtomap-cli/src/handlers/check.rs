//! Check command handler

use super::utils;
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{CheckEntry, OutputWriter};
use dtomap_core::Overrides;
use tracing::{info, instrument, warn};

/// Handle the check command
#[instrument(skip_all)]
pub fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("check_command");

    let catalog = utils::catalog_path(args.catalog.catalog.as_deref(), config)?;
    output.info(&format!("Checking catalog: {}", catalog.display()))?;
    let engine = utils::load_engine(&catalog, config.engine.clone(), output)?;

    let type_ids: Vec<String> = match &args.type_id {
        Some(id) if engine.descriptor(id).is_none() => {
            return Err(dtomap_core::Error::UnknownType { type_id: id.clone() }.into());
        }
        Some(id) => vec![id.clone()],
        None => engine.type_ids().into_iter().map(String::from).collect(),
    };

    let entries: Vec<CheckEntry> = type_ids
        .iter()
        .map(|id| match engine.resolve_plan(id, &Overrides::new()) {
            Ok(plan) => CheckEntry {
                type_id: id.clone(),
                ok: true,
                fields: Some(plan.fields().len()),
                error: None,
            },
            Err(e) => {
                warn!(type_id = %id, error = %e, "Type failed to build");
                CheckEntry {
                    type_id: id.clone(),
                    ok: false,
                    fields: None,
                    error: Some(e.to_string()),
                }
            }
        })
        .collect();

    output.check_report(&entries)?;

    let failed = entries.iter().filter(|e| !e.ok).count();
    info!(total = entries.len(), failed, "Check finished");
    if failed > 0 {
        return Err(Error::CheckFailed {
            failed,
            total: entries.len(),
        });
    }

    output.success(&format!("✓ {} type(s) built", entries.len()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{self, BROKEN_CATALOG, CATALOG};
    use super::*;
    use crate::cli::{CatalogArgs, OutputFormat};
    use serde_json::Value;
    use tempfile::TempDir;

    fn args(catalog: std::path::PathBuf, type_id: Option<&str>) -> CheckArgs {
        CheckArgs {
            catalog: CatalogArgs {
                catalog: Some(catalog),
            },
            type_id: type_id.map(String::from),
        }
    }

    #[test]
    fn test_check_valid_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = fixtures::write(dir.path(), "types.yaml", CATALOG);

        let (mut out, buffer) = fixtures::writer(OutputFormat::Human);
        handle_check(args(catalog, None), &Config::default(), &mut out).unwrap();

        let text = buffer.contents();
        assert!(text.contains("✓ Greeting (1 fields)"));
        assert!(text.contains("✓ User (3 fields)"));
        assert!(text.contains("✓ 2 type(s) built"));
    }

    #[test]
    fn test_check_reports_every_failure() {
        let dir = TempDir::new().unwrap();
        let catalog = fixtures::write(dir.path(), "types.yaml", BROKEN_CATALOG);

        let (mut out, buffer) = fixtures::writer(OutputFormat::Json);
        let err = handle_check(args(catalog, None), &Config::default(), &mut out).unwrap_err();
        assert!(matches!(err, Error::CheckFailed { failed: 1, total: 2 }));

        let report: Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(report[0]["type"], "Broken");
        assert_eq!(report[0]["ok"], false);
        assert!(report[0]["error"].as_str().unwrap().contains("shout"));
        assert_eq!(report[1]["ok"], true);
    }

    #[test]
    fn test_check_single_type() {
        let dir = TempDir::new().unwrap();
        let catalog = fixtures::write(dir.path(), "types.yaml", BROKEN_CATALOG);

        let (mut out, _) = fixtures::writer(OutputFormat::Human);
        handle_check(args(catalog.clone(), Some("User")), &Config::default(), &mut out).unwrap();

        let err = handle_check(args(catalog, Some("Nope")), &Config::default(), &mut out).unwrap_err();
        assert!(matches!(err, Error::Core(dtomap_core::Error::UnknownType { .. })));
    }
}
