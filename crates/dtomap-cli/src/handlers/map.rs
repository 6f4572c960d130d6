//! Map command handler

use super::utils::{self, InputFormat, InputShape};
use crate::cli::{MapArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::{OutputFormatter, OutputWriter};
use dtomap_core::AbsentPolicy;
use serde_json::Value;
use tracing::{info, instrument, trace, Level};

/// Handle the map command
#[instrument(skip(args, config, output), fields(type_id = %args.type_id))]
pub fn handle_map(args: MapArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("map_command", &args.type_id);

    let mut engine_config = config.engine.clone();
    if args.omit_absent {
        engine_config.absent_fields = AbsentPolicy::Omit;
    }
    if args.null_default {
        engine_config.null_triggers_default = true;
    }

    let catalog = utils::catalog_path(args.catalog.catalog.as_deref(), config)?;
    let engine = utils::load_engine(&catalog, engine_config, output)?;
    let overrides = utils::build_overrides(&args.overrides)?;

    // Plan failures are reported before any input is read
    let plan = engine.resolve_plan(&args.type_id, &overrides)?;
    info!(fields = plan.fields().len(), fingerprint = %plan.fingerprint(), "Plan ready");

    let format = InputFormat::detect(args.input.as_deref(), args.ndjson);
    let content = utils::read_input(args.input.as_deref())?;
    let (records, shape) = utils::parse_records(&content, format)?;
    info!(records = records.len(), ?shape, "Mapping records");

    let progress = if records.len() > 1 {
        output.progress_bar(records.len() as u64, &format!("Mapping {}", args.type_id))
    } else {
        None
    };

    let mut mapped = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let fields = engine
            .resolve(&args.type_id, record, &overrides)
            .map_err(|source| Error::Record { index, source })?;

        if tracing::enabled!(Level::TRACE) {
            let mut logged = Value::Object(fields.clone());
            redaction::redact_json_value(&mut logged, &config.logging.redact_keys);
            trace!(index, record = %logged, "Mapped record");
        }

        mapped.push(Value::Object(fields));
        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let result = match shape {
        InputShape::Single => mapped.into_iter().next().unwrap_or(Value::Null),
        InputShape::Array | InputShape::Lines => Value::Array(mapped),
    };

    match &args.save_to {
        Some(path) => {
            utils::write_output_file(path, &result)?;
            output.success(&format!("✓ Output saved to {}", path.display()))?;
        }
        None if shape == InputShape::Lines && output.format() == OutputFormat::Json => {
            // NDJSON in, NDJSON out
            output.writeln(&OutputFormat::Ndjson.format(&result)?)?;
        }
        None => output.data(&result)?,
    }

    if args.stats {
        let stats = engine.cache_stats();
        info!(size = stats.size, hits = stats.hits, misses = stats.misses, "Plan cache statistics");
        if output.format() == OutputFormat::Human {
            output.section("Plan Cache")?;
            output.stats(&stats)?;
        } else {
            eprintln!("{}", OutputFormat::Json.format_stats(&stats)?);
        }
    }

    Ok(())
}
