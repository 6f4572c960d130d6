//! Filters command handler

use crate::error::Result;
use crate::output::OutputWriter;
use dtomap_core::FilterRegistry;

/// Handle the filters command
pub fn handle_filters(output: &mut OutputWriter) -> Result<()> {
    let registry = FilterRegistry::with_builtins();
    let names = registry.names();

    if output.format() != crate::cli::OutputFormat::Human {
        return output.data(&names);
    }

    output.section(&format!("Filters ({})", names.len()))?;
    for name in names {
        output.writeln(&format!("  {}", name))?;
    }
    Ok(())
}
