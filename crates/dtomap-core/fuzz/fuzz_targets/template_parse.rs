//! Fuzzing target for template parsing
//!
//! Arbitrary text either parses or yields a syntax error positioned inside
//! the input.

#![no_main]

use dtomap_core::expression::parse;
use dtomap_core::BuildError;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    match parse(text) {
        Ok(expr) => {
            let _ = expr.to_template();
            let _ = expr.filter_names();
        }
        Err(BuildError::ExpressionSyntax { position, .. }) => {
            assert!(position <= text.len(), "error position {} past end of input", position);
        }
        Err(_) => {}
    }
});
