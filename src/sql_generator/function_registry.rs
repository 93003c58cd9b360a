//! Cypher scalar function mapping.
//!
//! Maps Cypher function names (case-insensitive) to the host SQL dialect.
//! Unknown functions pass through uppercased so engine-native functions
//! keep working; the passthrough is logged since it may fail downstream.

use std::collections::HashMap;

use lazy_static::lazy_static;
use log::warn;

lazy_static! {
    static ref FUNCTION_MAPPINGS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("tolower", "LOWER");
        m.insert("toupper", "UPPER");
        m.insert("trim", "TRIM");
        m.insert("ltrim", "LTRIM");
        m.insert("rtrim", "RTRIM");
        m.insert("size", "LENGTH");
        m.insert("length", "LENGTH");
        m.insert("abs", "ABS");
        m.insert("round", "ROUND");
        m.insert("floor", "FLOOR");
        m.insert("ceil", "CEILING");
        m.insert("coalesce", "COALESCE");
        m.insert("substring", "SUBSTRING");
        m
    };
}

/// Looks up the SQL name for a Cypher function (name already lowercased).
pub fn get_function_mapping(lower_name: &str) -> Option<&'static str> {
    FUNCTION_MAPPINGS.get(lower_name).copied()
}

pub fn is_function_supported(name: &str) -> bool {
    FUNCTION_MAPPINGS.contains_key(name.to_lowercase().as_str())
}

/// SQL function name for a Cypher call: the mapped name, or the uppercased
/// original as a best-effort passthrough.
pub fn sql_function_name(name: &str) -> String {
    match get_function_mapping(&name.to_lowercase()) {
        Some(mapped) => mapped.to_string(),
        None => {
            warn!(
                "Cypher function '{}' has no SQL mapping; passing through uppercased",
                name
            );
            name.to_uppercase()
        }
    }
}
