//! Output post-processing driven by a version's OpenAPI schema
//!
//! - Versions built before cog 0.3.9 describe iterator outputs as plain
//!   arrays; those are upgraded to `x-cog-array-type: iterator`
//! - Iterator outputs flagged `x-cog-array-display: concatenate` are joined
//!   into a single string when every element is a string

use crate::types::Version;
use serde_json::Value;

/// First cog release that tags iterator outputs itself
const ARRAY_TYPE_SINCE: [u64; 3] = [0, 3, 9];

/// Parse `major.minor[.patch]`, ignoring a leading `v` and any pre-release
/// or build suffix. Anything else (e.g. `dev`) is unknown.
pub fn parse_cog_version(version: &str) -> Option<[u64; 3]> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let core = version.split(['-', '+']).next()?;

    let mut parts = [0u64; 3];
    let mut count = 0;
    for (slot, part) in parts.iter_mut().zip(core.split('.')) {
        *slot = part.parse().ok()?;
        count += 1;
    }

    if count < 2 || core.split('.').count() > 3 {
        return None;
    }
    Some(parts)
}

fn version_has_no_array_type(cog_version: Option<&str>) -> bool {
    cog_version
        .and_then(parse_cog_version)
        .is_some_and(|parsed| parsed < ARRAY_TYPE_SINCE)
}

/// Output schema with pre-0.3.9 array outputs rewritten as iterators.
///
/// This is the schema to read when deciding how to present an output. For
/// `run` the rewrite only changes the result when the old schema also asks
/// for `concatenate`; without the rewrite such an output would stay a list.
pub fn compatible_output_schema(version: &Version) -> Option<Value> {
    let mut output = version.output_schema()?.clone();

    if version_has_no_array_type(version.cog_version.as_deref())
        && output.get("type").and_then(Value::as_str) == Some("array")
    {
        if let Value::Object(schema) = &mut output {
            schema.insert(
                "x-cog-array-type".to_string(),
                Value::String("iterator".to_string()),
            );
        }
    }

    Some(output)
}

/// Apply the schema's display hints to a successful run's output
pub fn transform_output(version: &Version, output: Value) -> Value {
    let Some(schema) = compatible_output_schema(version) else {
        return output;
    };

    let is_iterator = schema.get("type").and_then(Value::as_str) == Some("array")
        && schema.get("x-cog-array-type").and_then(Value::as_str) == Some("iterator");
    let concatenate =
        schema.get("x-cog-array-display").and_then(Value::as_str) == Some("concatenate");

    if !(is_iterator && concatenate) {
        return output;
    }

    if let Value::Array(items) = &output {
        if items.iter().all(Value::is_string) {
            return Value::String(items.iter().filter_map(Value::as_str).collect());
        }
    }

    output
}
