//! Re-keying of flat records into the widget's standard field names.

use indexmap::IndexMap;

use crate::config::ReshapeConfig;
use crate::debug;
use crate::value::{Record, ValueExt};

pub const ID_LEVEL1: &str = "idlevel1";
pub const LEVEL1_NAME: &str = "level1name";
pub const ID_LEVEL2: &str = "idlevel2";
pub const LEVEL2_NAME: &str = "level2name";

/// Standard field name -> input property name.
pub type KeyMapping = IndexMap<String, String>;

/// Re-key one record through `mapping`.
///
/// The mapping must name both `idlevel1` and `idlevel2`, and the record must
/// carry a truthy value for each, otherwise nothing is produced. Input names
/// are matched under the config's case policy; mapped properties the record
/// lacks are left out.
pub fn translate(record: &Record, mapping: &KeyMapping, config: &ReshapeConfig) -> Option<Record> {
    let case = config.key_case;
    let lookup = |input: &str| {
        let wanted = case.apply(input);
        record
            .iter()
            .find(|(name, _)| case.apply(name) == wanted)
            .map(|(_, value)| value)
    };

    for required in [ID_LEVEL1, ID_LEVEL2] {
        let present = mapping
            .get(required)
            .and_then(|input| lookup(input.as_str()))
            .is_some_and(|v| v.is_truthy());
        if !present {
            debug!(config, "Required '{}' not found in record", required);
            return None;
        }
    }

    let mut out = Record::new();
    for (standard, input) in mapping {
        if let Some(value) = lookup(input.as_str()) {
            out.insert(standard.clone(), value.clone());
        }
    }
    Some(out)
}

/// Translate every record, skipping the ones that lack a required id.
pub fn translate_all(records: &[Record], mapping: &KeyMapping, config: &ReshapeConfig) -> Vec<Record> {
    records
        .iter()
        .filter_map(|record| translate(record, mapping, config))
        .collect()
}
