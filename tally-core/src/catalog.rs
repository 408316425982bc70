use serde::{Deserialize, Serialize};

/// One entry of the persisted service-type catalog.
///
/// The catalog is id-addressed and mutated only through explicit add/remove
/// operations; there is no shared mutable list for callers to reach into.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceType {
    pub id: i64,
    pub name: String,
}
