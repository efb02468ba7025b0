//! Canonical column names used inside the pipeline.
//!
//! Source files name these columns differently from year to year (for
//! example `perwt18f` vs `perwt19f`). The loader renames them to the names
//! below so every pipeline stage can address columns statically.

/// Person identifier.
pub const PERSON_ID: &str = "dupersid";
/// Survey stratum.
pub const STRATUM: &str = "varstr";
/// Primary sampling unit (cluster).
pub const CLUSTER: &str = "varpsu";
/// Person-level sampling weight.
pub const WEIGHT: &str = "perwt";
/// Condition identifier.
pub const CONDITION_ID: &str = "condidx";
/// Event identifier.
pub const EVENT_ID: &str = "evntidx";
/// Event-type code in the link table.
pub const EVENT_TYPE: &str = "eventype";
/// Per-event cost.
pub const COST: &str = "cost";
/// Per-event utilization count (nights, visits), integer.
pub const UTILIZATION: &str = "utilization";
/// Constant 1 attached to every attributed event.
pub const COND_FLAG: &str = "cond_flag";
/// Person has at least one condition row matching the target code.
pub const HAS_CONDITION: &str = "has_condition";
/// Sum of condition-specific cost across all event categories.
pub const COND_TOTAL_COST: &str = "cond_total_cost";

/// Composite person key. Stratum, cluster and weight are functionally
/// determined by the person identifier.
pub const PERSON_KEY: [&str; 4] = [PERSON_ID, STRATUM, CLUSTER, WEIGHT];

/// Key identifying one event of one person.
pub const EVENT_KEY: [&str; 2] = [PERSON_ID, EVENT_ID];

/// Key identifying one condition of one person.
pub const CONDITION_KEY: [&str; 2] = [PERSON_ID, CONDITION_ID];

/// Output column names for one event category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryColumns {
    pub cost: String,
    pub utilization: Option<String>,
    pub events: String,
    pub flag: String,
}

impl CategoryColumns {
    /// Column names prefixed with the category label.
    pub fn new(label: &str, with_utilization: bool) -> Self {
        Self {
            cost: format!("{label}_cost"),
            utilization: with_utilization.then(|| format!("{label}_util")),
            events: format!("{label}_events"),
            flag: format!("{label}_flag"),
        }
    }

    /// Summed value columns (cost and utilization).
    pub fn total_columns(&self) -> Vec<&str> {
        let mut columns = vec![self.cost.as_str()];
        if let Some(util) = &self.utilization {
            columns.push(util.as_str());
        }
        columns
    }

    /// All category columns in output order.
    pub fn all(&self) -> Vec<&str> {
        let mut columns = self.total_columns();
        columns.push(self.events.as_str());
        columns.push(self.flag.as_str());
        columns
    }
}
