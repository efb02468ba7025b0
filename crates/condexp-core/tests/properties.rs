//! Property tests over randomly generated datasets.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use proptest::collection::vec;
use proptest::prelude::*;

use condexp_core::guards::ensure_no_numeric_nulls;
use condexp_core::{
    PipelineError, dedup_associations, ensure_event_type_purity, filter_event_type, run_pipeline,
};
use condexp_ingest::Dataset;
use condexp_model::{EventCategory, PipelineOptions};

#[derive(Debug, Clone)]
struct Link {
    condition: usize,
    person: usize,
    event: usize,
    own_person: bool,
    inpatient: bool,
}

#[derive(Debug, Clone)]
struct Raw {
    persons: usize,
    /// (person, matches target)
    conditions: Vec<(usize, bool)>,
    links: Vec<Link>,
    /// Event costs per person; event `j` of person `p` is `E{j}`.
    events: Vec<Vec<f64>>,
}

impl Raw {
    fn link_person(&self, link: &Link) -> Option<usize> {
        let (owner, _) = self.conditions.get(link.condition)?;
        Some(if link.own_person { *owner } else { link.person })
    }

    /// Expected condition cost per person for one event type.
    fn expected_cost(&self, inpatient: bool) -> Vec<f64> {
        let mut attributed: BTreeSet<(usize, usize)> = BTreeSet::new();
        for link in self.links.iter().filter(|l| l.inpatient == inpatient) {
            let Some((owner, matches)) = self.conditions.get(link.condition) else {
                continue;
            };
            let Some(person) = self.link_person(link) else {
                continue;
            };
            if *matches && person == *owner && link.event < self.events[person].len() {
                attributed.insert((person, link.event));
            }
        }
        let mut cost = vec![0.0; self.persons];
        for (person, event) in attributed {
            cost[person] += self.events[person][event];
        }
        cost
    }
}

fn raw_dataset() -> impl Strategy<Value = Raw> {
    (1usize..6)
        .prop_flat_map(|persons| {
            (
                Just(persons),
                vec((0..persons, any::<bool>()), 0..10),
                vec(
                    (0usize..10, 0..persons, 0usize..3, any::<bool>(), any::<bool>()),
                    0..16,
                ),
                vec(vec(0.0..500.0f64, 0..3), persons),
            )
        })
        .prop_map(|(persons, conditions, links, events)| {
            let links = links
                .into_iter()
                .filter(|(condition, ..)| *condition < conditions.len())
                .map(|(condition, person, event, own_person, inpatient)| Link {
                    condition,
                    person,
                    event,
                    own_person,
                    inpatient,
                })
                .collect();
            Raw {
                persons,
                conditions,
                links,
                events,
            }
        })
}

fn pid(person: usize) -> String {
    format!("P{person}")
}

fn build(raw: &Raw) -> Dataset {
    let ids: Vec<String> = (0..raw.persons).map(pid).collect();
    let cohort = df! {
        "dupersid" => ids,
        "varstr" => (0..raw.persons).map(|p| (p % 2) as i64).collect::<Vec<_>>(),
        "varpsu" => vec![1i64; raw.persons],
        "perwt" => (0..raw.persons).map(|p| 100.0 * (p + 1) as f64).collect::<Vec<_>>(),
        "totexp18" => vec![10.0; raw.persons],
    }
    .unwrap();

    let n = raw.conditions.len();
    let conditions = df! {
        "dupersid" => raw.conditions.iter().map(|(p, _)| pid(*p)).collect::<Vec<_>>(),
        "condidx" => (0..n).map(|k| format!("C{k}")).collect::<Vec<_>>(),
        "ccsr1x" => raw
            .conditions
            .iter()
            .map(|(_, m)| if *m { "NVS010" } else { "CIR007" })
            .collect::<Vec<_>>(),
        "ccsr2x" => vec![None::<&str>; n],
        "ccsr3x" => vec![None::<&str>; n],
    }
    .unwrap();

    let link = df! {
        "dupersid" => raw
            .links
            .iter()
            .map(|l| pid(raw.link_person(l).unwrap_or(l.person)))
            .collect::<Vec<_>>(),
        "condidx" => raw.links.iter().map(|l| format!("C{}", l.condition)).collect::<Vec<_>>(),
        "evntidx" => raw.links.iter().map(|l| format!("E{}", l.event)).collect::<Vec<_>>(),
        "eventype" => raw
            .links
            .iter()
            .map(|l| if l.inpatient { 4i64 } else { 1 })
            .collect::<Vec<_>>(),
    }
    .unwrap();

    let mut persons = Vec::new();
    let mut events = Vec::new();
    let mut costs = Vec::new();
    for (person, list) in raw.events.iter().enumerate() {
        for (event, cost) in list.iter().enumerate() {
            persons.push(pid(person));
            events.push(format!("E{event}"));
            costs.push(*cost);
        }
    }
    let office = df! {
        "dupersid" => persons.clone(),
        "evntidx" => events.clone(),
        "cost" => costs.clone(),
    }
    .unwrap();
    let nights = vec![1i64; costs.len()];
    let inpatient = df! {
        "dupersid" => persons,
        "evntidx" => events,
        "cost" => costs,
        "utilization" => nights,
    }
    .unwrap();

    Dataset {
        cohort,
        conditions,
        link,
        events: BTreeMap::from([
            ("office".to_string(), office),
            ("inpatient".to_string(), inpatient),
        ]),
    }
}

fn options() -> PipelineOptions {
    PipelineOptions::new("NVS010")
        .with_categories(vec![EventCategory::office_based(), EventCategory::inpatient()])
}

fn f64_values(df: &DataFrame, column: &str) -> Vec<f64> {
    df.column(column)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect()
}

fn i64_values(df: &DataFrame, column: &str) -> Vec<i64> {
    df.column(column)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect()
}

fn i32_values(df: &DataFrame, column: &str) -> Vec<i32> {
    df.column(column)
        .unwrap()
        .i32()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap())
        .collect()
}

proptest! {
    /// Every person-indexed output has exactly one row per cohort person.
    #[test]
    fn row_count_matches_cohort(raw in raw_dataset()) {
        let dataset = build(&raw);
        let output = run_pipeline(&dataset, &options()).unwrap();

        prop_assert_eq!(output.comprehensive.height(), raw.persons);
        for aggregate in &output.aggregates {
            prop_assert_eq!(aggregate.frame.height(), raw.persons);
        }
    }

    /// No numeric column of the comprehensive record holds a null.
    #[test]
    fn zero_fill_is_complete(raw in raw_dataset()) {
        let output = run_pipeline(&build(&raw), &options()).unwrap();

        prop_assert!(ensure_no_numeric_nulls(&output.comprehensive).is_ok());
    }

    /// Deduplicating an already deduplicated association table is a no-op.
    #[test]
    fn dedup_is_idempotent(raw in raw_dataset()) {
        let dataset = build(&raw);
        let once = dedup_associations(&dataset.link).unwrap();
        let twice = dedup_associations(&once).unwrap();

        prop_assert!(once.equals_missing(&twice));
    }

    /// The event-type filter only lets through its own code.
    #[test]
    fn event_type_filter_is_pure(raw in raw_dataset()) {
        let dataset = build(&raw);
        let category = EventCategory::inpatient();
        let filtered = filter_event_type(&dataset.link, category.event_type).unwrap();

        prop_assert!(ensure_event_type_purity(&filtered, &category).is_ok());
        let expected = raw.links.iter().filter(|l| l.inpatient).count();
        prop_assert_eq!(filtered.height(), expected);
    }

    /// Costs, counts and indicators are never negative.
    #[test]
    fn outputs_are_non_negative(raw in raw_dataset()) {
        let output = run_pipeline(&build(&raw), &options()).unwrap();
        let record = &output.comprehensive;

        for name in ["office_cost", "inpatient_cost", "cond_total_cost"] {
            prop_assert!(f64_values(record, name).iter().all(|v| *v >= 0.0));
        }
        for name in ["inpatient_util", "office_events", "inpatient_events"] {
            prop_assert!(i64_values(record, name).iter().all(|v| *v >= 0));
        }
        for name in ["office_flag", "inpatient_flag", "has_condition"] {
            prop_assert!(i32_values(record, name).iter().all(|v| *v == 0 || *v == 1));
        }
    }

    /// Each person's cost is the sum over their distinct attributed events.
    #[test]
    fn cost_matches_independent_computation(raw in raw_dataset()) {
        let output = run_pipeline(&build(&raw), &options()).unwrap();
        let record = &output.comprehensive;

        for (name, inpatient) in [("office_cost", false), ("inpatient_cost", true)] {
            let actual = f64_values(record, name);
            let expected = raw.expected_cost(inpatient);
            for (a, e) in actual.iter().zip(&expected) {
                prop_assert!((a - e).abs() < 1e-6, "{}: {} != {}", name, a, e);
            }
        }
    }

    /// A negative event cost stops the run instead of reaching the totals.
    #[test]
    fn negative_event_costs_are_rejected(raw in raw_dataset(), bad in -500.0f64..-0.01) {
        let mut raw = raw;
        let Some(costs) = raw.events.iter_mut().find(|costs| !costs.is_empty()) else {
            return Ok(());
        };
        costs[0] = bad;

        let err = run_pipeline(&build(&raw), &options()).unwrap_err();

        prop_assert!(
            matches!(
                err,
                PipelineError::InvalidValue { ref table, ref column, count: 1, .. }
                    if table == "events[office]" && column == "cost"
            ),
            "unexpected error: {}",
            err
        );
    }

    /// A person with condition-attributed events always has the condition.
    #[test]
    fn flagged_persons_have_the_condition(raw in raw_dataset()) {
        let output = run_pipeline(&build(&raw), &options()).unwrap();
        let record = &output.comprehensive;

        let has = i32_values(record, "has_condition");
        for name in ["office_flag", "inpatient_flag"] {
            for (flag, has) in i32_values(record, name).iter().zip(&has) {
                prop_assert!(*flag <= *has);
            }
        }
    }
}
