//! Snapshot of the declared schemas for the default configuration.

use condexp_cli::schema::schema_listing;
use condexp_model::{EventCategory, PipelineOptions};

#[test]
fn default_schema_listing() {
    let listing = schema_listing(&PipelineOptions::default());

    insta::assert_snapshot!(listing, @r"
    cohort: dupersid -> dupersid (str)
    cohort: varstr -> varstr (i64)
    cohort: varpsu -> varpsu (i64)
    cohort: perwt18f -> perwt (f64)
    cohort: totexp18 -> totexp18 (f64)
    conditions: dupersid -> dupersid (str)
    conditions: condidx -> condidx (str)
    conditions: ccsr1x -> ccsr1x (str)
    conditions: ccsr2x -> ccsr2x (str)
    conditions: ccsr3x -> ccsr3x (str)
    link: dupersid -> dupersid (str)
    link: condidx -> condidx (str)
    link: evntidx -> evntidx (str)
    link: eventype -> eventype (i64)
    events[office]: dupersid -> dupersid (str)
    events[office]: evntidx -> evntidx (str)
    events[office]: obxp18x -> cost (f64)
    events[inpatient]: dupersid -> dupersid (str)
    events[inpatient]: evntidx -> evntidx (str)
    events[inpatient]: ipxp18x -> cost (f64)
    events[inpatient]: numnighx -> utilization (i64)
    ");
}

#[test]
fn source_names_follow_the_survey_year() {
    let mut options = PipelineOptions::default()
        .with_categories(vec![EventCategory::new("office", 1, "OBXP19X")]);
    options.source_columns.weight = "PERWT19F".to_string();

    let listing = schema_listing(&options);

    assert!(listing.contains("cohort: perwt19f -> perwt (f64)"));
    assert!(listing.contains("events[office]: obxp19x -> cost (f64)"));
}
