use std::collections::HashMap;

use super::metrics::*;
use super::sanitize::{sanitize, sanitize_tag_value};

/// Every metric path starts with this.
pub const PATH_PREFIX: &'static str = "Component/";

/// Reporting period attached to every component. Writes are not timed, so
/// this is a fixed policy rather than a measurement.
pub const DEFAULT_DURATION: Seconds = 60;

/// Rolls a batch of samples up into components. Nothing is kept between
/// calls to `build`.
pub struct Aggregator {
    default_host: String,
    guid: String,
}

impl Aggregator {
    pub fn new<H: AsRef<str>, G: AsRef<str>>(default_host: H, guid: G) -> Aggregator {
        Aggregator {
            default_host: default_host.as_ref().to_owned(),
            guid: guid.as_ref().to_owned(),
        }
    }

    /// Groups `samples` by name and canonical tags and merges the fields of
    /// each group into one component.
    ///
    /// Fields whose value is not a number or a boolean are skipped without
    /// error. Components are returned sorted by host, then by group, so the
    /// output does not depend on hashing order.
    pub fn build(&self, samples: &[Sample]) -> Vec<Component> {
        let mut groups: HashMap<(String, String), Component> = HashMap::new();

        for sample in samples {
            let tags = canonical_tags(sample);

            let component = groups.entry((sample.name.clone(), tags.clone())).or_insert_with(|| {
                let host = sample.host().unwrap_or(self.default_host.as_str());
                Component::new(host, &self.guid, DEFAULT_DURATION)
            });

            for (key, value) in &sample.fields {
                let value = match value.as_f64() {
                    Some(value) => value,
                    None => {
                        tracing::trace!(metric = %sample.name, field = %key, "skipping non-numeric field");
                        continue
                    },
                };

                component.record(metric_path(&sample.name, &tags, key), value);
            }
        }

        let mut grouped: Vec<((String, String), Component)> = groups.into_iter().collect();
        grouped.sort_by(|a, b| {
            (&a.1.name, &a.0).cmp(&(&b.1.name, &b.0))
        });

        grouped.into_iter().map(|(_, component)| component).collect()
    } // fn build
}

/// Sanitized values of every tag except `host`, ordered by tag key and
/// joined with `/`. The keys themselves are left out.
pub fn canonical_tags(sample: &Sample) -> String {
    let mut keys: Vec<&String> = sample.tags.keys()
        .filter(|key| key.as_str() != "host")
        .collect();
    keys.sort();

    keys.iter()
        .map(|key| sanitize_tag_value(&sample.tags[*key]))
        .collect::<Vec<String>>()
        .join("/")
}

/// Fully qualified path of one field, e.g. `Component/cpu/cpu0/usageidle`.
pub fn metric_path(name: &str, canonical_tags: &str, field: &str) -> String {
    let mut parts = vec![sanitize(name)];
    if !canonical_tags.is_empty() {
        parts.push(canonical_tags.to_owned());
    }
    parts.push(sanitize(field));

    format!("{}{}", PATH_PREFIX, parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> Aggregator {
        Aggregator::new("testhostname", "test.guid")
    }

    fn sample(name: &str, tag_value: &str) -> Sample {
        Sample::with_name(name).tag("tag1", tag_value)
    }

    #[test]
    fn it_builds_nothing_from_an_empty_batch() {
        assert!(aggregator().build(&[]).is_empty());
    }

    #[test]
    fn it_builds_a_component_from_one_sample() {
        let samples = vec![
            sample("m1", "tagvalue1").field("value1", 3.0).field("value2", 4.0),
        ];

        let components = aggregator().build(&samples);

        assert_eq!(components.len(), 1);
        let component = &components[0];
        assert_eq!(component.name, "testhostname");
        assert_eq!(component.guid, "test.guid");
        assert_eq!(component.duration, 60);
        assert_eq!(component.metrics.len(), 2);
        assert_eq!(component.metrics["Component/m1/tagvalue1/value1"], FieldStat::new(3.0));
        assert_eq!(component.metrics["Component/m1/tagvalue1/value2"],
                   FieldStat { count: 1, total: 4.0, min: 4.0, max: 4.0, sum_of_squares: 16.0 });
    }

    #[test]
    fn it_merges_samples_with_the_same_name_and_tags() {
        let samples = vec![
            sample("m1", "tagvalue1").field("value1", 3.0),
            sample("m1", "tagvalue1").field("value1", 2.0),
        ];

        let components = aggregator().build(&samples);

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].metrics["Component/m1/tagvalue1/value1"],
                   FieldStat { count: 2, total: 5.0, min: 2.0, max: 3.0, sum_of_squares: 13.0 });
    }

    #[test]
    fn it_separates_groups_by_tag_values() {
        let samples = vec![
            sample("m1", "tagvalue1").field("value1", 3.0).field("value2", 4.0),
            Sample::with_name("m2").tag("tag2", "tagvalue2").field("v1", 6.0).field("v2", 8.0),
            sample("m1", "tagvalue1").field("value1", 2.0).field("value2", 9.0),
            sample("m1", "tagvalue2").field("value1", 1.0).field("value2", 2.0),
            sample("m1", "tagvalue1").field("asdf1", 3.0).field("asdf2", 4.0),
        ];

        let components = aggregator().build(&samples);
        assert_eq!(components.len(), 3);

        let merged = components.iter()
            .find(|c| c.metrics.contains_key("Component/m1/tagvalue1/value1"))
            .unwrap();
        assert_eq!(merged.metrics.len(), 4);
        assert_eq!(merged.metrics["Component/m1/tagvalue1/value2"],
                   FieldStat { count: 2, total: 13.0, min: 4.0, max: 9.0, sum_of_squares: 97.0 });
        assert_eq!(merged.metrics["Component/m1/tagvalue1/asdf1"].count, 1);

        let other = components.iter()
            .find(|c| c.metrics.contains_key("Component/m1/tagvalue2/value1"))
            .unwrap();
        assert_eq!(other.metrics.len(), 2);
    }

    #[test]
    fn it_ignores_the_host_tag_when_grouping() {
        let samples = vec![
            sample("m1", "a").tag("host", "web-1").field("value", 1.0),
            sample("m1", "a").tag("host", "web-2").field("value", 5.0),
        ];

        let components = aggregator().build(&samples);

        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "web-1");
        assert_eq!(components[0].metrics["Component/m1/a/value"].count, 2);
    }

    #[test]
    fn it_names_components_after_the_host_tag() {
        let samples = vec![
            Sample::with_name("cpu").tag("host", "db-1").field("idle", 90.0),
            Sample::with_name("mem").field("free", 1024u64),
        ];

        let components = aggregator().build(&samples);
        let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();

        assert_eq!(names, vec!["db-1", "testhostname"]);
        assert!(components[0].metrics.contains_key("Component/cpu/idle"));
    }

    #[test]
    fn it_orders_tag_values_by_key() {
        let sample = Sample::with_name("disk")
            .tag("path", "/")
            .tag("device", "sda1")
            .tag("host", "ignored")
            .tag("fstype", "ext4");

        assert_eq!(canonical_tags(&sample), "sda1/ext4/ROOT");
    }

    #[test]
    fn it_sanitizes_every_path_segment() {
        assert_eq!(metric_path("disk io", "sda1/ROOT", "used_%"), "Component/diskio/sda1/ROOT/usedPercent");
        assert_eq!(metric_path("test1", "", "value1"), "Component/test1/value1");
    }

    #[test]
    fn it_skips_fields_that_are_not_numbers() {
        let samples = vec![
            Sample::with_name("proc")
                .field("state", "running")
                .field("up", true)
                .field("threads", 12i64),
        ];

        let components = aggregator().build(&samples);
        let metrics = &components[0].metrics;

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics["Component/proc/up"].total, 1.0);
        assert_eq!(metrics["Component/proc/threads"].total, 12.0);
    }

    #[test]
    fn it_keeps_a_component_for_samples_without_numeric_fields() {
        let samples = vec![Sample::with_name("status").field("message", "ok")];

        let components = aggregator().build(&samples);

        assert_eq!(components.len(), 1);
        assert!(components[0].metrics.is_empty());
    }

    #[test]
    fn it_keeps_stats_consistent_with_the_values() {
        let values = [4.5, -2.0, 10.0, 0.25, 3.0, 3.0];
        let samples: Vec<Sample> = values.iter()
            .map(|value| sample("load", "x").field("avg", *value))
            .collect();

        let components = aggregator().build(&samples);
        let stat = &components[0].metrics["Component/load/x/avg"];

        assert_eq!(stat.count, values.len() as u64);
        assert_eq!(stat.total, values.iter().sum::<f64>());
        assert_eq!(stat.sum_of_squares, values.iter().map(|v| v * v).sum::<f64>());
        for value in &values {
            assert!(stat.min <= *value && *value <= stat.max);
        }
        assert_eq!(stat.min, -2.0);
        assert_eq!(stat.max, 10.0);
    }
}
