/// Derived views over the metric time series
///
/// The backend returns the whole retained history on every poll, so the
/// dashboard collapses it to the newest sample per entity before ranking,
/// merging or alerting on it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::models::{ContainerMetricSample, HostMetricSample};
use crate::utils::parse_timestamp;

/// A time-stamped record that belongs to a keyed entity
pub trait Sample {
    fn key(&self) -> &str;
    fn timestamp(&self) -> &str;
}

impl Sample for ContainerMetricSample {
    // Keyed by name, not id: a recreated container keeps its history
    fn key(&self) -> &str {
        &self.container_name
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

impl Sample for HostMetricSample {
    fn key(&self) -> &str {
        "host"
    }

    fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Collapse a series to the newest record per key.
///
/// On equal timestamps the record seen later wins. An unparseable timestamp
/// never beats a parseable one (`None < Some(_)`).
pub fn latest_per_key<T: Sample>(samples: &[T]) -> BTreeMap<&str, &T> {
    let mut latest: BTreeMap<&str, (Option<chrono::DateTime<chrono::Utc>>, &T)> = BTreeMap::new();

    for sample in samples {
        let ts = parse_timestamp(sample.timestamp());
        match latest.get(sample.key()) {
            Some((current, _)) if ts < *current => {}
            _ => {
                latest.insert(sample.key(), (ts, sample));
            }
        }
    }

    latest.into_iter().map(|(key, (_, sample))| (key, sample)).collect()
}

/// Newest record of a single series (the host series)
pub fn latest_sample<T: Sample>(samples: &[T]) -> Option<&T> {
    samples
        .iter()
        .map(|s| (parse_timestamp(s.timestamp()), s))
        .fold(None, |best: Option<(Option<chrono::DateTime<chrono::Utc>>, &T)>, (ts, s)| match best {
            Some((best_ts, _)) if ts < best_ts => best,
            _ => Some((ts, s)),
        })
        .map(|(_, s)| s)
}

/// Field used by the ranking tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    Cpu,
    Memory,
}

impl RankBy {
    pub fn value(&self, sample: &ContainerMetricSample) -> f64 {
        match self {
            RankBy::Cpu => sample.cpu_percent,
            RankBy::Memory => sample.memory_used_mb,
        }
    }
}

impl fmt::Display for RankBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankBy::Cpu => write!(f, "CPU"),
            RankBy::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for RankBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(RankBy::Cpu),
            "memory" | "mem" | "ram" => Ok(RankBy::Memory),
            other => Err(format!("unknown ranking field '{}' (expected cpu or memory)", other)),
        }
    }
}

/// Top `k` samples by the chosen field, descending. NaN ranks last.
pub fn top_n<'a, I>(samples: I, by: RankBy, k: usize) -> Vec<&'a ContainerMetricSample>
where
    I: IntoIterator<Item = &'a ContainerMetricSample>,
{
    let rank = |s: &ContainerMetricSample| {
        let v = by.value(s);
        if v.is_nan() { f64::NEG_INFINITY } else { v }
    };

    let mut ranked: Vec<&ContainerMetricSample> = samples.into_iter().collect();
    ranked.sort_by(|a, b| rank(b).total_cmp(&rank(a)));
    ranked.truncate(k);
    ranked
}

/// Summed usage across the latest container samples
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UsageTotals {
    pub cpu_percent: f64,
    pub memory_used_mb: f64,
}

pub fn container_totals<'a>(samples: impl IntoIterator<Item = &'a ContainerMetricSample>) -> UsageTotals {
    samples.into_iter().fold(UsageTotals::default(), |acc, s| UsageTotals {
        cpu_percent: acc.cpu_percent + s.cpu_percent,
        memory_used_mb: acc.memory_used_mb + s.memory_used_mb,
    })
}

/// Latest-per-key projection cached against the snapshot version.
///
/// The run loop redraws every 100 ms; the projection is only rebuilt when
/// a new snapshot has been applied.
#[derive(Debug, Default)]
pub struct LatestCache {
    version: Option<u64>,
    host: Option<HostMetricSample>,
    containers: Vec<ContainerMetricSample>,
}

impl LatestCache {
    /// Rebuild if `version` differs from the cached one. Returns true on rebuild.
    pub fn sync(&mut self, version: u64, host: &[HostMetricSample], containers: &[ContainerMetricSample]) -> bool {
        if self.version == Some(version) {
            return false;
        }

        self.host = latest_sample(host).cloned();
        self.containers = latest_per_key(containers).into_values().cloned().collect();
        self.version = Some(version);
        true
    }

    pub fn host(&self) -> Option<&HostMetricSample> {
        self.host.as_ref()
    }

    /// Latest sample per container name, ordered by name
    pub fn containers(&self) -> &[ContainerMetricSample] {
        &self.containers
    }

    pub fn by_name(&self) -> BTreeMap<&str, &ContainerMetricSample> {
        self.containers.iter().map(|c| (c.container_name.as_str(), c)).collect()
    }

    pub fn top(&self, by: RankBy, k: usize) -> Vec<&ContainerMetricSample> {
        top_n(&self.containers, by, k)
    }

    pub fn totals(&self) -> UsageTotals {
        container_totals(&self.containers)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample(name: &str, cpu: f64, ts: &str) -> ContainerMetricSample {
        ContainerMetricSample {
            container_id: format!("{}-id", name),
            container_name: name.to_string(),
            timestamp: ts.to_string(),
            cpu_percent: cpu,
            memory_percent: cpu / 2.0,
            memory_used_mb: cpu * 10.0,
            memory_limit_mb: 4096.0,
        }
    }

    pub(crate) fn host(cpu: f64, mem: f64, ts: &str) -> HostMetricSample {
        HostMetricSample {
            timestamp: ts.to_string(),
            cpu_percent: cpu,
            memory_percent: mem,
            memory_used_mb: 1024.0,
            memory_total_mb: 8192.0,
            disk_read_kb: 0.0,
            disk_write_mb: 0.0,
            network_in_mbit: 0.0,
            network_out_mbit: 0.0,
        }
    }

    const T1: &str = "2024-01-01T10:00:00";
    const T2: &str = "2024-01-01T10:00:30";
    const T3: &str = "2024-01-01T10:01:00";

    #[test]
    fn test_one_entry_per_key_with_max_timestamp() {
        let series = vec![
            sample("a", 10.0, T2),
            sample("b", 20.0, T1),
            sample("a", 30.0, T3),
            sample("a", 40.0, T1),
            sample("b", 50.0, T3),
        ];
        let latest = latest_per_key(&series);

        assert_eq!(latest.len(), 2);
        for (key, chosen) in &latest {
            let chosen_ts = parse_timestamp(&chosen.timestamp);
            for other in series.iter().filter(|s| s.container_name == *key) {
                assert!(chosen_ts >= parse_timestamp(&other.timestamp));
            }
        }
        assert_eq!(latest["a"].cpu_percent, 30.0);
        assert_eq!(latest["b"].cpu_percent, 50.0);
    }

    #[test]
    fn test_ties_keep_later_record() {
        let series = vec![sample("a", 1.0, T1), sample("a", 2.0, T1)];
        assert_eq!(latest_per_key(&series)["a"].cpu_percent, 2.0);
    }

    #[test]
    fn test_unparseable_never_beats_parseable() {
        let series = vec![sample("a", 1.0, T1), sample("a", 2.0, "garbage")];
        assert_eq!(latest_per_key(&series)["a"].cpu_percent, 1.0);
    }

    #[test]
    fn test_mixed_timestamp_formats() {
        let series = vec![sample("a", 1.0, "2024-01-01T10:00:00Z"), sample("a", 2.0, "2024-01-01T09:00:00")];
        assert_eq!(latest_per_key(&series)["a"].cpu_percent, 1.0);
    }

    #[test]
    fn test_reducer_is_idempotent() {
        let series = vec![sample("a", 1.0, T1), sample("b", 2.0, T2), sample("a", 3.0, T3)];
        assert_eq!(latest_per_key(&series), latest_per_key(&series));
    }

    #[test]
    fn test_top_by_cpu_example() {
        let series = vec![sample("a", 10.0, T1), sample("a", 90.0, T2), sample("b", 50.0, T1)];
        let latest = latest_per_key(&series);
        let top = top_n(latest.values().copied(), RankBy::Cpu, 1);

        assert_eq!(top.len(), 1);
        assert_eq!(top[0].container_name, "a");
        assert_eq!(top[0].cpu_percent, 90.0);
    }

    #[test]
    fn test_top_n_empty_and_short() {
        let empty: Vec<ContainerMetricSample> = Vec::new();
        assert!(top_n(&empty, RankBy::Cpu, 3).is_empty());

        let two = vec![sample("a", 1.0, T1), sample("b", 2.0, T1)];
        assert_eq!(top_n(&two, RankBy::Cpu, 3).len(), 2);
        assert_eq!(top_n(&two, RankBy::Memory, 5).len(), 2);
    }

    #[test]
    fn test_top_n_descending_nan_last() {
        let series = vec![
            sample("a", 5.0, T1),
            sample("nan", f64::NAN, T1),
            sample("b", 70.0, T1),
            sample("c", 20.0, T1),
        ];
        let names: Vec<&str> = top_n(&series, RankBy::Cpu, 4).iter().map(|s| s.container_name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a", "nan"]);
    }

    #[test]
    fn test_latest_host_sample() {
        let series = vec![host(10.0, 10.0, T2), host(20.0, 20.0, T3), host(30.0, 30.0, T1)];
        assert_eq!(latest_sample(&series).unwrap().cpu_percent, 20.0);
        assert!(latest_sample::<HostMetricSample>(&[]).is_none());
    }

    #[test]
    fn test_latest_cache_rebuilds_only_on_new_version() {
        let mut view = LatestCache::default();
        let containers = vec![sample("a", 1.0, T1), sample("a", 2.0, T2)];

        assert!(view.sync(1, &[], &containers));
        assert!(!view.sync(1, &[], &[]));
        assert_eq!(view.containers().len(), 1);

        assert!(view.sync(2, &[], &[]));
        assert!(view.containers().is_empty());
    }

    #[test]
    fn test_totals() {
        let view_samples = vec![sample("a", 10.0, T1), sample("b", 5.0, T1)];
        let totals = container_totals(&view_samples);
        assert_eq!(totals.cpu_percent, 15.0);
        assert_eq!(totals.memory_used_mb, 150.0);
    }
}
