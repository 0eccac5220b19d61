use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::telemetry::RequestEvent;

#[derive(Debug, Copy, Clone)]
pub struct OperationStatistics {
    pub count: u64,
    pub failures: u64,
    pub min_rtt: Duration,
    pub max_rtt: Duration,
    pub total_rtt: Duration,
    pub total_length: u64,
}

impl Default for OperationStatistics {
    fn default() -> Self {
        Self {
            count: 0,
            failures: 0,
            min_rtt: Duration::MAX,
            max_rtt: Duration::ZERO,
            total_rtt: Duration::ZERO,
            total_length: 0,
        }
    }
}

impl OperationStatistics {
    fn update(&mut self, event: &RequestEvent) {
        let cur = event.response_time;
        if cur < self.min_rtt {
            self.min_rtt = cur;
        }
        if cur > self.max_rtt {
            self.max_rtt = cur;
        }
        self.total_rtt += cur;
        self.total_length += event.response_length;
        self.count += 1;
        if !event.is_success() {
            self.failures += 1;
        }
    }

    #[inline]
    #[must_use]
    pub fn mean_rtt(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_rtt / n,
            Err(_) => self.total_rtt.div_f64(self.count as f64),
        }
    }

    fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.failures += other.failures;
        self.min_rtt = self.min_rtt.min(other.min_rtt);
        self.max_rtt = self.max_rtt.max(other.max_rtt);
        self.total_rtt += other.total_rtt;
        self.total_length += other.total_length;
    }
}

/// Per `(request type, name)` latency and failure counts.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    rows: BTreeMap<(String, String), OperationStatistics>,
}

impl Statistics {
    pub fn record(&mut self, event: &RequestEvent) {
        self.rows
            .entry((event.request_type.clone(), event.name.clone()))
            .or_default()
            .update(event);
    }

    #[must_use]
    pub fn get(&self, request_type: &str, name: &str) -> Option<&OperationStatistics> {
        self.rows.get(&(request_type.to_string(), name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &OperationStatistics)> {
        self.rows
            .iter()
            .map(|((ty, name), stats)| (ty.as_str(), name.as_str(), stats))
    }

    #[must_use]
    pub fn total(&self) -> OperationStatistics {
        let mut total = OperationStatistics::default();
        for stats in self.rows.values() {
            total.merge(stats);
        }
        total
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<8} {:<24} {:>8} {:>8} {:>12} {:>12} {:>12} {:>12}",
            "Type", "Name", "# reqs", "# fails", "min my s", "mean my s", "max my s", "length"
        )?;
        let total = self.total();
        let rows = self
            .iter()
            .chain(std::iter::once(("", "Aggregated", &total)));
        for (ty, name, s) in rows {
            let min = if s.count == 0 { 0 } else { s.min_rtt.as_micros() };
            writeln!(
                f,
                "{:<8} {:<24} {:>8} {:>8} {:>12} {:>12.2} {:>12} {:>12}",
                ty,
                name,
                s.count,
                s.failures,
                min,
                s.mean_rtt().as_secs_f64() * 1_000_000.0,
                s.max_rtt.as_micros(),
                s.total_length,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::SystemTime;

    fn event(name: &str, micros: u64, failed: bool) -> RequestEvent {
        let mut e = RequestEvent::new("POST", name, SystemTime::now());
        e.response_time = Duration::from_micros(micros);
        if failed {
            e.exception = Some(anyhow::anyhow!("failed"));
        } else {
            e.response_length = 3;
        }
        e
    }

    #[test]
    fn tracks_min_mean_max_per_name() {
        let mut stats = Statistics::default();
        stats.record(&event("/players", 10, false));
        stats.record(&event("/players", 30, false));
        stats.record(&event("/games/create", 5, true));
        let players = stats.get("POST", "/players").unwrap();
        assert_eq!(players.count, 2);
        assert_eq!(players.min_rtt, Duration::from_micros(10));
        assert_eq!(players.max_rtt, Duration::from_micros(30));
        assert_eq!(players.mean_rtt(), Duration::from_micros(20));
        assert_eq!(players.total_length, 6);
        let total = stats.total();
        assert_eq!(total.count, 3);
        assert_eq!(total.failures, 1);
        assert_eq!(total.min_rtt, Duration::from_micros(5));
    }

    #[test]
    fn renders_aggregated_row() {
        let mut stats = Statistics::default();
        stats.record(&event("/players", 10, false));
        let table = stats.to_string();
        assert!(table.contains("/players"));
        assert!(table.contains("Aggregated"));
    }

    #[test]
    fn renders_one_line_per_row_plus_header_and_total() {
        let mut stats = Statistics::default();
        assert!(stats.is_empty());
        stats.record(&event("/players", 10, false));
        stats.record(&event("/games/create", 20, true));
        assert!(!stats.is_empty());
        let table = stats.to_string();
        assert_eq!(table.lines().count(), 4);
        assert!(table.ends_with('\n'));
    }
}
