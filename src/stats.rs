// Normalize raw Docker stats responses into comparable instantaneous metrics.
// Pure functions over the snapshot(s) passed in; no I/O.

use crate::models::{ContainerStatsRecord, StatsTick};
use bollard::models::{ContainerCpuStats, ContainerStatsResponse};
use chrono::{DateTime, SecondsFormat, Utc};

/// The CPU counters of one snapshot that a rate computation needs.
/// Two consecutive samples for the same container give one CPU percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSample {
    pub total_usage: u64,
    pub system_usage: u64,
    /// 0 when the daemon did not report it.
    pub online_cpus: u32,
    pub percpu_len: usize,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Extract a [`CpuSample`] from one cycle's CPU stats block.
/// Returns `None` when the block has no usage counters at all.
pub fn cpu_sample(cpu: &ContainerCpuStats) -> Option<CpuSample> {
    let usage = cpu.cpu_usage.as_ref()?;
    Some(CpuSample {
        total_usage: usage.total_usage.unwrap_or(0),
        system_usage: cpu.system_cpu_usage.unwrap_or(0),
        online_cpus: cpu.online_cpus.unwrap_or(0),
        percpu_len: usage.percpu_usage.as_ref().map_or(0, |p| p.len()),
    })
}

/// CPU usage percent between two consecutive samples, rounded to 2 decimals.
///
/// The guard is asymmetric on purpose: both deltas must be strictly positive,
/// so zero activity, counter resets and clock skew all map to exactly 0.0
/// instead of a negative or NaN rate. A genuinely negative delta from a real
/// counter rollover is clamped to 0.0 as well; the two cases are not
/// distinguishable from the snapshots alone.
pub fn cpu_percent(current: &CpuSample, previous: &CpuSample) -> f64 {
    let cpu_delta = current.total_usage as i64 - previous.total_usage as i64;
    let system_delta = current.system_usage as i64 - previous.system_usage as i64;
    if system_delta <= 0 || cpu_delta <= 0 {
        return 0.0;
    }
    let num_cpus = if current.online_cpus > 0 {
        current.online_cpus as f64
    } else if current.percpu_len > 0 {
        current.percpu_len as f64
    } else {
        1.0
    };
    round2((cpu_delta as f64 / system_delta as f64) * num_cpus * 100.0)
}

/// Memory usage percent, rounded to 2 decimals; 0.0 when the limit is 0.
pub fn memory_percent(usage: u64, limit: u64) -> f64 {
    if limit > 0 {
        round2(usage as f64 / limit as f64 * 100.0)
    } else {
        0.0
    }
}

/// Sum of `rx_bytes`/`tx_bytes` across every interface; (0, 0) when the
/// snapshot carries no network map.
pub fn network_totals(s: &ContainerStatsResponse) -> (u64, u64) {
    s.networks.as_ref().map_or((0, 0), |n| {
        let mut rx = 0u64;
        let mut tx = 0u64;
        for v in n.values() {
            rx += v.rx_bytes.unwrap_or(0);
            tx += v.tx_bytes.unwrap_or(0);
        }
        (rx, tx)
    })
}

/// Sum of service-bytes entries tagged "read"/"write" across every device;
/// (0, 0) when the snapshot carries no blkio list.
pub fn block_io_totals(s: &ContainerStatsResponse) -> (u64, u64) {
    s.blkio_stats
        .as_ref()
        .and_then(|b| b.io_service_bytes_recursive.as_ref())
        .map_or((0, 0), |entries| {
            let mut read = 0u64;
            let mut write = 0u64;
            for e in entries {
                if e.op.as_ref().is_some_and(|op| op.eq_ignore_ascii_case("read")) {
                    read += e.value.unwrap_or(0);
                } else if e
                    .op
                    .as_ref()
                    .is_some_and(|op| op.eq_ignore_ascii_case("write"))
                {
                    write += e.value.unwrap_or(0);
                }
            }
            (read, write)
        })
}

/// Lenient timestamp conversion to epoch seconds. Integers pass through
/// unchanged; ISO-8601 strings (Z = UTC) are converted; anything else is 0.
/// Timestamp display is non-critical, so bad input never fails a request.
pub fn parse_timestamp(value: &serde_json::Value) -> i64 {
    if let Some(n) = value.as_i64() {
        return n;
    }
    if let Some(s) = value.as_str() {
        return DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.timestamp())
            .unwrap_or(0);
    }
    0
}

fn memory_usage(s: &ContainerStatsResponse) -> (u64, u64) {
    let usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);
    (usage, limit)
}

/// One-shot record from a single bundled response. The daemon tracks the
/// previous cycle itself (`precpu_stats`), so one poll is enough for a delta.
pub fn normalize(s: &ContainerStatsResponse, container_id: &str) -> ContainerStatsRecord {
    let current = s.cpu_stats.as_ref().and_then(cpu_sample);
    let previous = s.precpu_stats.as_ref().and_then(cpu_sample);
    let cpu = match (&current, &previous) {
        (Some(c), Some(p)) => cpu_percent(c, p),
        _ => 0.0,
    };
    let (memory_usage, memory_limit) = memory_usage(s);
    let (network_rx, network_tx) = network_totals(s);
    let (block_read, block_write) = block_io_totals(s);
    ContainerStatsRecord {
        container_id: container_id.to_string(),
        cpu_percent: cpu,
        memory_usage,
        memory_limit,
        memory_percent: memory_percent(memory_usage, memory_limit),
        network_rx,
        network_tx,
        block_read,
        block_write,
    }
}

/// Streaming tick: the CPU delta spans two consecutive pulls, so the caller
/// threads the previous sample through. The first tick (no previous) reports
/// 0.0. Returns the new sample to carry forward, when the snapshot had one.
pub fn normalize_tick(
    s: &ContainerStatsResponse,
    previous: Option<&CpuSample>,
) -> (StatsTick, Option<CpuSample>) {
    let current = s.cpu_stats.as_ref().and_then(cpu_sample);
    let cpu = match (&current, previous) {
        (Some(c), Some(p)) => cpu_percent(c, p),
        _ => 0.0,
    };
    let (usage, limit) = memory_usage(s);
    let tick = StatsTick {
        cpu_percent: cpu,
        memory_usage: usage,
        memory_percent: memory_percent(usage, limit),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    (tick, current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{
        ContainerBlkioStatEntry, ContainerBlkioStats, ContainerCpuUsage, ContainerMemoryStats,
        ContainerNetworkStats,
    };
    use std::collections::HashMap;

    fn sample(total: u64, system: u64, online: u32) -> CpuSample {
        CpuSample {
            total_usage: total,
            system_usage: system,
            online_cpus: online,
            percpu_len: 0,
        }
    }

    #[test]
    fn cpu_percent_matches_reference_case() {
        // 1000 -> 1400 against 10000 -> 11000 on 4 CPUs: (400/1000)*4*100
        let prev = sample(1000, 10_000, 4);
        let curr = sample(1400, 11_000, 4);
        assert_eq!(cpu_percent(&curr, &prev), 160.0);
    }

    #[test]
    fn cpu_percent_zero_when_system_delta_not_positive() {
        let prev = sample(100, 500, 2);
        let curr = sample(200, 500, 2);
        assert_eq!(cpu_percent(&curr, &prev), 0.0);
        let curr = sample(200, 400, 2);
        assert_eq!(cpu_percent(&curr, &prev), 0.0);
    }

    #[test]
    fn cpu_percent_zero_when_cpu_delta_not_positive() {
        // Counter reset: total usage went backwards. Clamped, not negative.
        let prev = sample(500, 1000, 2);
        let curr = sample(400, 2000, 2);
        assert_eq!(cpu_percent(&curr, &prev), 0.0);
        let curr = sample(500, 2000, 2);
        assert_eq!(cpu_percent(&curr, &prev), 0.0);
    }

    #[test]
    fn cpu_percent_falls_back_to_percpu_count_then_one() {
        let prev = CpuSample {
            total_usage: 100,
            system_usage: 1000,
            online_cpus: 0,
            percpu_len: 2,
        };
        let curr = CpuSample {
            total_usage: 200,
            system_usage: 2000,
            online_cpus: 0,
            percpu_len: 2,
        };
        assert_eq!(cpu_percent(&curr, &prev), 20.0);

        let prev = sample(100, 1000, 0);
        let curr = sample(200, 2000, 0);
        assert_eq!(cpu_percent(&curr, &prev), 10.0);
    }

    #[test]
    fn cpu_percent_rounds_to_two_decimals() {
        // 1/3 of one CPU
        let prev = sample(0, 0, 1);
        let curr = sample(1, 3, 1);
        assert_eq!(cpu_percent(&curr, &prev), 33.33);
    }

    #[test]
    fn memory_percent_zero_limit_is_zero() {
        assert_eq!(memory_percent(50, 0), 0.0);
    }

    #[test]
    fn memory_percent_computes_and_rounds() {
        assert_eq!(memory_percent(50, 200), 25.0);
        assert_eq!(memory_percent(1, 3), 33.33);
    }

    #[test]
    fn network_totals_empty_and_missing() {
        let s = ContainerStatsResponse::default();
        assert_eq!(network_totals(&s), (0, 0));
        let s = ContainerStatsResponse {
            networks: Some(HashMap::new()),
            ..Default::default()
        };
        assert_eq!(network_totals(&s), (0, 0));
    }

    #[test]
    fn network_totals_sums_across_interfaces() {
        let mut n = HashMap::new();
        n.insert(
            "eth0".to_string(),
            ContainerNetworkStats {
                rx_bytes: Some(1000),
                tx_bytes: Some(2000),
                ..Default::default()
            },
        );
        n.insert(
            "eth1".to_string(),
            ContainerNetworkStats {
                rx_bytes: Some(10),
                tx_bytes: Some(20),
                ..Default::default()
            },
        );
        let s = ContainerStatsResponse {
            networks: Some(n),
            ..Default::default()
        };
        assert_eq!(network_totals(&s), (1010, 2020));
    }

    #[test]
    fn block_io_totals_missing_is_zero() {
        let s = ContainerStatsResponse::default();
        assert_eq!(block_io_totals(&s), (0, 0));
    }

    #[test]
    fn block_io_totals_sums_read_and_write_entries() {
        let entries = vec![
            ContainerBlkioStatEntry {
                op: Some("Read".to_string()),
                value: Some(100),
                ..Default::default()
            },
            ContainerBlkioStatEntry {
                op: Some("read".to_string()),
                value: Some(50),
                ..Default::default()
            },
            ContainerBlkioStatEntry {
                op: Some("write".to_string()),
                value: Some(200),
                ..Default::default()
            },
            // Untagged ops are neither read nor write; ignored.
            ContainerBlkioStatEntry {
                op: Some("sync".to_string()),
                value: Some(999),
                ..Default::default()
            },
        ];
        let s = ContainerStatsResponse {
            blkio_stats: Some(ContainerBlkioStats {
                io_service_bytes_recursive: Some(entries),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(block_io_totals(&s), (150, 200));
    }

    #[test]
    fn parse_timestamp_integer_passes_through() {
        assert_eq!(parse_timestamp(&serde_json::json!(1_700_000_000)), 1_700_000_000);
        assert_eq!(parse_timestamp(&serde_json::json!(0)), 0);
    }

    #[test]
    fn parse_timestamp_iso_string_converts() {
        assert_eq!(
            parse_timestamp(&serde_json::json!("2024-01-01T00:00:00Z")),
            1_704_067_200
        );
    }

    #[test]
    fn parse_timestamp_garbage_is_zero() {
        assert_eq!(parse_timestamp(&serde_json::json!("not a date")), 0);
        assert_eq!(parse_timestamp(&serde_json::json!(null)), 0);
        assert_eq!(parse_timestamp(&serde_json::json!({"a": 1})), 0);
    }

    fn cpu_block(total: u64, system: u64, online: u32) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total),
                ..Default::default()
            }),
            system_cpu_usage: Some(system),
            online_cpus: Some(online),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_one_shot_uses_bundled_previous_cycle() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(cpu_block(1400, 11_000, 4)),
            precpu_stats: Some(cpu_block(1000, 10_000, 4)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(50),
                limit: Some(200),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = normalize(&s, "abc123");
        assert_eq!(record.container_id, "abc123");
        assert_eq!(record.cpu_percent, 160.0);
        assert_eq!(record.memory_usage, 50);
        assert_eq!(record.memory_limit, 200);
        assert_eq!(record.memory_percent, 25.0);
    }

    #[test]
    fn normalize_missing_cpu_blocks_is_zero() {
        let record = normalize(&ContainerStatsResponse::default(), "x");
        assert_eq!(record.cpu_percent, 0.0);
        assert_eq!(record.memory_percent, 0.0);
    }

    #[test]
    fn normalize_tick_first_tick_has_zero_cpu_then_delta() {
        let first = ContainerStatsResponse {
            cpu_stats: Some(cpu_block(1000, 10_000, 4)),
            ..Default::default()
        };
        let (tick, prev) = normalize_tick(&first, None);
        assert_eq!(tick.cpu_percent, 0.0);
        let prev = prev.expect("sample from first tick");

        let second = ContainerStatsResponse {
            cpu_stats: Some(cpu_block(1400, 11_000, 4)),
            ..Default::default()
        };
        let (tick, _) = normalize_tick(&second, Some(&prev));
        assert_eq!(tick.cpu_percent, 160.0);
        assert!(!tick.timestamp.is_empty());
    }
}
