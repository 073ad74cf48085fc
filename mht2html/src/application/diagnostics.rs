use std::fmt;
use std::time::{Duration, Instant};

/// Wall time and peak resident memory of the current process.
pub struct RunStats {
    pub elapsed: Duration,
    /// kB, when the platform exposes it.
    pub peak_rss_kb: Option<u64>,
}

impl RunStats {
    pub fn since(start: Instant) -> Self {
        Self {
            elapsed: start.elapsed(),
            peak_rss_kb: peak_rss_kb(),
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "elapsed {:.3}s", self.elapsed.as_secs_f64())?;
        match self.peak_rss_kb {
            Some(kb) => write!(f, ", peak memory {}", human_kb(kb)),
            None => write!(f, ", peak memory n/a"),
        }
    }
}

fn peak_rss_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    parse_vm_hwm(&status)
}

/// Reads the `VmHWM:` line of a `/proc/<pid>/status` dump.
fn parse_vm_hwm(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmHWM:"))?;
    let mut fields = line["VmHWM:".len()..].split_whitespace();
    let value: u64 = fields.next()?.parse().ok()?;
    match fields.next() {
        Some("kB") | None => Some(value),
        Some(_) => None,
    }
}

fn human_kb(kb: u64) -> String {
    if kb >= 1024 * 1024 {
        format!("{:.2} GiB", kb as f64 / (1024.0 * 1024.0))
    } else if kb >= 1024 {
        format!("{:.2} MiB", kb as f64 / 1024.0)
    } else {
        format!("{kb} KiB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATUS: &str = "Name:\tmht2html\nVmPeak:\t   10240 kB\nVmHWM:\t    5120 kB\nVmRSS:\t    4096 kB\n";

    #[test]
    fn reads_high_water_mark() {
        assert_eq!(parse_vm_hwm(STATUS), Some(5120));
    }

    #[test]
    fn missing_or_odd_lines() {
        assert_eq!(parse_vm_hwm("Name:\tx\n"), None);
        assert_eq!(parse_vm_hwm("VmHWM:\tlots kB\n"), None);
        assert_eq!(parse_vm_hwm("VmHWM:\t12 pages\n"), None);
    }

    #[test]
    fn display() {
        let s = RunStats {
            elapsed: Duration::from_millis(1500),
            peak_rss_kb: Some(5120),
        };
        assert_eq!(s.to_string(), "elapsed 1.500s, peak memory 5.00 MiB");
        let s = RunStats {
            elapsed: Duration::ZERO,
            peak_rss_kb: None,
        };
        assert_eq!(s.to_string(), "elapsed 0.000s, peak memory n/a");
    }

    #[test]
    fn units() {
        assert_eq!(human_kb(12), "12 KiB");
        assert_eq!(human_kb(3 * 1024 * 1024), "3.00 GiB");
    }
}
