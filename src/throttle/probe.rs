//! CPU and memory estimates for the throttle

use parking_lot::Mutex;
use std::sync::Arc;

/// Source of host resource readings, both in percent
pub trait ResourceProbe: Send {
    fn cpu_percent(&mut self) -> f64;
    fn memory_percent(&mut self) -> f64;
}

/// Reads `/proc/stat` and `/proc/meminfo`.
///
/// CPU usage is the busy share of jiffies since the previous reading, so the
/// first reading is 0. Hosts without procfs always report 0.
#[derive(Debug, Default)]
pub struct SystemProbe {
    last_cpu: Option<CpuTimes>,
    warned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    total: u64,
    idle: u64,
}

impl SystemProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn unreadable(&mut self, what: &str) {
        if !self.warned {
            tracing::debug!("Cannot read {}; reporting 0% usage", what);
            self.warned = true;
        }
    }
}

impl ResourceProbe for SystemProbe {
    fn cpu_percent(&mut self) -> f64 {
        let Some(now) = std::fs::read_to_string("/proc/stat")
            .ok()
            .and_then(|s| parse_cpu_line(&s))
        else {
            self.unreadable("/proc/stat");
            return 0.0;
        };
        let percent = match self.last_cpu {
            Some(prev) if now.total > prev.total => {
                let total = (now.total - prev.total) as f64;
                let idle = now.idle.saturating_sub(prev.idle) as f64;
                (100.0 * (1.0 - idle / total)).clamp(0.0, 100.0)
            }
            _ => 0.0,
        };
        self.last_cpu = Some(now);
        percent
    }

    fn memory_percent(&mut self) -> f64 {
        match std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|s| parse_meminfo(&s))
        {
            Some(percent) => percent,
            None => {
                self.unreadable("/proc/meminfo");
                0.0
            }
        }
    }
}

/// Aggregate `cpu` line: user nice system idle iowait irq softirq steal ...
fn parse_cpu_line(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        total: fields.iter().sum(),
        idle,
    })
}

fn parse_meminfo(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<f64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };
    let total = field("MemTotal:")?;
    let available = field("MemAvailable:")?;
    if total <= 0.0 {
        return None;
    }
    Some((100.0 * (1.0 - available / total)).clamp(0.0, 100.0))
}

/// Probe returning values set by its owner; clones share the same reading.
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    reading: Arc<Mutex<(f64, f64)>>,
}

impl FixedProbe {
    pub fn new(cpu_percent: f64, memory_percent: f64) -> Self {
        Self {
            reading: Arc::new(Mutex::new((cpu_percent, memory_percent))),
        }
    }

    pub fn set(&self, cpu_percent: f64, memory_percent: f64) {
        *self.reading.lock() = (cpu_percent, memory_percent);
    }
}

impl ResourceProbe for FixedProbe {
    fn cpu_percent(&mut self) -> f64 {
        self.reading.lock().0
    }

    fn memory_percent(&mut self) -> f64 {
        self.reading.lock().1
    }
}
