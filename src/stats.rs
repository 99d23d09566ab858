//! Build measurements (informational only)

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use sysinfo::{ProcessRefreshKind, System};

/// Resident memory of the current process, in bytes
pub fn resident_memory() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    if !system.refresh_process_specifics(pid, ProcessRefreshKind::everything()) {
        return None;
    }
    system.process(pid).map(|process| process.memory())
}

/// Records the resident memory at creation
pub struct MemoryProbe {
    initial: Option<u64>,
}

impl MemoryProbe {
    pub fn start() -> Self {
        Self {
            initial: resident_memory(),
        }
    }

    /// Difference with the initial resident memory (bytes)
    pub fn delta(&self) -> Option<i64> {
        let initial = self.initial?;
        let current = resident_memory()?;
        Some(current as i64 - initial as i64)
    }
}

/// Summary of an index construction
#[derive(Serialize, Clone, Debug)]
pub struct BuildReport {
    pub block_size: usize,
    pub documents: usize,
    pub blocks: usize,
    pub terms: usize,
    pub postings: usize,
    pub elapsed: Duration,

    /// Resident memory difference in bytes (unknown on some platforms)
    pub memory_delta: Option<i64>,
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Block Size: {} | Time Taken: {:.2} sec | Memory Used: ",
            self.block_size,
            self.elapsed.as_secs_f64()
        )?;
        match self.memory_delta {
            Some(delta) => write!(f, "{:.2} MB", delta as f64 / (1024. * 1024.)),
            None => write!(f, "n/a"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let report = BuildReport {
            block_size: 200,
            documents: 2,
            blocks: 4,
            terms: 3,
            postings: 4,
            elapsed: Duration::from_millis(1500),
            memory_delta: Some(3 * 1024 * 1024 / 2),
        };
        assert_eq!(
            report.to_string(),
            "Block Size: 200 | Time Taken: 1.50 sec | Memory Used: 1.50 MB"
        );

        let report = BuildReport {
            memory_delta: None,
            ..report
        };
        assert!(report.to_string().ends_with("Memory Used: n/a"));
    }

    #[test]
    fn test_memory_probe() {
        let probe = MemoryProbe::start();
        if probe.initial.is_some() && resident_memory().is_some() {
            assert!(probe.delta().is_some());
        }
    }
}
