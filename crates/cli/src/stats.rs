//! Run statistics.

use std::time::Duration;

use router::RouterMetricsSnapshot;

/// Statistics from one `run`
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Input lines read
    pub lines_read: u64,

    /// Events handed to the router
    pub events_routed: u64,

    /// Lines that were not valid events
    pub invalid_lines: u64,

    /// Total duration of the run
    pub duration: Duration,

    /// Router counters at shutdown
    pub router: RouterMetricsSnapshot,
}

impl RunStats {
    /// Events per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.events_routed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Statistics ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Lines read: {}", self.lines_read);
        println!("Events routed: {}", self.events_routed);
        println!("Invalid lines: {}", self.invalid_lines);
        println!("Throughput: {:.2} events/s", self.throughput());
        println!();
        print!("{}", self.router);
    }
}
