//! # Example: process_end
//!
//! Global and terminate tasks run when the process ends.
//!
//! Shows how to:
//! - Register global tasks and terminate callbacks through [`Defer`].
//! - Gate terminate callbacks on the run's outcome with [`ResponseStatus`].
//! - Inspect the host's process-end capabilities.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Defer::global(flush metrics)
//!   ├─► Defer::terminate(send report, run_always = false)
//!   ├─► Defer::terminate(remove pid file, run_always = true)
//!   ├─► ResponseStatus::set(code)
//!   └─► return ──► atexit ──► terminate stack ──► global stack
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example process_end          # exit status 0: everything runs
//! cargo run --example process_end -- fail  # status 500: the report is skipped
//! ```
//! Press Ctrl-C during the pause to trigger the same sequence from a signal.

use std::time::Duration;

use taskdefer::{Defer, ResponseStatus};

fn main() {
    let fail = std::env::args().nth(1).as_deref() == Some("fail");

    let report = Defer::handler().signal_handling_info();
    println!("platform={} sapi={}", report.platform, report.sapi);
    for (name, available) in &report.capabilities {
        println!("  {name:<24} {available}");
    }

    Defer::global(|| println!("global: flush metrics"));
    Defer::terminate(|| println!("terminate: send report"), false);
    Defer::terminate(|| println!("terminate: remove pid file"), true);

    println!("working...");
    std::thread::sleep(Duration::from_millis(500));

    ResponseStatus::set(if fail { 500 } else { 200 });
    println!("main returns");
}
