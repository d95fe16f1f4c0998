//! CPU Affinity and Thread Priority Utilities
//!
//! Each live-pipeline stage runs on its own thread. Pinning those threads to
//! isolated cores and raising them to SCHED_FIFO keeps the scheduler from
//! migrating them mid-burst.

use anyhow::Result;
use core_affinity::CoreId;

/// Pin the current thread to a specific CPU core
///
/// # Example
/// ```no_run
/// use tachyon::perf::cpu::pin_to_core;
/// pin_to_core(2).expect("Failed to pin to core 2");
/// ```
pub fn pin_to_core(core: usize) -> Result<()> {
    let core_id = CoreId { id: core };

    if core_affinity::set_for_current(core_id) {
        tracing::info!("Pinned thread to CPU core {}", core);
        Ok(())
    } else {
        anyhow::bail!("Failed to pin thread to core {}", core)
    }
}

/// Set real-time thread priority (Linux only)
///
/// Requires CAP_SYS_NICE capability or root privileges.
#[cfg(target_os = "linux")]
pub fn set_realtime_priority(priority: i32) -> Result<()> {
    use libc::{sched_param, sched_setscheduler, SCHED_FIFO};

    let param = sched_param {
        sched_priority: priority,
    };

    // SAFETY: pid 0 targets the calling thread; `param` outlives the call.
    let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc == 0 {
        tracing::info!("Set thread priority to SCHED_FIFO:{}", priority);
        Ok(())
    } else {
        anyhow::bail!("Failed to set thread priority (may need CAP_SYS_NICE or root)")
    }
}

/// Set real-time thread priority (non-Linux platforms)
///
/// On non-Linux platforms, this is a no-op with a warning.
#[cfg(not(target_os = "linux"))]
pub fn set_realtime_priority(_priority: i32) -> Result<()> {
    tracing::warn!("Real-time priority setting not supported on this platform");
    Ok(())
}

/// Get the number of available CPU cores
pub fn num_cores() -> usize {
    core_affinity::get_core_ids()
        .map(|ids| ids.len())
        .unwrap_or(1)
}

/// Prepare a stage thread: optional pinning, optional realtime priority
///
/// Failures are logged and swallowed. A stage that cannot be pinned still
/// runs correctly, only with more jitter.
pub fn prepare_stage_thread(stage: &str, core: Option<usize>, priority: Option<i32>) {
    if let Some(core) = core {
        if core >= num_cores() {
            tracing::warn!("{} stage: core {} not available ({} cores)", stage, core, num_cores());
        } else if let Err(e) = pin_to_core(core) {
            tracing::warn!("{} stage: {:#}", stage, e);
        }
    }

    if let Some(priority) = priority {
        if let Err(e) = set_realtime_priority(priority) {
            tracing::warn!("{} stage: {:#}", stage, e);
        }
    }
}
