//! Peak resident set size, read via `getrusage(RUSAGE_SELF)` — same call the original planner's
//! `planSearchStatUpdatePeakMemory` uses (`search_stat.c`). On Linux `ru_maxrss` is already in
//! kilobytes; this crate only targets Linux so no macOS byte-vs-kilobyte correction is needed.
pub fn peak_rss_mb() -> u64 {
    unsafe {
        let mut usage: libc::rusage = std::mem::zeroed();
        if libc::getrusage(libc::RUSAGE_SELF, &mut usage) != 0 {
            return 0;
        }
        usage.ru_maxrss as u64 / 1024
    }
}
