//! Parameters for a mapreduce job.
//!

use std::env;

/// Environment variable consulted by `JobParameters::from_env()`.
pub const THREADS_ENV: &str = "MR_THREADS";

#[derive(Clone, Debug)]
pub struct JobParameters {
    pub threads: usize,
    pub partition_prealloc_size: usize,
    pub thread_name_prefix: String,
}

impl Default for JobParameters {
    fn default() -> JobParameters {
        JobParameters::new()
    }
}

impl JobParameters {
    pub fn new() -> JobParameters {
        JobParameters {
            threads: num_cpus::get(),
            partition_prealloc_size: 64,
            thread_name_prefix: String::from("mr-worker-"),
        }
    }

    /// Like `new()`, but takes the thread count from `MR_THREADS` if it is set to a
    /// positive integer.
    pub fn from_env() -> JobParameters {
        let params = JobParameters::new();
        match env::var(THREADS_ENV).ok().and_then(|v| v.trim().parse::<usize>().ok()) {
            Some(n) if n > 0 => params.set_threads(n),
            _ => params,
        }
    }

    /// Determines how many worker threads the job runs on. Every worker maps, sorts and
    /// reduces; worker 0 additionally performs the shuffle. Must be at least 1.
    ///
    /// Default: number of CPUs
    pub fn set_threads(mut self, n: usize) -> JobParameters {
        self.threads = n;
        self
    }

    /// How many intermediate records is every worker's partition expected to hold? (used for
    /// pre-allocating buffers)
    ///
    /// Default 64
    pub fn set_partition_prealloc_size(mut self, n: usize) -> JobParameters {
        self.partition_prealloc_size = n;
        self
    }

    /// Worker threads are named `<prefix><id>`.
    /// Default: mr-worker-
    pub fn set_thread_name_prefix(mut self, prefix: String) -> JobParameters {
        self.thread_name_prefix = prefix;
        self
    }

    pub fn thread_name(&self, worker: usize) -> String {
        format!("{}{}", self.thread_name_prefix, worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let p = JobParameters::new()
            .set_threads(3)
            .set_partition_prealloc_size(10)
            .set_thread_name_prefix(String::from("wc-"));
        assert_eq!(p.threads, 3);
        assert_eq!(p.partition_prealloc_size, 10);
        assert_eq!(p.thread_name(2), "wc-2");
    }

    #[test]
    fn test_defaults() {
        let p = JobParameters::default();
        assert!(p.threads >= 1);
        assert_eq!(p.thread_name(0), "mr-worker-0");
    }

    // Only test that touches MR_THREADS.
    #[test]
    fn test_from_env() {
        env::set_var(THREADS_ENV, "7");
        assert_eq!(JobParameters::from_env().threads, 7);
        env::set_var(THREADS_ENV, "0");
        assert_eq!(JobParameters::from_env().threads, num_cpus::get());
        env::set_var(THREADS_ENV, "many");
        assert_eq!(JobParameters::from_env().threads, num_cpus::get());
        env::remove_var(THREADS_ENV);
    }
}
