//! Global parameters that can be tuned from environment variables without becoming CLI flags.
//!
//! These are knobs that matter for performance tuning or debugging but are not common enough to
//! deserve a place in `plan_cli`'s argument list: segment sizes, queue promotion thresholds,
//! channel capacities. Each is exposed as an `EnvParam<T>` that reads its environment variable
//! (if set) on first access and then stays fixed for the life of the process.
//!
//! ```
//! use plan_env_param::EnvParam;
//! static MY_PARAM: EnvParam<u32> = EnvParam::new("MY_PARAM", "0");
//! assert_eq!(MY_PARAM.get(), 0);
//! ```

use once_cell::sync::OnceCell;
use std::str::FromStr;

pub struct EnvParam<T> {
    value: OnceCell<T>,
    env: &'static str,
    default: &'static str,
}

impl<T: FromStr> EnvParam<T>
where
    T::Err: std::fmt::Debug,
{
    pub const fn new(env: &'static str, default: &'static str) -> Self {
        EnvParam {
            value: OnceCell::new(),
            env,
            default,
        }
    }

    /// Forces the parameter to `v`, ignoring the environment. Panics if already initialized.
    pub fn set(&self, v: T) {
        self.value
            .set(v)
            .unwrap_or_else(|_| panic!("EnvParam {} already initialized", self.env));
    }

    pub fn get(&self) -> T
    where
        T: Copy,
    {
        *self.value.get_or_init(|| {
            let raw = std::env::var(self.env).unwrap_or_else(|_| self.default.to_string());
            raw.parse()
                .unwrap_or_else(|e| panic!("invalid value for {}: {:?}", self.env, e))
        })
    }
}

/// Number of elements per segment in `StatePool`'s packed-state backing store and its attribute
/// arrays. See `plan_collections::segmented`.
pub static SEGMENT_SIZE: EnvParam<usize> = EnvParam::new("PLAN_SEGMENT_SIZE", "128");

/// Key above which `BucketQueue` promotes itself from a bucket array to a binary heap.
pub static BUCKET_QUEUE_MAX_KEY: EnvParam<u32> = EnvParam::new("PLAN_PQ_BUCKET_SIZE", "10000");

/// Bound on an in-process `Comm` channel before `send_to` blocks, modeling the original's
/// full/empty semaphore pair.
pub static MA_CHANNEL_CAPACITY: EnvParam<usize> = EnvParam::new("PLAN_MA_CHANNEL_CAPACITY", "1024");

/// Initial capacity reserved per hash bucket in `StatePool`'s dedup table.
pub static STATE_POOL_INITIAL_CAPACITY: EnvParam<usize> = EnvParam::new("PLAN_STATE_POOL_INIT", "1024");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_used_when_unset() {
        static P: EnvParam<u32> = EnvParam::new("PLAN_ENV_PARAM_TEST_UNSET", "7");
        assert_eq!(P.get(), 7);
    }

    #[test]
    fn explicit_set_wins() {
        static P: EnvParam<u32> = EnvParam::new("PLAN_ENV_PARAM_TEST_SET", "7");
        P.set(42);
        assert_eq!(P.get(), 42);
    }
}
