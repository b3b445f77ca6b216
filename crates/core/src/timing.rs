// Sequential timing harness
//
// Runs an async operation a fixed number of times, one after another, and
// reports the total wall-clock time.

use std::future::Future;
use std::time::{Duration, Instant};

/// Outcome of one timed loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Measurement {
    pub label: String,
    pub repetitions: u32,
    pub elapsed: Duration,
}

impl Measurement {
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed.as_millis()
    }
}

/// Run `operation` `repetitions` times sequentially and time the whole batch.
///
/// Each call is awaited before the next starts. The first error aborts the
/// loop and is returned as is; no end line is logged in that case.
pub async fn measure<F, Fut, T, E>(
    label: &str,
    repetitions: u32,
    mut operation: F,
) -> Result<Measurement, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let start = Instant::now();
    tracing::info!(label = %label, repetitions, "{} started...", label);

    for _ in 0..repetitions {
        operation().await?;
    }

    let elapsed = start.elapsed();
    tracing::info!(
        label = %label,
        repetitions,
        elapsed_ms = elapsed.as_millis() as u64,
        "{} - ended {}",
        label,
        elapsed.as_millis()
    );

    Ok(Measurement {
        label: label.to_string(),
        repetitions,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_runs_operation_repetition_times() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let measurement = measure("count", 7, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 7);
        assert_eq!(measurement.label, "count");
        assert_eq!(measurement.repetitions, 7);
    }

    #[tokio::test]
    async fn test_zero_repetitions_never_calls() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let measurement = measure("none", 0, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(measurement.repetitions, 0);
    }

    #[tokio::test]
    async fn test_stops_at_first_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = measure("failing", 10, move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 3 {
                Err(format!("call {} failed", n))
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "call 3 failed");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_elapsed_covers_all_calls() {
        let measurement = measure("sleepy", 4, || async {
            tokio::time::sleep(Duration::from_millis(25)).await;
            Ok::<_, String>(())
        })
        .await
        .unwrap();

        assert!(measurement.elapsed >= Duration::from_millis(100));
        assert!(measurement.elapsed_ms() >= 100);
    }
}
