use std::time::Duration;

use time::OffsetDateTime;

pub trait TimeProvider: Clone + Send + Sync + 'static {
    type Sleep<'a>: Future<Output = ()> + Send + 'a
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime;
    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a>;
}

/// Runs `fut` until it settles or `limit` elapses on `time`, whichever comes
/// first. `None` means the deadline won.
pub async fn with_deadline<T, F>(time: &T, limit: Duration, fut: F) -> Option<F::Output>
where
    T: TimeProvider,
    F: Future,
{
    tokio::select! {
        biased;
        output = fut => Some(output),
        () = time.sleep(limit) => None,
    }
}
