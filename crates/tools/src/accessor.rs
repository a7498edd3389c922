//! Lazily built, process-wide management client.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use crate::error::ConfigurationError;

type Factory<C> = Box<dyn Fn() -> Result<C, ConfigurationError> + Send + Sync>;

/// Holds the one client instance shared by every tool call.
///
/// The factory runs at most once, on the first [`ClientAccessor::get`].
/// Callers racing on that first call block until it finishes and then all
/// see the same client, or the same error. A failed construction is never
/// retried.
///
/// [`ClientAccessor::get`] blocks while the factory runs. Async callers
/// should make the first call from the blocking pool.
pub struct ClientAccessor<C> {
    cell: OnceLock<Result<Arc<C>, ConfigurationError>>,
    factory: Option<Factory<C>>,
}

impl<C: Send + Sync> ClientAccessor<C> {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Result<C, ConfigurationError> + Send + Sync + 'static,
    {
        Self {
            cell: OnceLock::new(),
            factory: Some(Box::new(factory)),
        }
    }

    /// An accessor around an already constructed client.
    pub fn ready(client: C) -> Self {
        Self {
            cell: OnceLock::from(Ok(Arc::new(client))),
            factory: None,
        }
    }

    pub fn get(&self) -> Result<Arc<C>, ConfigurationError> {
        self.cell
            .get_or_init(|| {
                let built = match &self.factory {
                    Some(factory) => factory(),
                    None => Err(ConfigurationError("no client factory".into())),
                };
                match &built {
                    Ok(_) => info!("management client initialised"),
                    Err(e) => error!(error = %e, "management client unavailable"),
                }
                built.map(Arc::new)
            })
            .clone()
    }

    /// Whether construction has been attempted.
    pub fn is_initialised(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<C> fmt::Debug for ClientAccessor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            None => "pending",
            Some(Ok(_)) => "ready",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ClientAccessor").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    const CALLERS: usize = 16;

    fn race<C: Send + Sync + 'static>(
        accessor: Arc<ClientAccessor<C>>,
    ) -> Vec<Result<Arc<C>, ConfigurationError>> {
        let barrier = Arc::new(Barrier::new(CALLERS));
        let handles: Vec<_> = (0..CALLERS)
            .map(|_| {
                let accessor = Arc::clone(&accessor);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    accessor.get()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    }

    #[test]
    fn concurrent_first_use_constructs_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let accessor = Arc::new(ClientAccessor::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            Ok(String::from("client"))
        }));

        let results = race(Arc::clone(&accessor));

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        let first = results[0].as_ref().unwrap();
        for result in &results {
            assert!(Arc::ptr_eq(first, result.as_ref().unwrap()));
        }
    }

    #[test]
    fn failure_is_cached_and_never_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let accessor = Arc::new(ClientAccessor::<String>::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ConfigurationError("missing client secret".into()))
        }));

        let results = race(Arc::clone(&accessor));
        let later = accessor.get();

        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        for result in results.iter().chain(std::iter::once(&later)) {
            assert_eq!(
                result.as_ref().unwrap_err(),
                &ConfigurationError("missing client secret".into())
            );
        }
    }

    #[test]
    fn construction_is_lazy() {
        let accessor = ClientAccessor::new(|| Ok(1u8));
        assert!(!accessor.is_initialised());
        assert_eq!(format!("{accessor:?}"), r#"ClientAccessor { state: "pending" }"#);

        assert_eq!(*accessor.get().unwrap(), 1);
        assert!(accessor.is_initialised());

        let ready = ClientAccessor::ready(2u8);
        assert_eq!(*ready.get().unwrap(), 2);
    }
}
