// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deferred leaf values.
//!
//! A [`ValueProducer`] is a cheap, cloneable handle to one configuration leaf. Nothing is read
//! until [`ValueProducer::get`] is awaited; the first success is cached and every later call
//! returns it without touching the source again. Failures are not cached, so a leaf that failed
//! (for example because an environment variable was not set yet) is read again on the next call.
//! The shared remote batch keeps its own policy, see [`BatchContext`](super::BatchContext).

use crate::domain::{ConfigError, Result, ScalarKind, ScalarType, ScalarValue};
use crate::service::single_flight::{FailurePolicy, FlightState, SingleFlight};
use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// A deferred, cached value of type `T`.
///
/// # Examples
///
/// ```rust
/// use lazycfg::service::ValueProducer;
///
/// # #[tokio::main]
/// # async fn main() {
/// let producer = ValueProducer::constant(String::from("orders"));
/// assert_eq!(producer.get().await.unwrap(), "orders");
/// # }
/// ```
pub struct ValueProducer<T> {
    flight: Arc<SingleFlight<T>>,
}

impl<T: ScalarType> ValueProducer<T> {
    /// Wraps an async producer. Only successful results are cached.
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            flight: Arc::new(SingleFlight::with_policy(producer, FailurePolicy::Retry)),
        }
    }

    /// A producer that always yields `value`.
    pub fn constant(value: T) -> Self {
        Self::new(move || futures::future::ready(Ok(value.clone())))
    }

    /// Resolves the value, reading the source only if nothing is cached.
    pub async fn get(&self) -> Result<T> {
        self.flight.get().await
    }

    /// Returns true once a value has been cached.
    pub fn is_resolved(&self) -> bool {
        self.flight.state() == FlightState::Resolved
    }

    /// Returns how many times the underlying source has been read.
    pub fn reads(&self) -> usize {
        self.flight.runs()
    }
}

impl<T> Clone for ValueProducer<T> {
    fn clone(&self) -> Self {
        Self {
            flight: Arc::clone(&self.flight),
        }
    }
}

impl<T: ScalarType> fmt::Debug for ValueProducer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueProducer")
            .field("kind", &T::KIND)
            .field("flight", &self.flight)
            .finish()
    }
}

type ScalarGetter = Arc<dyn Fn() -> BoxFuture<'static, Result<ScalarValue>> + Send + Sync>;

/// A leaf producer with its value type erased.
///
/// Tree nodes hold `AnyProducer`s so leaves of different types can live side by side. The
/// typed handle is recovered with [`AnyProducer::downcast`].
#[derive(Clone)]
pub struct AnyProducer {
    kind: ScalarKind,
    typed: Arc<dyn Any + Send + Sync>,
    scalar: ScalarGetter,
}

impl AnyProducer {
    /// Erases the type of `producer`.
    pub fn new<T: ScalarType>(producer: ValueProducer<T>) -> Self {
        let erased = producer.clone();
        Self {
            kind: T::KIND,
            typed: Arc::new(producer),
            scalar: Arc::new(move || {
                let producer = erased.clone();
                async move { producer.get().await.map(ScalarType::into_scalar) }.boxed()
            }),
        }
    }

    /// Returns the type the leaf resolves to.
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Resolves the leaf as a `ScalarValue`.
    pub async fn get(&self) -> Result<ScalarValue> {
        (self.scalar)().await
    }

    /// Recovers the typed producer, or `None` if `T` is not the leaf's type.
    pub fn downcast<T: ScalarType>(&self) -> Option<ValueProducer<T>> {
        self.typed.downcast_ref::<ValueProducer<T>>().cloned()
    }

    /// Like [`downcast`](Self::downcast), failing with `TypeMismatch` for the node at `path`.
    pub fn typed<T: ScalarType>(&self, path: &str) -> Result<ValueProducer<T>> {
        self.downcast().ok_or_else(|| ConfigError::TypeMismatch {
            path: path.to_string(),
            expected: T::KIND.to_string(),
            actual: self.kind.to_string(),
        })
    }
}

impl fmt::Debug for AnyProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyProducer")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: Arc<AtomicUsize>) -> ValueProducer<f64> {
        ValueProducer::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            futures::future::ready(if n == 1 {
                Err(ConfigError::MissingEnvValue {
                    name: "PORT".to_string(),
                })
            } else {
                Ok(n as f64)
            })
        })
    }

    #[tokio::test]
    async fn test_constant_producer() {
        let producer = ValueProducer::constant(true);
        assert!(producer.get().await.unwrap());
        assert!(producer.is_resolved());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let counter = Arc::new(AtomicUsize::new(0));
        let producer = counting(counter.clone());

        assert!(producer.get().await.is_err());
        assert!(!producer.is_resolved());
        assert_eq!(producer.get().await.unwrap(), 2.0);
        assert_eq!(producer.get().await.unwrap(), 2.0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(producer.reads(), 2);
    }

    #[tokio::test]
    async fn test_clones_share_the_cache() {
        let counter = Arc::new(AtomicUsize::new(1));
        let producer = counting(counter.clone());
        let clone = producer.clone();

        assert_eq!(producer.get().await.unwrap(), 2.0);
        assert_eq!(clone.get().await.unwrap(), 2.0);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_any_producer_resolves_scalar() {
        let any = AnyProducer::new(ValueProducer::constant(String::from("x")));
        assert_eq!(any.kind(), ScalarKind::String);
        assert_eq!(any.get().await.unwrap(), ScalarValue::from("x"));
    }

    #[tokio::test]
    async fn test_any_producer_downcast() {
        let any = AnyProducer::new(ValueProducer::constant(8080.0));
        let typed = any.downcast::<f64>().unwrap();
        assert_eq!(typed.get().await.unwrap(), 8080.0);
        assert!(any.downcast::<bool>().is_none());
    }

    #[test]
    fn test_any_producer_typed_mismatch() {
        let any = AnyProducer::new(ValueProducer::constant(false));
        let err = any.typed::<String>("feature.enabled").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration value at 'feature.enabled' is a boolean, not a string"
        );
    }
}
