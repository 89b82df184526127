//! Test doubles shared by the unit tests.

use crate::ports::{self, DeliveryError};
use crate::types::push::{PushSubscription, Subscription, SubscriptionKeys};

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub(crate) fn fixed_now() -> OffsetDateTime {
    OffsetDateTime::parse("2025-01-12T09:30:00Z", &Rfc3339).expect("parse now")
}

pub(crate) fn push_subscription(endpoint: &str) -> PushSubscription {
    PushSubscription {
        endpoint: endpoint.to_string(),
        expiration_time: None,
        keys: SubscriptionKeys {
            p256dh: "p256".to_string(),
            auth: "auth".to_string(),
        },
    }
}

pub(crate) fn subscription(endpoint: &str) -> Subscription {
    Subscription::from_push(push_subscription(endpoint), fixed_now())
}

/// Clock frozen at [`fixed_now`]. Sleeps either never finish or finish
/// immediately, which lets tests pick which side of a deadline wins.
#[derive(Clone)]
pub(crate) struct TestTime {
    now: OffsetDateTime,
    sleeps_elapse: bool,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl TestTime {
    pub(crate) fn frozen() -> Self {
        Self {
            now: fixed_now(),
            sleeps_elapse: false,
            sleeps: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn expiring() -> Self {
        Self {
            sleeps_elapse: true,
            ..Self::frozen()
        }
    }

    pub(crate) fn at(now: OffsetDateTime) -> Self {
        Self {
            now,
            ..Self::frozen()
        }
    }

    pub(crate) fn sleep_durations(&self) -> Vec<Duration> {
        self.sleeps.lock().expect("sleeps lock").clone()
    }
}

impl ports::TimeProvider for TestTime {
    type Sleep<'a>
        = Pin<Box<dyn Future<Output = ()> + Send + 'a>>
    where
        Self: 'a;

    fn now(&self) -> OffsetDateTime {
        self.now
    }

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        self.sleeps.lock().expect("sleeps lock").push(duration);
        if self.sleeps_elapse {
            Box::pin(std::future::ready(()))
        } else {
            Box::pin(std::future::pending())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Failure {
    Gone,
    Unreachable,
    Hang,
}

/// Records every delivery attempt and fails the ones it was told to.
#[derive(Clone, Default)]
pub(crate) struct TestSender {
    attempts: Arc<Mutex<Vec<(String, String)>>>,
    failures: Arc<Mutex<HashMap<String, Failure>>>,
    fail_all: Option<Failure>,
}

impl TestSender {
    pub(crate) fn failing(failure: Failure) -> Self {
        Self {
            fail_all: Some(failure),
            ..Self::default()
        }
    }

    pub(crate) fn fail_for(&self, endpoint: &str, failure: Failure) {
        self.failures
            .lock()
            .expect("failures lock")
            .insert(endpoint.to_string(), failure);
    }

    pub(crate) fn attempts(&self) -> Vec<(String, String)> {
        self.attempts.lock().expect("attempts lock").clone()
    }

    pub(crate) fn attempted_endpoints(&self) -> Vec<String> {
        self.attempts()
            .into_iter()
            .map(|(endpoint, _)| endpoint)
            .collect()
    }
}

impl ports::PushSender for TestSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a str) -> Self::Fut<'a> {
        self.attempts
            .lock()
            .expect("attempts lock")
            .push((subscription.endpoint.clone(), payload.to_string()));
        let failure = self.fail_all.or_else(|| {
            self.failures
                .lock()
                .expect("failures lock")
                .get(&subscription.endpoint)
                .copied()
        });
        let endpoint = subscription.endpoint.clone();
        Box::pin(async move {
            match failure {
                None => Ok(()),
                Some(Failure::Gone) => Err(DeliveryError::Gone(endpoint)),
                Some(Failure::Unreachable) => {
                    Err(DeliveryError::Transport("connection refused".to_string()))
                }
                Some(Failure::Hang) => std::future::pending().await,
            }
        })
    }
}
