//! Simulated payment processing
//!
//! No gateway is contacted. The simulator walks a fixed sequence of stages,
//! pausing between each through a [`Scheduler`], and always ends confirmed.

use std::cell::RefCell;
use std::future::Future;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use crate::domain::aggregates::PaymentMethod;
use crate::domain::events::{DomainEvent, PaymentEvent};
use crate::domain::value_objects::Money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStage { #[default] Idle, Validating, GatewayConnect, Processing, Verifying, Confirmed }

impl PaymentStage {
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Validating),
            Self::Validating => Some(Self::GatewayConnect),
            Self::GatewayConnect => Some(Self::Processing),
            Self::Processing => Some(Self::Verifying),
            Self::Verifying => Some(Self::Confirmed),
            Self::Confirmed => None,
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            Self::Idle => 0, Self::Validating => 20, Self::GatewayConnect => 40,
            Self::Processing => 60, Self::Verifying => 80, Self::Confirmed => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Idle => "Waiting for payment",
            Self::Validating => "Validating payment details...",
            Self::GatewayConnect => "Connecting to payment gateway...",
            Self::Processing => "Processing payment...",
            Self::Verifying => "Verifying transaction...",
            Self::Confirmed => "Payment successful! Creating order...",
        }
    }
}

/// Pauses between stages.
pub trait Scheduler {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()>;
}

impl<S: Scheduler + ?Sized> Scheduler for &S {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> { (**self).sleep(duration) }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> { tokio::time::sleep(duration) }
}

/// Resolves every pause at once and keeps a log of what was asked for.
#[derive(Debug, Default)]
pub struct ImmediateScheduler { requested: RefCell<Vec<Duration>> }

impl ImmediateScheduler {
    pub fn new() -> Self { Self::default() }
    pub fn requested(&self) -> Vec<Duration> { self.requested.borrow().clone() }
}

impl Scheduler for ImmediateScheduler {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        self.requested.borrow_mut().push(duration);
        std::future::ready(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaymentTiming {
    /// Pause before each stage after the first.
    pub step: Duration,
    /// Pause after confirmation, before the order is written.
    pub settle: Duration,
}

impl Default for PaymentTiming {
    fn default() -> Self { Self { step: Duration::from_millis(1000), settle: Duration::from_millis(500) } }
}

#[derive(Debug)]
pub struct PaymentSimulator<S> {
    stage: PaymentStage,
    timing: PaymentTiming,
    scheduler: S,
    events: Vec<DomainEvent>,
}

impl<S: Scheduler> PaymentSimulator<S> {
    pub fn new(scheduler: S, timing: PaymentTiming) -> Self {
        Self { stage: PaymentStage::Idle, timing, scheduler, events: vec![] }
    }

    pub fn stage(&self) -> PaymentStage { self.stage }
    pub fn progress(&self) -> u8 { self.stage.progress() }
    pub fn is_confirmed(&self) -> bool { self.stage == PaymentStage::Confirmed }

    /// Steps to the next stage without waiting. `None` once confirmed.
    pub fn advance(&mut self) -> Option<PaymentStage> {
        let next = self.stage.next()?;
        self.stage = next;
        info!(stage = ?next, progress = next.progress(), "payment stage");
        self.events.push(DomainEvent::Payment(PaymentEvent::StageEntered { stage: next, progress: next.progress() }));
        Some(next)
    }

    /// Runs from the current stage to confirmation, then waits out the settle delay.
    pub async fn run(&mut self) -> PaymentStage {
        if self.stage == PaymentStage::Idle { self.advance(); }
        while !self.is_confirmed() {
            self.scheduler.sleep(self.timing.step).await;
            self.advance();
        }
        self.scheduler.sleep(self.timing.settle).await;
        self.stage
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
}

impl PaymentReceipt {
    pub fn issue(method: PaymentMethod, amount: Money, paid_at: DateTime<Utc>) -> Self {
        Self { transaction_id: transaction_id_at(paid_at), method, amount, paid_at }
    }
}

/// `TXN` followed by the last eight digits of the epoch milliseconds.
fn transaction_id_at(at: DateTime<Utc>) -> String {
    format!("TXN{:08}", at.timestamp_millis().rem_euclid(100_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_run_walks_every_stage() {
        let scheduler = ImmediateScheduler::new();
        let mut sim = PaymentSimulator::new(&scheduler, PaymentTiming::default());
        assert_eq!(sim.progress(), 0);
        assert_eq!(sim.run().await, PaymentStage::Confirmed);
        assert_eq!(sim.progress(), 100);

        let progress: Vec<u8> = sim.take_events().into_iter().map(|e| match e {
            DomainEvent::Payment(PaymentEvent::StageEntered { progress, .. }) => progress,
            other => panic!("unexpected event {other:?}"),
        }).collect();
        assert_eq!(progress, vec![20, 40, 60, 80, 100]);

        let mut expected = vec![Duration::from_millis(1000); 4];
        expected.push(Duration::from_millis(500));
        assert_eq!(scheduler.requested(), expected);
    }

    #[test]
    fn test_advance_stops_at_confirmed() {
        let mut sim = PaymentSimulator::new(ImmediateScheduler::new(), PaymentTiming::default());
        let mut seen = vec![];
        while let Some(stage) = sim.advance() { seen.push(stage); }
        assert_eq!(seen.len(), 5);
        assert_eq!(seen.last(), Some(&PaymentStage::Confirmed));
        assert!(sim.advance().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_scheduler_waits() {
        let timing = PaymentTiming { step: Duration::from_secs(1), settle: Duration::from_millis(500) };
        let started = tokio::time::Instant::now();
        let mut sim = PaymentSimulator::new(TokioScheduler, timing);
        sim.run().await;
        assert!(started.elapsed() >= Duration::from_millis(4500));
    }

    #[test]
    fn test_transaction_id_format() {
        let at = Utc.timestamp_millis_opt(1_709_287_200_123).unwrap();
        let receipt = PaymentReceipt::issue(PaymentMethod::Upi, Money::units(1062, "INR"), at);
        assert_eq!(receipt.transaction_id, "TXN87200123");
    }
}
