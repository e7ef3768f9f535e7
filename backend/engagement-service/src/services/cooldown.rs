use std::time::Duration;
use tokio::time::Instant;

/// Gate shared by like and share on one post instance.
///
/// Closed while a call is in flight and for `cooldown` after it settles.
#[derive(Debug)]
pub struct CooldownGate {
    cooldown: Duration,
    in_flight: bool,
    cooling_until: Option<Instant>,
}

impl CooldownGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            in_flight: false,
            cooling_until: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.in_flight
            || self
                .cooling_until
                .map(|until| Instant::now() < until)
                .unwrap_or(false)
    }

    /// Claim the gate. Returns false, and changes nothing, when it is closed.
    pub fn try_begin(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.in_flight = true;
        self.cooling_until = None;
        true
    }

    /// Release the in-flight claim and start the cooldown window
    pub fn settle(&mut self) {
        self.in_flight = false;
        self.cooling_until = Some(Instant::now() + self.cooldown);
    }
}
