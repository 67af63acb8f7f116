//! Arrival tickets that keep audit appends in the order requests came in.
//!
//! A request takes an [`ArrivalTicket`] the moment it reaches the mediator.
//! Once its decision is ready it waits for its [`Turn`], which is granted
//! only after every earlier ticket has either finished its turn or been
//! dropped. Requests still run concurrently; only the append is ordered.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

#[derive(Debug, Default)]
struct Turns {
    issued: u64,
    serving: u64,
    abandoned: BTreeSet<u64>,
}

impl Turns {
    fn advance(&mut self) {
        self.serving += 1;
        while self.abandoned.remove(&self.serving) {
            self.serving += 1;
        }
    }
}

/// Issues arrival tickets and grants turns oldest first.
#[derive(Debug)]
pub struct ArrivalSequencer {
    turns: watch::Sender<Turns>,
}

impl Default for ArrivalSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrivalSequencer {
    /// Creates a sequencer whose first ticket is number zero.
    #[must_use]
    pub fn new() -> Self {
        let (turns, _) = watch::channel(Turns::default());
        Self { turns }
    }

    /// Takes the next ticket, stamped with the arrival time.
    #[must_use]
    pub fn ticket(&self) -> ArrivalTicket<'_> {
        let mut issued = (0, Utc::now());
        // Stamped under the channel lock so timestamps follow ticket order.
        self.turns.send_if_modified(|turns| {
            issued = (turns.issued, Utc::now());
            turns.issued += 1;
            false
        });

        ArrivalTicket {
            sequencer: self,
            number: issued.0,
            arrived_at: issued.1,
            claimed: false,
        }
    }

    fn abandon(&self, number: u64) {
        self.turns.send_if_modified(|turns| {
            if turns.serving == number {
                turns.advance();
                true
            } else {
                turns.abandoned.insert(number);
                false
            }
        });
    }
}

/// Place in the arrival order. Dropping it unused gives up the place.
#[derive(Debug)]
pub struct ArrivalTicket<'a> {
    sequencer: &'a ArrivalSequencer,
    number: u64,
    arrived_at: DateTime<Utc>,
    claimed: bool,
}

impl<'a> ArrivalTicket<'a> {
    /// Position in the arrival order, starting at zero.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// When the ticket was taken.
    #[must_use]
    pub fn arrived_at(&self) -> DateTime<Utc> {
        self.arrived_at
    }

    /// Waits until every earlier ticket is done.
    ///
    /// Cancelling the wait abandons the ticket, so later holders are not
    /// blocked by it.
    pub async fn turn(mut self) -> Turn<'a> {
        let mut rx = self.sequencer.turns.subscribe();
        // The sender outlives this borrow, so the channel never closes here.
        let _ = rx.wait_for(|turns| turns.serving == self.number).await;
        self.claimed = true;
        Turn {
            sequencer: self.sequencer,
        }
    }
}

impl Drop for ArrivalTicket<'_> {
    fn drop(&mut self) {
        if !self.claimed {
            self.sequencer.abandon(self.number);
        }
    }
}

/// Exclusive right to append. The next ticket is served when this drops.
#[derive(Debug)]
#[must_use = "the next ticket is served as soon as the turn is dropped"]
pub struct Turn<'a> {
    sequencer: &'a ArrivalSequencer,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        self.sequencer.turns.send_modify(Turns::advance);
    }
}
