//! A lock-free pointer exchanger
//!
//! A rendezvous slot on which two threads each post one pointer and walk
//! away with the other's. The slot is a single [`TaggedPtr`] whose tag is a
//! three-state machine:
//!
//! - `EMPTY`: nobody is here; the pointer half is irrelevant
//! - `WAITING`: one thread has posted its pointer and spins for a partner
//! - `BUSY`: a second thread has posted its own pointer over the first
//!   thread's; transient, cleared back to `EMPTY` by the first thread once
//!   it has taken its partner's pointer
//!
//! The exchanger is the back-off mechanism behind the stack's elimination
//! array, but it stands on its own: it never dereferences the pointers it
//! trades, so `exchange` is a safe operation.

use core::ptr;
use core::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

use crate::tagged::TaggedPtr;

const EMPTY: u16 = 0;
const WAITING: u16 = 1;
const BUSY: u16 = 2;

/// A rendezvous slot where two threads atomically swap one pointer each
pub struct Exchanger<T> {
    slot: TaggedPtr<T>,
}

impl<T> Exchanger<T> {
    /// Creates an exchanger with nobody waiting
    pub const fn new() -> Self {
        Exchanger {
            slot: TaggedPtr::null(),
        }
    }

    /// Offers `offer` to one other thread for up to `spins` iterations
    ///
    /// On success the returned pointer is the partner's offer, and the
    /// partner has received (or will receive) `offer`; exactly one partner
    /// is involved in each rendezvous. On timeout returns `None`: no other
    /// thread has observed `offer` and the slot is back to `EMPTY`.
    ///
    /// The spin budget is shared between finding a partner and waiting for
    /// one: the waiting phase only spends what the arrival phase left over.
    /// `exchange(_, 0)` fails without touching the slot.
    pub fn exchange(&self, offer: *mut T, spins: u32) -> Option<*mut T> {
        let mut budget = 0;
        while budget < spins {
            budget += 1;
            let (existing, state) = self.slot.load(Acquire);
            match state {
                EMPTY => {
                    if self
                        .slot
                        .compare_exchange((existing, EMPTY), (offer, WAITING), AcqRel, Relaxed)
                        .is_ok()
                    {
                        return self.wait_for_partner(offer, budget, spins);
                    }
                }
                WAITING => {
                    // One thread is in here and no third has turned the
                    // slot BUSY; try to be its partner.
                    if self
                        .slot
                        .compare_exchange((existing, WAITING), (offer, BUSY), AcqRel, Relaxed)
                        .is_ok()
                    {
                        return Some(existing);
                    }
                }
                BUSY => {
                    // Two other threads are mid-swap. The slot will turn
                    // EMPTY again shortly; re-observe.
                }
                _ => debug_assert!(false, "corrupt exchanger state"),
            }
        }
        None
    }

    // Holds the WAITING state until a partner posts BUSY or the remaining
    // budget runs out.
    fn wait_for_partner(&self, offer: *mut T, mut budget: u32, spins: u32) -> Option<*mut T> {
        loop {
            let (existing, state) = self.slot.load(Acquire);
            if state == BUSY {
                self.slot.store(ptr::null_mut(), EMPTY, Release);
                return Some(existing);
            }
            if budget >= spins {
                break;
            }
            budget += 1;
        }

        // Timed out; withdraw the offer.
        if self
            .slot
            .compare_exchange((offer, WAITING), (ptr::null_mut(), EMPTY), AcqRel, Relaxed)
            .is_ok()
        {
            None
        } else {
            // A partner posted BUSY between the last observation and the
            // withdrawal; complete the swap anyway.
            let (existing, _) = self.slot.load(Acquire);
            self.slot.store(ptr::null_mut(), EMPTY, Release);
            Some(existing)
        }
    }
}

unsafe impl<T> Send for Exchanger<T> where T: Send {}

#[cfg(tag_bits_free)]
unsafe impl<T> Sync for Exchanger<T> where T: Send {}
