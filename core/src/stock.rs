//! The stock ledger value type.
//!
//! A [`StockLedger`] is the counter pair `(available, reserved)` for one
//! product. It is an immutable value: every transition consumes the current
//! value and returns a new one, or fails without touching the original, so
//! a caller can always retry after correcting the error condition. No
//! transition retries internally.
//!
//! `total = available + reserved` is conserved by reserve / confirm /
//! cancel; only [`StockLedger::add`] and [`StockLedger::adjust_available`]
//! change it.

use crate::error::StockError;
use serde::{Deserialize, Serialize};

/// Upper bound for a single restock batch.
pub const MAX_BATCH_QUANTITY: i32 = 100_000;

/// Counter pair for one product: units on the shelf and units held for
/// pending orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLedger {
    available: i32,
    reserved: i32,
}

impl StockLedger {
    /// Creates a ledger with the given available count and nothing reserved.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NegativeStock`] if `available` is negative.
    pub const fn new(available: i32) -> Result<Self, StockError> {
        if available < 0 {
            return Err(StockError::NegativeStock);
        }
        Ok(Self {
            available,
            reserved: 0,
        })
    }

    /// Rebuilds a ledger from persisted counters.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NegativeStock`] if either counter is negative.
    pub const fn from_counts(available: i32, reserved: i32) -> Result<Self, StockError> {
        if available < 0 || reserved < 0 {
            return Err(StockError::NegativeStock);
        }
        Ok(Self {
            available,
            reserved,
        })
    }

    /// Units available for reservation.
    #[must_use]
    pub const fn available(&self) -> i32 {
        self.available
    }

    /// Units held for pending orders.
    #[must_use]
    pub const fn reserved(&self) -> i32 {
        self.reserved
    }

    /// Total units the ledger accounts for.
    #[must_use]
    pub const fn total(&self) -> i32 {
        self.available + self.reserved
    }

    /// Adds restocked units to the available pool.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NegativeQuantity`] for a negative quantity and
    /// [`StockError::Overflow`] when the batch limit or the counter range
    /// would be exceeded.
    pub const fn add(self, quantity: i32) -> Result<Self, StockError> {
        if quantity < 0 {
            return Err(StockError::NegativeQuantity);
        }
        if quantity > MAX_BATCH_QUANTITY || self.available > i32::MAX - quantity {
            return Err(StockError::Overflow);
        }
        Ok(Self {
            available: self.available + quantity,
            reserved: self.reserved,
        })
    }

    /// Moves units from available to reserved.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::NonPositiveQuantity`] for a zero or negative
    /// quantity and [`StockError::InsufficientStock`] when fewer units are
    /// available than requested.
    pub const fn reserve(self, quantity: i32) -> Result<Self, StockError> {
        if quantity <= 0 {
            return Err(StockError::NonPositiveQuantity);
        }
        if self.available < quantity {
            return Err(StockError::InsufficientStock {
                requested: quantity,
                available: self.available,
            });
        }
        Ok(Self {
            available: self.available - quantity,
            reserved: self.reserved + quantity,
        })
    }

    /// Settles a reservation: the goods have left inventory, so reserved
    /// shrinks and available is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::InsufficientReserved`] when fewer units are
    /// reserved than requested.
    pub const fn confirm_reservation(self, quantity: i32) -> Result<Self, StockError> {
        if self.reserved < quantity {
            return Err(StockError::InsufficientReserved {
                requested: quantity,
                reserved: self.reserved,
            });
        }
        Ok(Self {
            available: self.available,
            reserved: self.reserved - quantity,
        })
    }

    /// Returns reserved units to the available pool.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::InsufficientReserved`] when fewer units are
    /// reserved than requested.
    pub const fn cancel_reservation(self, quantity: i32) -> Result<Self, StockError> {
        if self.reserved < quantity {
            return Err(StockError::InsufficientReserved {
                requested: quantity,
                reserved: self.reserved,
            });
        }
        Ok(Self {
            available: self.available + quantity,
            reserved: self.reserved - quantity,
        })
    }

    /// Applies a correction to the available pool. The delta may be
    /// negative (shrinkage, damage) but may not take the counter below
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns [`StockError::InsufficientStock`] when the adjusted count
    /// would be negative and [`StockError::Overflow`] when it would exceed
    /// the counter range.
    pub const fn adjust_available(self, delta: i32) -> Result<Self, StockError> {
        let adjusted = match self.available.checked_add(delta) {
            Some(value) => value,
            None => return Err(StockError::Overflow),
        };
        if adjusted < 0 {
            return Err(StockError::InsufficientStock {
                requested: delta.saturating_neg(),
                available: self.available,
            });
        }
        Ok(Self {
            available: adjusted,
            reserved: self.reserved,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn new_rejects_negative_stock() {
        assert_eq!(StockLedger::new(-1), Err(StockError::NegativeStock));
    }

    #[test]
    fn reserve_moves_units_between_pools() {
        let ledger = StockLedger::new(10).unwrap();
        let reserved = ledger.reserve(4).unwrap();
        assert_eq!(reserved.available(), 6);
        assert_eq!(reserved.reserved(), 4);
        assert_eq!(reserved.total(), ledger.total());
    }

    #[test]
    fn reserve_fails_without_mutating() {
        let ledger = StockLedger::new(3).unwrap();
        let result = ledger.reserve(5);
        assert_eq!(
            result,
            Err(StockError::InsufficientStock {
                requested: 5,
                available: 3
            })
        );
        // The original value is untouched.
        assert_eq!(ledger.available(), 3);
        assert_eq!(ledger.reserved(), 0);
    }

    #[test]
    fn reserve_rejects_non_positive_quantity() {
        let ledger = StockLedger::new(3).unwrap();
        assert_eq!(ledger.reserve(0), Err(StockError::NonPositiveQuantity));
        assert_eq!(ledger.reserve(-2), Err(StockError::NonPositiveQuantity));
    }

    #[test]
    fn confirm_leaves_available_untouched() {
        let ledger = StockLedger::new(10).unwrap().reserve(4).unwrap();
        let confirmed = ledger.confirm_reservation(4).unwrap();
        assert_eq!(confirmed.available(), 6);
        assert_eq!(confirmed.reserved(), 0);
        // Net effect of reserve + confirm: total shrinks by the quantity.
        assert_eq!(confirmed.total(), 6);
    }

    #[test]
    fn cancel_round_trips_to_the_pre_reserve_state() {
        let initial = StockLedger::new(10).unwrap();
        let restored = initial.reserve(7).unwrap().cancel_reservation(7).unwrap();
        assert_eq!(restored, initial);
    }

    #[test]
    fn confirm_and_cancel_require_enough_reserved() {
        let ledger = StockLedger::new(10).unwrap().reserve(2).unwrap();
        assert_eq!(
            ledger.confirm_reservation(3),
            Err(StockError::InsufficientReserved {
                requested: 3,
                reserved: 2
            })
        );
        assert_eq!(
            ledger.cancel_reservation(3),
            Err(StockError::InsufficientReserved {
                requested: 3,
                reserved: 2
            })
        );
    }

    #[test]
    fn add_enforces_batch_limit_and_overflow() {
        let ledger = StockLedger::new(10).unwrap();
        assert_eq!(ledger.add(-1), Err(StockError::NegativeQuantity));
        assert_eq!(
            ledger.add(MAX_BATCH_QUANTITY + 1),
            Err(StockError::Overflow)
        );
        let near_max = StockLedger::from_counts(i32::MAX - 5, 0).unwrap();
        assert_eq!(near_max.add(10), Err(StockError::Overflow));
        assert_eq!(ledger.add(90).unwrap().available(), 100);
    }

    #[test]
    fn adjust_available_allows_shrinkage_down_to_zero() {
        let ledger = StockLedger::new(10).unwrap();
        assert_eq!(ledger.adjust_available(-10).unwrap().available(), 0);
        assert_eq!(
            ledger.adjust_available(-11),
            Err(StockError::InsufficientStock {
                requested: 11,
                available: 10
            })
        );
        assert_eq!(ledger.adjust_available(5).unwrap().available(), 15);
    }

    #[test]
    fn exhausting_stock_then_cancelling_restores_it() {
        let ledger = StockLedger::new(10).unwrap();
        let held = ledger.reserve(10).unwrap();
        assert_eq!(
            held.reserve(1),
            Err(StockError::InsufficientStock {
                requested: 1,
                available: 0
            })
        );
        let released = held.cancel_reservation(10).unwrap();
        assert_eq!(released.available(), 10);
        assert_eq!(released.reserved(), 0);
    }

    /// One step of an arbitrary transition sequence.
    #[derive(Debug, Clone, Copy)]
    enum Transition {
        Reserve(i32),
        Confirm(i32),
        Cancel(i32),
    }

    fn transition_strategy() -> impl Strategy<Value = Transition> {
        prop_oneof![
            (0..20i32).prop_map(Transition::Reserve),
            (0..20i32).prop_map(Transition::Confirm),
            (0..20i32).prop_map(Transition::Cancel),
        ]
    }

    proptest! {
        /// From `Initial(n)`, any sequence of reserve/confirm/cancel keeps
        /// both counters non-negative and never grows the total past `n`.
        #[test]
        fn transition_sequences_preserve_the_invariant(
            initial in 0..1000i32,
            steps in proptest::collection::vec(transition_strategy(), 0..64),
        ) {
            let mut ledger = StockLedger::new(initial).unwrap();
            for step in steps {
                let next = match step {
                    Transition::Reserve(q) => ledger.reserve(q),
                    Transition::Confirm(q) => ledger.confirm_reservation(q),
                    Transition::Cancel(q) => ledger.cancel_reservation(q),
                };
                // A failed transition must leave the value unchanged.
                ledger = next.unwrap_or(ledger);
                prop_assert!(ledger.available() >= 0);
                prop_assert!(ledger.reserved() >= 0);
                prop_assert!(ledger.total() <= initial);
            }
        }

        /// Reserve then cancel with the same quantity is the identity.
        #[test]
        fn reserve_cancel_round_trip(initial in 0..1000i32, quantity in 1..1000i32) {
            let ledger = StockLedger::new(initial).unwrap();
            if let Ok(held) = ledger.reserve(quantity) {
                prop_assert_eq!(held.cancel_reservation(quantity).unwrap(), ledger);
            } else {
                prop_assert!(quantity > initial);
            }
        }

        /// Reserve then confirm leaves `available` where reserve put it and
        /// shrinks the total by the confirmed quantity.
        #[test]
        fn reserve_confirm_shrinks_total(initial in 0..1000i32, quantity in 1..1000i32) {
            let ledger = StockLedger::new(initial).unwrap();
            if let Ok(held) = ledger.reserve(quantity) {
                let confirmed = held.confirm_reservation(quantity).unwrap();
                prop_assert_eq!(confirmed.available(), held.available());
                prop_assert_eq!(confirmed.reserved(), ledger.reserved());
                prop_assert_eq!(confirmed.total(), ledger.total() - quantity);
            }
        }
    }
}
