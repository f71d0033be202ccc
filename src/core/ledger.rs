//! Capacity ledger: slot accounting on an opportunity row.
//!
//! These functions only ever run on a row staged inside
//! [`ApplicationStore::transact`](super::store::ApplicationStore::transact), which
//! serializes callers per opportunity. That makes every reservation linearizable
//! and keeps `current_participants <= max_participants` at every commit.

use super::error::MatchError;
use super::model::{Opportunity, OpportunityStatus};

/// Result of a reservation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reservation {
    /// One slot was taken.
    Reserved,
    /// No slot was available; the row is unchanged.
    Full,
}

/// Take one slot if any is open. Flips `active` to `full` on the last slot.
pub fn try_reserve_slot(opportunity: &mut Opportunity) -> Reservation {
    if opportunity.current_participants >= opportunity.max_participants {
        return Reservation::Full;
    }
    opportunity.current_participants += 1;
    sync_status(opportunity);
    Reservation::Reserved
}

/// Return one slot. Flips `full` back to `active`.
///
/// # Errors
///
/// Returns `Internal` if no slot is held; that means an approval was lost
/// somewhere and is logged as an invariant violation.
pub fn release_slot(opportunity: &mut Opportunity) -> Result<(), MatchError> {
    if opportunity.current_participants == 0 {
        tracing::error!(
            opportunity_id = %opportunity.id,
            "release_slot on opportunity with no participants"
        );
        return Err(MatchError::Internal(format!(
            "capacity underflow on opportunity {}",
            opportunity.id
        )));
    }
    opportunity.current_participants -= 1;
    sync_status(opportunity);
    Ok(())
}

/// Change `max_participants`.
///
/// # Errors
///
/// Returns `InvalidCapacity` when `new_max` is zero or below the approved count.
pub fn resize(opportunity: &mut Opportunity, new_max: u32) -> Result<(), MatchError> {
    if new_max == 0 || new_max < opportunity.current_participants {
        return Err(MatchError::InvalidCapacity {
            requested: new_max,
            current: opportunity.current_participants,
        });
    }
    opportunity.max_participants = new_max;
    sync_status(opportunity);
    Ok(())
}

// Closed is terminal and never recomputed.
fn sync_status(opportunity: &mut Opportunity) {
    if opportunity.status == OpportunityStatus::Closed {
        return;
    }
    opportunity.status = if opportunity.current_participants == opportunity.max_participants {
        OpportunityStatus::Full
    } else {
        OpportunityStatus::Active
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::ids::{OpportunityId, OrganizationId};

    fn opportunity(max: u32) -> Opportunity {
        Opportunity {
            id: OpportunityId::new(),
            organization_id: OrganizationId::new(),
            title: "Beach cleanup".into(),
            description: String::new(),
            location: "Porto".into(),
            category: "environment".into(),
            max_participants: max,
            current_participants: 0,
            status: OpportunityStatus::Active,
            created_at_ms: 0,
        }
    }

    #[test]
    fn reserve_until_full() {
        let mut opp = opportunity(2);
        assert_eq!(try_reserve_slot(&mut opp), Reservation::Reserved);
        assert_eq!(opp.status, OpportunityStatus::Active);
        assert_eq!(try_reserve_slot(&mut opp), Reservation::Reserved);
        assert_eq!(opp.status, OpportunityStatus::Full);
        assert_eq!(try_reserve_slot(&mut opp), Reservation::Full);
        assert_eq!(opp.current_participants, 2);
    }

    #[test]
    fn release_reopens_full_opportunity() {
        let mut opp = opportunity(1);
        try_reserve_slot(&mut opp);
        release_slot(&mut opp).unwrap();
        assert_eq!(opp.current_participants, 0);
        assert_eq!(opp.status, OpportunityStatus::Active);
    }

    #[test]
    fn release_on_empty_is_internal_error() {
        let mut opp = opportunity(1);
        assert!(matches!(release_slot(&mut opp), Err(MatchError::Internal(_))));
        assert_eq!(opp.current_participants, 0);
    }

    #[test]
    fn closed_stays_closed() {
        let mut opp = opportunity(1);
        try_reserve_slot(&mut opp);
        opp.status = OpportunityStatus::Closed;
        release_slot(&mut opp).unwrap();
        assert_eq!(opp.status, OpportunityStatus::Closed);
    }

    #[test]
    fn resize_rejects_below_current() {
        let mut opp = opportunity(3);
        try_reserve_slot(&mut opp);
        try_reserve_slot(&mut opp);
        assert_eq!(
            resize(&mut opp, 1),
            Err(MatchError::InvalidCapacity { requested: 1, current: 2 })
        );
        assert_eq!(resize(&mut opp, 0).unwrap_err().kind(), "invalid_capacity");
        resize(&mut opp, 2).unwrap();
        assert_eq!(opp.status, OpportunityStatus::Full);
        resize(&mut opp, 5).unwrap();
        assert_eq!(opp.status, OpportunityStatus::Active);
    }
}
