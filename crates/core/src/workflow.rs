//! Reservation draft and the booking workflow state machine.
//!
//! A [`ReservationDraft`] is a plain value: callers hold it between requests
//! (the web layer keeps it in a signed token) and pass it back in. Every step
//! returns the next draft; nothing here touches shared state.
//!
//! ```text
//! NoDraft -> RoomChosen -> DatesChosen -> ContactPending -> Persisted -> NoDraft
//! ```

use serde::{Deserialize, Serialize};

use crate::dates::DateRange;
use crate::error::CoreError;
use crate::forms::ReservationForm;
use crate::types::DbId;

/// Where a draft stands in the booking workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NoDraft,
    /// A room is picked, dates are not.
    RoomChosen,
    /// Dates are picked, the room is not (or no longer) set.
    DatesChosen,
    /// Room and dates are set; waiting on the contact form.
    ContactPending,
    /// The reservation row exists; only the summary view remains.
    Persisted,
}

/// The in-progress reservation carried across page views.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    /// Assigned once the reservation is persisted.
    pub id: Option<DbId>,
    pub room_id: Option<DbId>,
    pub room_name: Option<String>,
    pub dates: Option<DateRange>,
    #[serde(default)]
    pub contact: ReservationForm,
}

impl ReservationDraft {
    pub fn stage(&self) -> Stage {
        match (self.id, self.room_id, self.dates) {
            (Some(_), _, _) => Stage::Persisted,
            (None, Some(_), Some(_)) => Stage::ContactPending,
            (None, None, Some(_)) => Stage::DatesChosen,
            (None, Some(_), None) => Stage::RoomChosen,
            (None, None, None) => Stage::NoDraft,
        }
    }

    /// Start a draft for `room_id`, carrying dates over from `previous`.
    ///
    /// A persisted previous draft contributes nothing: its booking is done.
    pub fn choose_room(
        previous: Option<ReservationDraft>,
        room_id: DbId,
        room_name: impl Into<String>,
    ) -> ReservationDraft {
        let dates = previous
            .filter(|d| d.stage() != Stage::Persisted)
            .and_then(|d| d.dates);
        ReservationDraft {
            room_id: Some(room_id),
            room_name: Some(room_name.into()),
            dates,
            ..ReservationDraft::default()
        }
    }

    /// Set the dates of a draft, keeping the room when `keep_room` holds it.
    ///
    /// `keep_room` is asked about the previous room so the caller can drop a
    /// room that is not free on the new dates.
    pub fn choose_dates(
        previous: Option<ReservationDraft>,
        dates: DateRange,
        keep_room: impl FnOnce(DbId) -> bool,
    ) -> ReservationDraft {
        let mut draft = previous
            .filter(|d| d.stage() != Stage::Persisted)
            .unwrap_or_default();
        draft.dates = Some(dates);
        if let Some(room_id) = draft.room_id {
            if !keep_room(room_id) {
                draft.room_id = None;
                draft.room_name = None;
            }
        }
        draft
    }

    /// Check that the contact form may be shown for this draft.
    pub fn ensure_contact_pending(&self) -> Result<(), CoreError> {
        match self.stage() {
            Stage::ContactPending => Ok(()),
            Stage::Persisted => Err(CoreError::Conflict(
                "this reservation has already been made".into(),
            )),
            Stage::RoomChosen => Err(CoreError::Validation(
                "please choose dates for your stay".into(),
            )),
            Stage::DatesChosen | Stage::NoDraft => Err(CoreError::Validation(
                "please choose a room for your stay".into(),
            )),
        }
    }

    /// Record the submitted contact fields on the draft.
    pub fn with_contact(mut self, contact: ReservationForm) -> ReservationDraft {
        self.contact = contact;
        self
    }

    /// The room and dates to book, once the draft is ready for persistence.
    ///
    /// Rejects empty ranges: a reservation covers at least one night.
    pub fn booking_target(&self) -> Result<(DbId, DateRange), CoreError> {
        self.ensure_contact_pending()?;
        let (Some(room_id), Some(dates)) = (self.room_id, self.dates) else {
            return Err(CoreError::Internal("draft lost its room or dates".into()));
        };
        if dates.is_empty() {
            return Err(CoreError::Validation(
                "a reservation must cover at least one night".into(),
            ));
        }
        Ok((room_id, dates))
    }

    /// Mark the draft as persisted under `id`.
    pub fn persisted(mut self, id: DbId) -> ReservationDraft {
        self.id = Some(id);
        self
    }
}
