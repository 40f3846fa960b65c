use serde::{Deserialize, Serialize};
use uuid::Uuid;

use saleflow_core::{AggregateId, BranchId, UserId};

use crate::Event;

/// Envelope for an event, carrying who/where metadata and the stream position.
///
/// - `branch_id`/`user_id` identify where and by whom the fact was produced.
/// - `sequence_number` is the aggregate version after the event was recorded,
///   so it increases by one per event within a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    branch_id: BranchId,
    user_id: UserId,

    aggregate_id: AggregateId,
    aggregate_type: String,

    sequence_number: u64,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        branch_id: BranchId,
        user_id: UserId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            branch_id,
            user_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn branch_id(&self) -> BranchId {
        self.branch_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Type name of the wrapped payload.
    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}
