pub(crate) mod outbox_consumer;
pub(crate) mod outbox_model;
pub(crate) mod outbox_repository;
pub(crate) mod outbox_traits;

pub use outbox_consumer::{OutboxConsumer, MAX_DELIVERY_ATTEMPTS};
pub use outbox_model::{EventStatus, EventType, NewOutboxEvent, OutboxEvent};
pub use outbox_repository::OutboxRepository;
pub use outbox_traits::OutboxRepositoryTrait;
