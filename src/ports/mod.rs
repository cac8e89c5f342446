//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ObjectGateway`: Ledger object reads and transaction submission
//! - `TransactionSigner`: Key custody and signing
//! - `SubmissionJournal`: Append-only record of submission attempts

pub mod journal;
pub mod object_gateway;
pub mod signer;
