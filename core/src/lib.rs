//! Synchronous client for the Lighthouse issue tracker's XML API.
//!
//! # Overview
//! Fetches projects and their tickets, milestones and messages, parses the
//! XML responses into a generic node tree, and decodes each field node
//! according to its declared `type` attribute into typed entities.
//!
//! # Design
//! - `field` is the decoding core: a closed `FieldType` enum maps type tags
//!   to conversions.
//! - `entity` holds the entity types; each stores its decoded values in an
//!   explicit `Fields` map with typed accessors for the common fields.
//! - `http` describes requests and responses as plain data behind a
//!   `Transport` trait, so the client can be tested without a network.
//! - `client::LighthouseClient` ties fetch, parse and build together.

pub mod client;
pub mod config;
pub mod entity;
pub mod error;
pub mod field;
pub mod http;
pub mod xml;

pub use client::LighthouseClient;
pub use config::Config;
pub use entity::{Entity, EntityKind, Fields, Message, Milestone, Project, Ticket};
pub use error::{ApiError, DecodeError};
pub use field::{Field, FieldType, FieldValue};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use xml::Node;
