//! Lighthouse entities and the builder that fills them from field nodes.
//!
//! # Design
//! The service defines no fixed schema: whatever field elements an entity
//! node carries become that entity's attributes. Each entity therefore keeps
//! its decoded values in a [`Fields`] map keyed by the field name with `-`
//! replaced by `_`, and exposes typed accessors only for the fields every
//! Lighthouse response is known to carry. Anything else is reachable
//! through [`Fields::get`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::error::DecodeError;
use crate::field::{Field, FieldValue};
use crate::xml::Node;

/// Decoded field values of one entity, keyed by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    /// Store a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.0.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_i64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(FieldValue::as_bool)
    }

    pub fn get_datetime(&self, key: &str) -> Option<&DateTime<FixedOffset>> {
        self.get(key).and_then(FieldValue::as_datetime)
    }
}

/// Decode every child of `node` as a field and collect the results.
pub fn decode_fields(node: &Node) -> Result<Fields, DecodeError> {
    let mut fields = Fields::new();
    assign(&mut fields, node)?;
    Ok(fields)
}

fn assign(fields: &mut Fields, node: &Node) -> Result<(), DecodeError> {
    for child in &node.children {
        let field = Field::from_node(child)?;
        fields.insert(field.key(), field.value);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Project,
    Ticket,
    Milestone,
    Message,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Project => "project",
            EntityKind::Ticket => "ticket",
            EntityKind::Milestone => "milestone",
            EntityKind::Message => "message",
        };
        f.write_str(s)
    }
}

/// Anything populated from a Lighthouse entity node.
pub trait Entity {
    fn kind(&self) -> EntityKind;

    fn fields(&self) -> &Fields;

    fn fields_mut(&mut self) -> &mut Fields;

    fn as_project_mut(&mut self) -> Option<&mut Project> {
        None
    }

    /// Fallback lookup for fields without a typed accessor.
    fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields().get(key)
    }

    fn created_at(&self) -> Option<&DateTime<FixedOffset>> {
        self.fields().get_datetime("created_at")
    }

    fn updated_at(&self) -> Option<&DateTime<FixedOffset>> {
        self.fields().get_datetime("updated_at")
    }
}

/// Create an empty `E` and assign every field of `node` onto it.
pub fn build<E: Entity + Default>(node: &Node) -> Result<E, DecodeError> {
    let mut entity = E::default();
    populate(&mut entity, node)?;
    Ok(entity)
}

/// Assign every field of `node` onto an existing entity.
pub fn populate<E: Entity + ?Sized>(entity: &mut E, node: &Node) -> Result<(), DecodeError> {
    assign(entity.fields_mut(), node)
}

/// Projects contain tickets, milestones and messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Project {
    pub fields: Fields,
    pub tickets: Vec<Ticket>,
    pub milestones: Vec<Milestone>,
    pub messages: Vec<Message>,
}

impl Project {
    pub fn id(&self) -> Option<i64> {
        self.fields.get_i64("id")
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get_str("name")
    }

    pub fn permalink(&self) -> Option<&str> {
        self.fields.get_str("permalink")
    }

    pub fn is_archived(&self) -> Option<bool> {
        self.fields.get_bool("archived")
    }

    pub fn open_tickets_count(&self) -> Option<i64> {
        self.fields.get_i64("open_tickets_count")
    }
}

impl Entity for Project {
    fn kind(&self) -> EntityKind {
        EntityKind::Project
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    fn as_project_mut(&mut self) -> Option<&mut Project> {
        Some(self)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Project: {}", self.name().unwrap_or("Unnamed"))
    }
}

/// Tickets are individual issues or bugs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ticket {
    pub fields: Fields,
}

impl Ticket {
    pub fn number(&self) -> Option<i64> {
        self.fields.get_i64("number")
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get_str("title")
    }

    pub fn state(&self) -> Option<&str> {
        self.fields.get_str("state")
    }

    pub fn is_closed(&self) -> Option<bool> {
        self.fields.get_bool("closed")
    }

    pub fn project_id(&self) -> Option<i64> {
        self.fields.get_i64("project_id")
    }

    pub fn assigned_user_id(&self) -> Option<i64> {
        self.fields.get_i64("assigned_user_id")
    }
}

impl Entity for Ticket {
    fn kind(&self) -> EntityKind {
        EntityKind::Ticket
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket: {}", self.title().unwrap_or("Unnamed"))
    }
}

/// Milestones group tickets under a due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Milestone {
    pub fields: Fields,
}

impl Milestone {
    pub fn id(&self) -> Option<i64> {
        self.fields.get_i64("id")
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get_str("title")
    }

    pub fn due_on(&self) -> Option<&DateTime<FixedOffset>> {
        self.fields.get_datetime("due_on")
    }
}

impl Entity for Milestone {
    fn kind(&self) -> EntityKind {
        EntityKind::Milestone
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }
}

impl fmt::Display for Milestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Milestone: {}", self.title().unwrap_or("Unnamed"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Message {
    pub fields: Fields,
}

impl Message {
    pub fn id(&self) -> Option<i64> {
        self.fields.get_i64("id")
    }

    pub fn title(&self) -> Option<&str> {
        self.fields.get_str("title")
    }

    pub fn body(&self) -> Option<&str> {
        self.fields.get_str("body")
    }
}

impl Entity for Message {
    fn kind(&self) -> EntityKind {
        EntityKind::Message
    }

    fn fields(&self) -> &Fields {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message: {}", self.title().unwrap_or("Unnamed"))
    }
}
