//! Lighthouse API client.
//!
//! # Design
//! `LighthouseClient` owns its configuration, a [`Transport`], and the
//! collection of projects it last fetched. Every fetch is split the same
//! way: `build_request` turns a resource path into an `HttpRequest`, the
//! transport executes it, and `parse_response` turns the `HttpResponse` into
//! an XML node tree that the entity builder walks. Nothing is cached and
//! nothing is retried; the first error aborts the operation.

use std::fmt;

use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::entity::{self, Entity, Message, Milestone, Project, Ticket};
use crate::error::{ApiError, DecodeError};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::xml::{self, Node};

pub const PROJECTS_PATH: &str = "projects.xml";

pub fn tickets_path(project_id: i64) -> String {
    format!("projects/{project_id}/tickets.xml")
}

pub fn milestones_path(project_id: i64) -> String {
    format!("projects/{project_id}/milestones.xml")
}

pub fn messages_path(project_id: i64) -> String {
    format!("projects/{project_id}/messages.xml")
}

/// Synchronous client for the Lighthouse XML API.
pub struct LighthouseClient {
    config: Config,
    transport: Box<dyn Transport>,
    projects: Vec<Project>,
}

impl LighthouseClient {
    /// Create a client that talks to the network through [`UreqTransport`].
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    pub fn with_transport(config: Config, transport: impl Transport + 'static) -> Self {
        Self {
            config,
            transport: Box::new(transport),
            projects: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn base_url(&self) -> Option<&str> {
        self.config.base_url.as_deref()
    }

    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.config.base_url = Some(base_url.into());
    }

    pub fn token(&self) -> Option<&str> {
        self.config.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.config.token = Some(token.into());
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn projects_mut(&mut self) -> &mut Vec<Project> {
        &mut self.projects
    }

    /// Join `path` onto the configured base URL.
    pub fn build_request(&self, path: &str) -> Result<HttpRequest, ApiError> {
        let base = self.base_url().ok_or(ApiError::MissingBaseUrl)?;
        let url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));

        if let Err(source) = Url::parse(&url) {
            return Err(ApiError::InvalidUrl { url, source });
        }

        Ok(HttpRequest {
            url,
            headers: vec![("accept".to_string(), "application/xml".to_string())],
        })
    }

    /// Check the status and parse the body into a node tree.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Node, ApiError> {
        check_status(&response, 200)?;
        xml::parse(&response.body)
    }

    fn get(&self, path: &str) -> Result<Node, ApiError> {
        let request = self.build_request(path)?;
        debug!(url = %request.url, "GET");
        let response = self.transport.execute(&request)?;
        debug!(
            status = response.status,
            content_type = response.header("content-type").unwrap_or("-"),
            "response"
        );
        self.parse_response(response)
    }

    /// Fetch every project and replace the client's project collection.
    pub fn fetch_projects(&mut self) -> Result<(), ApiError> {
        let root = self.get(PROJECTS_PATH)?;
        let projects: Vec<Project> = build_all(&root)?;
        info!(count = projects.len(), "fetched projects");
        self.projects = projects;
        Ok(())
    }

    /// Fetch the tickets of `entity`, which must be a project, replacing
    /// whatever tickets it held before.
    pub fn fetch_tickets(&self, entity: &mut dyn Entity) -> Result<(), ApiError> {
        let (project, tickets) = self.fetch_children::<Ticket>(entity, tickets_path)?;
        project.tickets = tickets;
        Ok(())
    }

    pub fn fetch_milestones(&self, entity: &mut dyn Entity) -> Result<(), ApiError> {
        let (project, milestones) = self.fetch_children::<Milestone>(entity, milestones_path)?;
        project.milestones = milestones;
        Ok(())
    }

    pub fn fetch_messages(&self, entity: &mut dyn Entity) -> Result<(), ApiError> {
        let (project, messages) = self.fetch_children::<Message>(entity, messages_path)?;
        project.messages = messages;
        Ok(())
    }

    /// Fetch the collection at `path(id)` for the project behind `entity`.
    /// Returns the project so the caller can store the records on it.
    fn fetch_children<'e, E: Entity + Default>(
        &self,
        entity: &'e mut dyn Entity,
        path: fn(i64) -> String,
    ) -> Result<(&'e mut Project, Vec<E>), ApiError> {
        let project = require_project(entity)?;
        let id = project.id().ok_or(ApiError::MissingProjectId)?;
        let path = path(id);
        let children: Vec<E> = build_all(&self.get(&path)?)?;
        info!(project = id, count = children.len(), %path, "fetched");
        Ok((project, children))
    }

    /// Fetch all projects, then the tickets of each. Stops at the first
    /// failure; projects fetched up to that point stay in the client.
    pub fn initialize(&mut self) -> Result<(), ApiError> {
        self.fetch_projects()?;

        let mut projects = std::mem::take(&mut self.projects);
        let result = projects
            .iter_mut()
            .try_for_each(|project| self.fetch_tickets(project));
        self.projects = projects;
        result
    }
}

impl fmt::Debug for LighthouseClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LighthouseClient")
            .field("base_url", &self.config.base_url)
            .field("projects", &self.projects.len())
            .finish_non_exhaustive()
    }
}

fn require_project(entity: &mut dyn Entity) -> Result<&mut Project, ApiError> {
    let kind = entity.kind();
    entity.as_project_mut().ok_or(ApiError::NotAProject(kind))
}

/// Build one `E` per child of the collection root.
fn build_all<E: Entity + Default>(root: &Node) -> Result<Vec<E>, DecodeError> {
    root.children.iter().map(entity::build::<E>).collect()
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
