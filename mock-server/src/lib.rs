use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug)]
pub struct MockTicket {
    pub number: i64,
    pub title: String,
    pub state: String,
    pub closed: bool,
    pub created_at: String,
}

#[derive(Clone, Debug)]
pub struct MockMilestone {
    pub id: i64,
    pub title: String,
    pub due_on: Option<String>,
}

#[derive(Clone, Debug)]
pub struct MockMessage {
    pub id: i64,
    pub title: String,
    pub body: String,
}

#[derive(Clone, Debug)]
pub struct MockProject {
    pub id: i64,
    pub name: String,
    pub permalink: String,
    pub created_at: String,
    pub tickets: Vec<MockTicket>,
    pub milestones: Vec<MockMilestone>,
    pub messages: Vec<MockMessage>,
}

pub type Db = Arc<RwLock<BTreeMap<i64, MockProject>>>;

/// The single project every fresh server starts with.
pub fn seed() -> BTreeMap<i64, MockProject> {
    let project = MockProject {
        id: 2245,
        name: "Ars Technica 5.0".to_string(),
        permalink: "ars-technica-50".to_string(),
        created_at: "2008-09-25T20:04:13+01:00".to_string(),
        tickets: vec![
            MockTicket {
                number: 1,
                title: "Comments disappear after preview".to_string(),
                state: "new".to_string(),
                closed: false,
                created_at: "2009-01-26T16:47:00-08:00".to_string(),
            },
            MockTicket {
                number: 2,
                title: "Broken RSS feed".to_string(),
                state: "resolved".to_string(),
                closed: true,
                created_at: "2009-01-31T15:42:18-08:00".to_string(),
            },
        ],
        milestones: vec![MockMilestone {
            id: 31,
            title: "Launch".to_string(),
            due_on: Some("2009-03-01T00:00:00-08:00".to_string()),
        }],
        messages: vec![MockMessage {
            id: 5,
            title: "Kickoff".to_string(),
            body: "Welcome aboard & thanks".to_string(),
        }],
    };
    BTreeMap::from([(project.id, project)])
}

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(seed())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/projects.xml", get(list_projects))
        .route("/projects/{id}/tickets.xml", get(list_tickets))
        .route("/projects/{id}/milestones.xml", get(list_milestones))
        .route("/projects/{id}/messages.xml", get(list_messages))
        .route("/broken/projects.xml", get(broken_projects))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = %listener.local_addr()?, "serving lighthouse fixtures");
    axum::serve(listener, app()).await
}

async fn list_projects(State(db): State<Db>) -> impl IntoResponse {
    let projects = db.read().await;
    xml_response(collection("projects", projects.values().map(render_project)))
}

async fn list_tickets(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let projects = db.read().await;
    let project = projects.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let tickets = project.tickets.iter().map(|t| render_ticket(project.id, t));
    Ok(xml_response(collection("tickets", tickets)))
}

async fn list_milestones(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let projects = db.read().await;
    let project = projects.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(xml_response(collection("milestones", project.milestones.iter().map(render_milestone))))
}

async fn list_messages(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, StatusCode> {
    let projects = db.read().await;
    let project = projects.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(xml_response(collection("messages", project.messages.iter().map(render_message))))
}

/// Well-formedness error on purpose: `<project>` is never closed.
async fn broken_projects() -> impl IntoResponse {
    xml_response("<projects type=\"array\">\n  <project>\n</projects>\n".to_string())
}

fn xml_response(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], body)
}

fn collection(tag: &str, items: impl Iterator<Item = String>) -> String {
    let body: String = items.collect();
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<{tag} type=\"array\">\n{body}</{tag}>\n")
}

fn render_project(p: &MockProject) -> String {
    let open = p.tickets.iter().filter(|t| !t.closed).count();
    format!(
        "  <project>\n\
         \x20   <archived type=\"boolean\">false</archived>\n\
         \x20   <created-at type=\"datetime\">{}</created-at>\n\
         \x20   <default-assigned-user-id type=\"integer\" nil=\"true\"></default-assigned-user-id>\n\
         \x20   <id type=\"integer\">{}</id>\n\
         \x20   <name>{}</name>\n\
         \x20   <open-tickets-count type=\"integer\">{}</open-tickets-count>\n\
         \x20   <permalink>{}</permalink>\n\
         \x20 </project>\n",
        p.created_at,
        p.id,
        escape(&p.name),
        open,
        escape(&p.permalink),
    )
}

fn render_ticket(project_id: i64, t: &MockTicket) -> String {
    format!(
        "  <ticket>\n\
         \x20   <closed type=\"boolean\">{}</closed>\n\
         \x20   <created-at type=\"datetime\">{}</created-at>\n\
         \x20   <milestone-id type=\"integer\" nil=\"true\"></milestone-id>\n\
         \x20   <number type=\"integer\">{}</number>\n\
         \x20   <project-id type=\"integer\">{}</project-id>\n\
         \x20   <state>{}</state>\n\
         \x20   <title>{}</title>\n\
         \x20   <versions type=\"array\">\n\
         \x20     <version>\n\
         \x20       <state>{}</state>\n\
         \x20       <version type=\"integer\">1</version>\n\
         \x20     </version>\n\
         \x20   </versions>\n\
         \x20 </ticket>\n",
        t.closed,
        t.created_at,
        t.number,
        project_id,
        escape(&t.state),
        escape(&t.title),
        escape(&t.state),
    )
}

fn render_milestone(m: &MockMilestone) -> String {
    let due_on = match &m.due_on {
        Some(due) => format!("<due-on type=\"datetime\">{due}</due-on>"),
        None => "<due-on type=\"datetime\" nil=\"true\"></due-on>".to_string(),
    };
    format!(
        "  <milestone>\n    {due_on}\n    <id type=\"integer\">{}</id>\n    <title>{}</title>\n  </milestone>\n",
        m.id,
        escape(&m.title),
    )
}

fn render_message(m: &MockMessage) -> String {
    format!(
        "  <message>\n    <body>{}</body>\n    <id type=\"integer\">{}</id>\n    <title>{}</title>\n  </message>\n",
        escape(&m.body),
        m.id,
        escape(&m.title),
    )
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
