//! Redmine REST API client
//!
//! A thin blocking client over the handful of endpoints the tool needs:
//! versions, custom fields, memberships, the current user, and issues.
//! Authentication is either an API key (`X-Redmine-API-Key` header) or
//! HTTP basic auth with username/password.

use std::fmt;

use chrono::NaiveDate;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

/// A tracker version (release/milestone container) with an optional due date.
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Custom field format tag. Only `user` and `list` fields are promptable;
/// every other format collapses into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum FieldFormat {
    User,
    List,
    Other,
}

impl From<String> for FieldFormat {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "user" => FieldFormat::User,
            "list" => FieldFormat::List,
            _ => FieldFormat::Other,
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            FieldFormat::User => "user",
            FieldFormat::List => "list",
            FieldFormat::Other => "other",
        };
        write!(f, "{}", tag)
    }
}

/// One selectable value of a `list` custom field.
#[derive(Debug, Clone, Deserialize)]
pub struct PossibleValue {
    pub value: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// A custom field definition as returned by `/custom_fields.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomField {
    pub id: u32,
    pub name: String,
    #[serde(rename = "field_format")]
    pub format: FieldFormat,
    #[serde(default)]
    pub possible_values: Vec<PossibleValue>,
}

/// Generic `{id, name}` reference used for statuses, users and assignees.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub id: u32,
    pub name: String,
}

/// A project membership. Group memberships carry no user.
#[derive(Debug, Clone, Deserialize)]
pub struct Membership {
    pub id: u32,
    #[serde(default)]
    pub user: Option<NamedRef>,
}

/// The current authenticated user.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: u32,
    pub login: String,
    pub firstname: String,
    pub lastname: String,
}

impl User {
    /// Display name in the same shape Redmine uses for membership users.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// An existing issue, as listed by `/issues.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub id: u32,
    pub subject: String,
    pub status: NamedRef,
    #[serde(default)]
    pub assigned_to: Option<NamedRef>,
    #[serde(default)]
    pub created_on: String,
}

/// A custom field value attached to a create-issue request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomFieldValue {
    pub id: u32,
    pub value: String,
}

/// Payload for creating an issue.
#[derive(Debug, Clone, Serialize)]
pub struct NewIssue {
    pub project_id: String,
    pub tracker_id: u32,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_version_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to_id: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomFieldValue>,
}

/// Server-side filters for listing issues. Unset fields are omitted from
/// the query string; assignee values like `"me"` and the literal wildcard
/// `"*"` are passed through verbatim.
#[derive(Debug, Default, Clone)]
pub struct IssueQuery {
    pub project_id: Option<String>,
    pub tracker_id: Option<u32>,
    pub status_id: Option<String>,
    pub assigned_to_id: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<u32>,
}

impl IssueQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(project_id) = &self.project_id {
            params.push(("project_id", project_id.clone()));
        }
        if let Some(tracker_id) = self.tracker_id {
            params.push(("tracker_id", tracker_id.to_string()));
        }
        if let Some(status_id) = &self.status_id {
            params.push(("status_id", status_id.clone()));
        }
        if let Some(assigned_to_id) = &self.assigned_to_id {
            params.push(("assigned_to_id", assigned_to_id.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push(("sort", sort.clone()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

// Response envelopes

#[derive(Deserialize)]
struct VersionsResponse {
    versions: Vec<Version>,
}

#[derive(Deserialize)]
struct CustomFieldsResponse {
    custom_fields: Vec<CustomField>,
}

#[derive(Deserialize)]
struct MembershipsResponse {
    memberships: Vec<Membership>,
}

#[derive(Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Deserialize)]
struct IssuesResponse {
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct CreatedIssueResponse {
    issue: Issue,
}

#[derive(Serialize)]
struct CreateIssueBody<'a> {
    issue: &'a NewIssue,
}

#[derive(Deserialize)]
struct ApiErrors {
    errors: Vec<String>,
}

enum Auth {
    Key(String),
    Basic { username: String, password: String },
}

/// Blocking Redmine client bound to one host and one set of credentials.
pub struct Redmine {
    base: Url,
    auth: Auth,
    client: Client,
}

impl Redmine {
    /// Build a client from the loaded configuration.
    ///
    /// Requires `redmine.host` plus either a token or a username/password
    /// pair.
    pub fn from_config(config: &Config) -> Result<Self> {
        let host = config.host()?;

        let auth = if !config.redmine.token.is_empty() {
            Auth::Key(config.redmine.token.clone())
        } else if !config.redmine.username.is_empty() && !config.redmine.password.is_empty() {
            Auth::Basic {
                username: config.redmine.username.clone(),
                password: config.redmine.password.clone(),
            }
        } else {
            return Err(Error::Config(
                "set redmine.token, or both redmine.username and redmine.password".into(),
            ));
        };

        Ok(Self {
            base: parse_host(host)?,
            auth,
            client: Client::builder().build()?,
        })
    }

    /// List versions of a project.
    pub fn versions(&self, project_id: &str) -> Result<Vec<Version>> {
        let response = self.get(&format!("projects/{}/versions.json", project_id), &[])?;
        let body: VersionsResponse = response.json()?;
        Ok(body.versions)
    }

    /// List all custom field definitions.
    pub fn custom_fields(&self) -> Result<Vec<CustomField>> {
        let response = self.get("custom_fields.json", &[])?;
        let body: CustomFieldsResponse = response.json()?;
        Ok(body.custom_fields)
    }

    /// List memberships of a project.
    pub fn memberships(&self, project_id: &str) -> Result<Vec<Membership>> {
        let response = self.get(&format!("projects/{}/memberships.json", project_id), &[])?;
        let body: MembershipsResponse = response.json()?;
        Ok(body.memberships)
    }

    /// Fetch the current authenticated user.
    pub fn current_user(&self) -> Result<User> {
        let response = self.get("users/current.json", &[])?;
        let body: UserResponse = response.json()?;
        Ok(body.user)
    }

    /// List issues matching the given server-side filters.
    pub fn issues(&self, query: &IssueQuery) -> Result<Vec<Issue>> {
        let response = self.get("issues.json", &query.params())?;
        let body: IssuesResponse = response.json()?;
        Ok(body.issues)
    }

    /// Create an issue and return it as stored by the server.
    pub fn create_issue(&self, issue: &NewIssue) -> Result<Issue> {
        let url = self.url("issues.json")?;
        debug!("POST {}", url);

        let request = self
            .authed(self.client.post(url))
            .json(&CreateIssueBody { issue })
            .build()?;
        let response = self.client.execute(request)?;
        let response = check(response)?;

        let body: CreatedIssueResponse = response.json()?;
        Ok(body.issue)
    }

    fn get(&self, path: &str, params: &[(&'static str, String)]) -> Result<Response> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let request = self.authed(self.client.get(url)).query(params).build()?;
        let response = self.client.execute(request)?;
        check(response)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| Error::Config(format!("invalid API path {}: {}", path, err)))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Key(key) => builder.header("X-Redmine-API-Key", key),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }
}

/// Parse the configured host into a base URL, defaulting to https when no
/// scheme is given. The path is normalized to end with a slash so that
/// joining API paths keeps any sub-directory the server is mounted under.
fn parse_host(host: &str) -> Result<Url> {
    let mut base = Url::parse(host)
        .or_else(|_| Url::parse(&format!("https://{}", host)))
        .map_err(|err| Error::Config(format!("invalid redmine.host {:?}: {}", host, err)))?;

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    Ok(base)
}

/// Pass successful responses through, map everything else to an API error
/// carrying the server's `errors` messages when they parse.
fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrors>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ if body.trim().is_empty() => "no error details".to_string(),
        _ => body.chars().take(200).collect(),
    }
}
