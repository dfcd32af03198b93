use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use colored::Colorize;
use log::debug;

use crate::cli::{Args, Command, IssueCommand, ReleaseCommand};
use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::redmine::{IssueQuery, Redmine};
use crate::release::{self, ReleaseDraft};
use crate::ui;

/// Main application entry point
pub fn run(args: Args) -> Result<()> {
    ui::init_render_config();

    let config_path = resolve_config_path(args.config)?;
    let config = Config::load(&config_path)?;

    match args.command {
        Command::Config => configure(&config, &config_path),
        Command::Version => list_versions(&config),
        Command::Release {
            command: ReleaseCommand::Create,
        } => create_release(&config),
        Command::Release {
            command: ReleaseCommand::List { all, limit, me },
        } => list_releases(&config, all, limit, me),
        Command::CustomField => dump_custom_fields(&config),
        Command::Members => list_members(&config),
        Command::Issue {
            command: IssueCommand::List { me, open, closed },
        } => list_issues(&config, me, open, closed),
    }
}

fn resolve_config_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    match override_path {
        Some(path) => Ok(path),
        None => config::default_config_path(),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Interactive configuration setup. Prompts for every setting, echoes the
/// result and writes the file only after confirmation.
fn configure(existing: &Config, path: &Path) -> Result<()> {
    let mut config = existing.clone();

    config.redmine.host =
        ui::prompt_text("Redmine URL:", non_empty(&existing.redmine.host))?;
    config.redmine.token =
        ui::prompt_optional("API token (leave empty to use username/password):")?;

    if config.redmine.token.is_empty() {
        config.redmine.username =
            ui::prompt_text("Username:", non_empty(&existing.redmine.username))?;
        config.redmine.password = ui::prompt_password("Password:")?;
    } else {
        config.redmine.username.clear();
        config.redmine.password.clear();
    }

    config.project.id = ui::prompt_text("Project id:", non_empty(&existing.project.id))?;
    config.release.tracker_id = Some(ui::prompt_u32(
        "Release tracker id:",
        existing.release.tracker_id,
    )?);
    config.release.done_status_id = Some(ui::prompt_u32(
        "Done status id:",
        existing.release.done_status_id,
    )?);
    config.release.subject = ui::prompt_text(
        "Release subject template (%s is replaced with the number):",
        Some(existing.subject_template()),
    )?;

    let field_ids = ui::prompt_optional("Custom field ids to prompt for (comma separated):")?;
    config.release.filter_custom_fields = field_ids
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect();

    println!();
    print_setting("redmine.host", &config.redmine.host);
    if config.redmine.token.is_empty() {
        print_setting("redmine.username", &config.redmine.username);
        print_setting("redmine.password", "[hidden]");
    } else {
        print_setting("redmine.token", "[hidden]");
    }
    print_setting("project.id", &config.project.id);
    print_setting("release.tracker_id", &display_id(config.release.tracker_id));
    print_setting(
        "release.done_status_id",
        &display_id(config.release.done_status_id),
    );
    print_setting("release.subject", &config.release.subject);
    print_setting(
        "release.filter_custom_fields",
        &config.release.filter_custom_fields.join(", "),
    );

    if ui::prompt_confirm("Is everything correct?", true)? {
        config.save(path)?;
        println!("{} Saved to {}", ">".bright_green(), path.display());
    }

    Ok(())
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

fn display_id(id: Option<u32>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

fn print_setting(name: &str, value: &str) {
    println!("{} {}: {}", ">".bright_green(), name, value.bright_cyan());
}

/// List versions that qualify as release targets
fn list_versions(config: &Config) -> Result<()> {
    let redmine = Redmine::from_config(config)?;
    let versions = redmine.versions(config.project_id()?)?;
    let eligible = release::eligible_versions(versions, today());

    if eligible.is_empty() {
        println!("No versions due in the last 30 days.");
        return Ok(());
    }

    for version in &eligible {
        if let Some(due) = version.due_date {
            println!(
                "{} {} (due {})",
                ">".bright_green(),
                version.name.bright_cyan(),
                due
            );
        }
    }

    Ok(())
}

/// Interactive release issue wizard
fn create_release(config: &Config) -> Result<()> {
    let redmine = Redmine::from_config(config)?;
    let project_id = config.project_id()?;
    let tracker_id = config.tracker_id()?;
    let template = config.subject_template();

    let user = redmine.current_user()?;
    let members = redmine.memberships(project_id)?;
    let versions = redmine.versions(project_id)?;
    let fields = redmine.custom_fields()?;

    let today = today();
    let eligible = release::eligible_versions(versions, today);
    if eligible.is_empty() {
        return Err(Error::InvalidInput(
            "no versions due in the last 30 days to release".into(),
        ));
    }

    let number = ui::prompt_search("Release number:", release::release_numbers(today))?;

    let version_names: Vec<String> = eligible.iter().map(|v| v.name.clone()).collect();
    let chosen = ui::prompt_select("Version:", version_names, None)?;
    let version = eligible
        .into_iter()
        .find(|v| v.name == chosen)
        .ok_or_else(|| Error::InvalidInput(format!("unknown version {:?}", chosen)))?;

    let description = ui::prompt_editor("Release description:")?;

    let current_name = user.display_name();
    let member_options = release::member_names(&members);
    let assignee_id = if member_options.is_empty() {
        user.id
    } else {
        let chosen = ui::prompt_select("Assignee:", member_options, Some(&current_name))?;
        release::member_id_by_name(&members, &chosen).unwrap_or(user.id)
    };

    let prompts = release::field_prompts(
        &fields,
        &config.filter_custom_field_ids(),
        &members,
        &current_name,
    );

    let mut custom_fields = Vec::new();
    for prompt in &prompts {
        let label = format!("{}:", prompt.name);
        let answer = if prompt.wants_search() {
            ui::prompt_search(&label, prompt.options.clone())?
        } else {
            ui::prompt_select(&label, prompt.options.clone(), prompt.default.as_deref())?
        };

        match release::resolve_field(prompt, &answer, &members) {
            Some(value) => custom_fields.push(value),
            None => debug!(
                "dropping custom field {} ({}): no membership named {:?}",
                prompt.id, prompt.name, answer
            ),
        }
    }

    let draft = ReleaseDraft {
        number,
        version,
        description,
        assignee_id,
        custom_fields,
    };

    println!();
    println!(
        "{} Subject: {}",
        ">".bright_green(),
        draft.subject(template).bright_cyan()
    );
    println!(
        "{} Version: {}",
        ">".bright_green(),
        draft.version.name.bright_cyan()
    );

    if !ui::prompt_confirm("Create the release issue?", true)? {
        return Ok(());
    }

    let issue = redmine.create_issue(&draft.into_issue(project_id, tracker_id, template))?;
    println!("{} Created issue #{}", "+".bright_green(), issue.id);

    Ok(())
}

/// List release issues, hiding published ones unless `--all` is set
fn list_releases(config: &Config, all: bool, limit: u32, me: bool) -> Result<()> {
    let redmine = Redmine::from_config(config)?;
    let done_status_id = config.done_status_id()?;

    let query = IssueQuery {
        project_id: Some(config.project_id()?.to_string()),
        tracker_id: Some(config.tracker_id()?),
        assigned_to_id: Some(if me { "me".to_string() } else { "*".to_string() }),
        sort: Some("created_on:desc".to_string()),
        limit: Some(limit),
        ..Default::default()
    };

    let issues = redmine.issues(&query)?;
    let visible = release::unreleased(issues, done_status_id, all);

    println!("{}", "Unpublished releases".bright_green());
    for issue in &visible {
        println!("#{} {} {}", issue.id, issue.subject, issue.status.name.bright_cyan());
    }

    Ok(())
}

/// Dump every custom field definition with its possible values
fn dump_custom_fields(config: &Config) -> Result<()> {
    let redmine = Redmine::from_config(config)?;

    for field in redmine.custom_fields()? {
        println!("{} {} ({})", field.id, field.name.bright_cyan(), field.format);
        for value in &field.possible_values {
            match &value.label {
                Some(label) => println!("  - {} ({})", value.value, label),
                None => println!("  - {}", value.value),
            }
        }
    }

    Ok(())
}

/// List user-backed memberships of the configured project
fn list_members(config: &Config) -> Result<()> {
    let redmine = Redmine::from_config(config)?;

    for membership in redmine.memberships(config.project_id()?)? {
        if let Some(user) = membership.user {
            println!("{} {}", user.id, user.name.bright_cyan());
        }
    }

    Ok(())
}

/// List project issues with open/closed and assignee passthrough filters
fn list_issues(config: &Config, me: bool, open: bool, closed: bool) -> Result<()> {
    let redmine = Redmine::from_config(config)?;
    debug!("listing issues (me={}, open={}, closed={})", me, open, closed);

    let status = if closed { "closed" } else { "open" };
    let query = IssueQuery {
        project_id: Some(config.project_id()?.to_string()),
        status_id: Some(status.to_string()),
        assigned_to_id: me.then(|| "me".to_string()),
        sort: Some("created_on:desc".to_string()),
        ..Default::default()
    };

    for issue in redmine.issues(&query)? {
        match &issue.assigned_to {
            Some(assignee) => println!(
                "#{} {} {} ({})",
                issue.id,
                issue.subject,
                issue.status.name.bright_cyan(),
                assignee.name
            ),
            None => println!("#{} {} {}", issue.id, issue.subject, issue.status.name.bright_cyan()),
        }
    }

    Ok(())
}
