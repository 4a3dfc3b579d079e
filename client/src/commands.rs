//! One handler per `groupify` subcommand.
//!
//! Handlers print results to stdout and return errors unformatted; `main`
//! decides how an error is shown.

use crate::api::client::ApiClient;
use crate::auth::models::*;
use crate::auth::service::AuthService;
use crate::cli::{Command, DashboardCommand};
use crate::config::Config;
use crate::dashboard::models::*;
use crate::dashboard::service::DashboardService;
use crate::errors::ClientError;
use crate::exports::{ExportFormat, ExportKind, ExportService};
use crate::join::backend::resolve_and_fetch;
use crate::join::link::{build_join_link, parse_join_link};
use crate::join::models::{AccessCode, Confirmation, FieldSchema, InputKind, SessionKind};
use crate::join::workflow::{JoinState, JoinWorkflow};
use crate::prompt::Prompter;
use crate::sessions::models::*;
use crate::sessions::service::HostService;
use anyhow::{Result, bail};
use std::path::Path;

const RESEND_KEYWORD: &str = "resend";

pub async fn dispatch(
    command: Command,
    config: &Config,
    client: &ApiClient,
    prompter: &mut Prompter,
) -> Result<()> {
    match command {
        Command::Join {
            code,
            fields,
            identifier,
            no_prompt,
        } => join(client, prompter, &code, fields, identifier, no_prompt).await,
        Command::Resolve { code } => resolve(config, client, &code).await,
        Command::Link { kind, code } => {
            let code = AccessCode::parse(&code)?;
            let url = build_join_link(&config.app_base_url, SessionKind::from(kind), &code)?;
            println!("{url}");
            Ok(())
        }
        Command::Signup {
            email,
            country,
            password,
        } => sign_up(client, prompter, email, country, password).await,
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompter.ask("Password").await?,
            };
            AuthService::new(client)
                .login(LoginRequest {
                    email: email.trim().to_string(),
                    password,
                })
                .await?;
            println!("Logged in as {}", email.trim());
            Ok(())
        }
        Command::Logout => {
            AuthService::new(client).logout().await?;
            println!("Logged out.");
            Ok(())
        }
        Command::Whoami => whoami(client).await,
        Command::ChangePassword {
            current,
            new_password,
        } => {
            let current_password = match current {
                Some(current) => current,
                None => prompter.ask("Current password").await?,
            };
            let new_password = match new_password {
                Some(new_password) => new_password,
                None => ask_new_password(prompter).await?,
            };
            let message = AuthService::new(client)
                .change_password(ChangePasswordRequest {
                    current_password,
                    new_password,
                })
                .await?;
            println!("{message}");
            Ok(())
        }
        Command::ForgotPassword { email } => forgot_password(client, prompter, email).await,
        Command::CreateGroup {
            name,
            identifier,
            fields,
            groups,
            max,
            reveal,
            description,
            expires,
            unit,
            rules,
        } => {
            let mut form = GroupSessionForm::new(&name, &identifier);
            for field in &fields {
                form.collected.add_field(field)?;
            }
            for group in &groups {
                form.add_group_name(group);
            }
            for (field_key, max_per_group) in &rules {
                form.add_rule(field_key, *max_per_group);
            }
            form.max = max;
            form.reveal = reveal;
            form.description = description.unwrap_or_default();
            form.expiration = Expiration::new(expires, unit);

            let created = HostService::new(client).create_group(form).await?;
            print_created(config, SessionKind::Group, &created);
            Ok(())
        }
        Command::CreateSelection {
            name,
            identifier,
            fields,
            description,
            expires,
            unit,
            rules,
        } => {
            let mut form = SelectionSessionForm::new(&name, &identifier);
            for field in &fields {
                form.collected.add_field(field)?;
            }
            for (field_key, max_selected) in &rules {
                form.add_rule(field_key, *max_selected);
            }
            form.description = description.unwrap_or_default();
            form.expiration = Expiration::new(expires, unit);

            let created = HostService::new(client).create_selection(form).await?;
            print_created(config, SessionKind::Selection, &created);
            Ok(())
        }
        Command::Select {
            code,
            count,
            prefer,
            prefer_max,
        } => {
            let preference = prefer
                .as_ref()
                .map(|(key, value)| (key.as_str(), value.as_str()));
            let request = SelectMembersRequest::new(&code, count, preference, prefer_max)?;
            let result = HostService::new(client).select_members(request).await?;

            println!(
                "Selected {} ({} preferential, {} random)",
                result.selected_count, result.preferential_count, result.random_count
            );
            for identifier in &result.member_identifiers {
                println!("  {identifier}");
            }
            Ok(())
        }
        Command::ClearSelection { code } => {
            let message = HostService::new(client).clear_selections(&code).await?;
            println!("{message}");
            Ok(())
        }
        Command::Export {
            kind,
            session_id,
            code,
            format,
            out,
        } => export(client, kind, session_id, &code, format, &out).await,
        Command::Dashboard { command } => dashboard(client, command).await,
    }
}

async fn dashboard(client: &ApiClient, command: DashboardCommand) -> Result<()> {
    let service = DashboardService::new(client);
    match command {
        DashboardCommand::Overview => {
            let overview = service.overview().await?;
            println!("Sessions created:   {}", overview.sessions_created);
            println!("Active sessions:    {}", overview.active_sessions);
            println!("Total participants: {}", overview.total_participants);
            println!("Completed groups:   {}", overview.completed_groups);
            println!("Success rate:       {:.1}%", overview.success_rate);
            println!("Avg. duration:      {:.1} h", overview.avg_session_duration);
        }
        DashboardCommand::Sessions {
            session_type,
            active: true,
            limit,
            ..
        } => {
            let sessions = service
                .active_sessions(&ActiveQuery {
                    session_type,
                    limit,
                })
                .await?;
            if sessions.is_empty() {
                println!("No active sessions.");
            }
            for session in &sessions {
                let capacity = session
                    .max_participants
                    .map(|max| format!("/{max}"))
                    .unwrap_or_default();
                println!(
                    "{:>6}  {:<9}  {:<10}  {}{} joined  {}  expires {}",
                    session.id,
                    session.kind,
                    session.access_code,
                    session.participant_count,
                    capacity,
                    session.name,
                    session.expires_at.as_deref().unwrap_or("never")
                );
            }
        }
        DashboardCommand::Sessions {
            session_type,
            status,
            search,
            limit,
            offset,
            ..
        } => {
            let history = service
                .session_history(&HistoryQuery {
                    session_type,
                    status,
                    search,
                    limit,
                    offset,
                })
                .await?;
            if history.sessions.is_empty() {
                println!("No sessions found.");
            }
            for session in &history.sessions {
                let progress = match (session.group_created, session.selected) {
                    (Some(groups), _) => format!("{groups} group(s)"),
                    (None, Some(selected)) => format!("{selected} selected"),
                    (None, None) => String::new(),
                };
                println!(
                    "{:>6}  {:<9}  {:<10}  {:<7}  {:>4} joined  {}  {}",
                    session.id,
                    session.kind,
                    session.access_code.as_deref().unwrap_or("-"),
                    session.status,
                    session.participant_count,
                    session.name,
                    progress
                );
            }
            if history.has_more() {
                println!(
                    "Showing {}-{} of {}; use --offset {} for more.",
                    offset + 1,
                    offset as usize + history.sessions.len(),
                    history.total_count,
                    offset as usize + history.sessions.len()
                );
            }
        }
        DashboardCommand::Participants {
            session_type,
            session_id,
            limit,
            offset,
        } => {
            let page = service
                .participants(
                    session_id,
                    &ParticipantsQuery {
                        session_type,
                        limit,
                        offset,
                    },
                )
                .await?;
            println!(
                "{} participant(s) in {} session {}",
                page.total_count, page.session_type, page.session_id
            );
            for participant in &page.participants {
                let mut line = participant.identifier.clone();
                if let Some(group_id) = participant.group_id {
                    line.push_str(&format!("  group {group_id}"));
                }
                if participant.is_selected == Some(true) {
                    line.push_str("  selected");
                }
                if let Some(joined_at) = &participant.joined_at {
                    line.push_str(&format!("  joined {joined_at}"));
                }
                println!("{line}");
                if let Some(data) = participant.data.as_object().filter(|d| !d.is_empty()) {
                    for (field, value) in data {
                        match value.as_str() {
                            Some(text) => println!("    {field}: {text}"),
                            None => println!("    {field}: {value}"),
                        }
                    }
                }
            }
        }
        DashboardCommand::Exports { format, limit } => {
            let exports = service
                .recent_exports(&ExportsQuery {
                    limit,
                    file_type: format,
                })
                .await?;
            if exports.is_empty() {
                println!("No exports yet.");
            }
            for export in &exports {
                println!(
                    "{:>4}  {:<5}  {:>8.1} KB  {}  {}  {}",
                    export.id,
                    export.file_type,
                    export.file_size as f64 / 1024.0,
                    export.file_name,
                    export.session_name,
                    export.created_at.as_deref().unwrap_or("")
                );
                if !export.download_url.is_empty() {
                    println!("      {}", export.download_url);
                }
                if let Some(session_id) = export.session_id {
                    tracing::debug!("Export {} belongs to session {}", export.id, session_id);
                }
            }
        }
        DashboardCommand::Activity { days, limit } => {
            let activity = service.activity(&ActivityQuery { days, limit }).await?;
            if activity.is_empty() {
                println!("No activity in the last {days} day(s).");
            }
            for item in &activity {
                let who = item
                    .participant_identifier
                    .as_deref()
                    .map(|who| format!(" ({who})"))
                    .unwrap_or_default();
                println!(
                    "{}  {}{}  [{} {}: {}]",
                    item.timestamp.as_deref().unwrap_or(""),
                    item.description,
                    who,
                    item.session_type,
                    item.kind,
                    item.session_name
                );
                tracing::trace!("Activity {}", item.id);
            }
        }
        DashboardCommand::End {
            session_type,
            session_id,
        } => {
            let ended = service.end_session(session_id, session_type).await?;
            let message = ended
                .message
                .unwrap_or_else(|| format!("Session {} has been ended", ended.session_id));
            match ended.ended_at {
                Some(at) => println!("{message} ({at})"),
                None => println!("{message}"),
            }
        }
    }
    Ok(())
}

async fn join(
    client: &ApiClient,
    prompter: &mut Prompter,
    input: &str,
    fields: Vec<(String, String)>,
    identifier: Option<String>,
    no_prompt: bool,
) -> Result<()> {
    let mut workflow = JoinWorkflow::new();
    if input.contains("://") {
        let link = parse_join_link(input)?;
        workflow.resume_from_link(client, &link).await?;
    } else {
        workflow.check_code(client, input).await?;
    }

    let form = match workflow.state() {
        JoinState::SchemaLoaded(form) => form.clone(),
        JoinState::ResolutionError { message, .. } => {
            return Err(ClientError::resolution(message.clone()).into());
        }
        other => bail!("code check ended in state {}", other.name()),
    };
    print_schema(form.kind(), form.schema());

    for (field, value) in fields {
        workflow.set_field(&field, value)?;
    }
    if let Some(identifier) = identifier {
        workflow.set_identifier(identifier)?;
    }

    // without prompting, submission below reports what is missing
    if !no_prompt && prompter.is_interactive() {
        while !workflow.can_submit() {
            let Some(form) = workflow.state().form().cloned() else {
                break;
            };
            for field in &form.schema().fields {
                if form.values().get(field).is_none_or(|v| v.trim().is_empty()) {
                    let value = prompter.ask(field).await?;
                    workflow.set_field(field, value)?;
                }
            }
            if form.identifier().trim().is_empty() {
                let label = match form.schema().identifier_input() {
                    InputKind::Email => format!("{} (email address)", form.schema().identifier_label()),
                    InputKind::Text => form.schema().identifier_label().to_string(),
                };
                let value = prompter.ask(&label).await?;
                workflow.set_identifier(value)?;
            }
        }
    }

    workflow.submit(client).await?;
    match workflow.state() {
        JoinState::JoinSucceeded(confirmation) => {
            print_confirmation(confirmation);
            Ok(())
        }
        JoinState::SchemaLoaded(form) => {
            let message = form.error().unwrap_or(form.kind().join_fallback());
            Err(ClientError::join(message).into())
        }
        other => bail!("join ended in state {}", other.name()),
    }
}

async fn resolve(config: &Config, client: &ApiClient, raw: &str) -> Result<()> {
    let code = AccessCode::parse(raw)?;
    let (kind, schema) = resolve_and_fetch(client, &code).await?;

    print_schema(kind, &schema);
    println!("Asks for: {}", schema.fields.join(", "));
    println!("Identifier: {}", schema.identifier_label());
    println!("Link: {}", build_join_link(&config.app_base_url, kind, &code)?);
    Ok(())
}

async fn sign_up(
    client: &ApiClient,
    prompter: &mut Prompter,
    email: String,
    country: String,
    password: Option<String>,
) -> Result<()> {
    let (password, confirm_password) = match password {
        Some(password) => (password.clone(), password),
        None => (
            prompter.ask("Password").await?,
            prompter.ask("Confirm password").await?,
        ),
    };

    let service = AuthService::new(client);
    let message = service
        .sign_up(SignUpRequest {
            email: email.trim().to_string(),
            password,
            confirm_password,
            country: country.trim().to_string(),
        })
        .await?;
    println!("{message}");

    if !prompter.is_interactive() {
        println!("Email not verified: run signup again from a terminal to enter the code.");
        return Ok(());
    }

    loop {
        let code = prompter
            .ask_required(&format!("Verification code (or '{RESEND_KEYWORD}')"))
            .await?;
        if code.trim().eq_ignore_ascii_case(RESEND_KEYWORD) {
            println!("{}", service.resend_verification().await?);
            continue;
        }
        let message = service
            .confirm_email(VerificationCodeRequest {
                code: code.trim().to_string(),
            })
            .await?;
        println!("{message}");
        return Ok(());
    }
}

async fn forgot_password(client: &ApiClient, prompter: &mut Prompter, email: String) -> Result<()> {
    if !prompter.is_interactive() {
        return Err(ClientError::validation("Resetting a password needs an interactive terminal").into());
    }

    let service = AuthService::new(client);
    let message = service
        .forgot_password_start(EmailRequest {
            email: email.trim().to_string(),
        })
        .await?;
    println!("{message}");
    if let Some(masked) = service.verification_session().await?.email_masked {
        println!("Enter the code sent to {masked}.");
    }

    loop {
        let code = prompter
            .ask_required(&format!("Reset code (or '{RESEND_KEYWORD}')"))
            .await?;
        if code.trim().eq_ignore_ascii_case(RESEND_KEYWORD) {
            println!("{}", service.forgot_password_resend().await?);
            continue;
        }
        service
            .forgot_password_verify(VerificationCodeRequest {
                code: code.trim().to_string(),
            })
            .await?;
        break;
    }

    let new_password = ask_new_password(prompter).await?;
    let message = service
        .forgot_password_reset(ResetPasswordRequest { new_password })
        .await?;
    println!("{message}");
    Ok(())
}

async fn ask_new_password(prompter: &mut Prompter) -> Result<String> {
    let password = prompter.ask("New password").await?;
    let confirm = prompter.ask("Confirm new password").await?;
    if password != confirm {
        return Err(ClientError::validation("Passwords do not match.").into());
    }
    Ok(password)
}

async fn whoami(client: &ApiClient) -> Result<()> {
    let service = AuthService::new(client);
    match service.verify_token().await? {
        Some(check) if check.valid => {
            let profile = service.profile().await?;
            println!("{}", profile.email);
            if let Some(country) = &profile.country {
                println!("Country: {country}");
            }
            println!("Active: {}", if profile.is_active { "yes" } else { "no" });
            if let Some(created_at) = &profile.created_at {
                println!("Member since: {created_at}");
            }
        }
        _ => println!("Not logged in."),
    }
    Ok(())
}

async fn export(
    client: &ApiClient,
    kind: ExportKind,
    session_id: i64,
    code: &str,
    format: Option<ExportFormat>,
    out: &Path,
) -> Result<()> {
    let formats = match format {
        Some(format) => vec![format],
        None => ExportFormat::ALL.to_vec(),
    };

    let mut first_error = None;
    for result in ExportService::new(client)
        .save_all(kind, session_id, &formats, code, out)
        .await
    {
        match result {
            Ok(path) => println!("Saved {}", path.display()),
            Err(e) => {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn print_schema(kind: SessionKind, schema: &FieldSchema) {
    match &schema.name {
        Some(name) => println!("{name} ({kind})"),
        None => println!("A {kind} session"),
    }
    if let Some(description) = schema.description.as_deref().filter(|d| !d.trim().is_empty()) {
        println!("{description}");
    }
}

fn print_confirmation(confirmation: &Confirmation) {
    println!(
        "Joined {} at {}",
        confirmation.session_name.as_deref().unwrap_or(confirmation.code.as_str()),
        confirmation.joined_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Ok(details) = serde_json::to_string_pretty(&confirmation.response) {
        println!("{details}");
    }
}

fn print_created(config: &Config, kind: SessionKind, created: &CreatedSession) {
    println!("Created {} session {} ({})", kind, created.name, created.id);
    let Some(code) = created.code.as_deref() else {
        return;
    };
    println!("Access code: {code}");
    match AccessCode::parse(code).and_then(|code| build_join_link(&config.app_base_url, kind, &code)) {
        Ok(url) => println!("Join link: {url}"),
        Err(e) => tracing::warn!("Could not build join link for {}: {}", code, e),
    }
}
