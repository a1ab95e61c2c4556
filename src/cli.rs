//! Command line interface.
//!
//! Each invocation logs in with the profile's stored secret, validates the
//! session, runs a single operation and prints the result as JSON.

use std::io::BufRead;
use std::path::PathBuf;

use chrono::Duration;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::info;

use crate::api::types::EstimateUpdateMethod;
use crate::api::{auth, ApiError, HttpTransport, Transport};
use crate::config::{AuthMode, Config, Profile};
use crate::error::{AppError, Result};
use crate::session::JiraSession;

/// Work with JIRA issues from the terminal.
#[derive(Debug, Parser)]
#[command(name = "jira-session", version, about)]
pub struct Cli {
    /// Profile to use instead of the configured default.
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Alternative configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a profile to the configuration, or replace one with the same name.
    AddProfile {
        name: String,
        /// Base URL of the JIRA instance.
        url: String,
        username: String,
        /// Send credentials as a Basic auth header instead of a session cookie.
        #[arg(long)]
        basic: bool,
        /// Make this the default profile.
        #[arg(long)]
        default: bool,
    },
    /// Store the profile's password or API token (read from stdin) in the OS keyring.
    SetPassword,
    /// Check that the stored credentials work and show who is logged in.
    Login,
    /// List favourite filters.
    Filters,
    /// Search issues with JQL.
    Search {
        jql: String,
        /// Maximum number of issues to return.
        #[arg(short, long)]
        max: Option<u32>,
    },
    /// Show an issue's summary.
    Summary { key: String },
    /// Show an issue's time tracking.
    Timetracking { key: String },
    /// Log work on an issue, ending now.
    Worklog {
        key: String,
        /// Time spent, e.g. "1h 30m", "45m" or "90s".
        #[arg(value_parser = parse_duration)]
        duration: Duration,
        #[arg(short, long, default_value = "")]
        comment: String,
        /// How to adjust the remaining estimate.
        #[arg(long, value_enum, default_value_t = EstimateArg::Auto)]
        estimate: EstimateArg,
        /// Value for `--estimate set` or `--estimate reduce`.
        #[arg(long, default_value = "")]
        estimate_value: String,
    },
    /// Comment on an issue.
    Comment { key: String, text: String },
    /// List the transitions available for an issue.
    Transitions { key: String },
    /// Move an issue through a transition.
    Transition { key: String, id: u32 },
    /// Show the projects and issue types you can create issues in.
    CreateMeta,
    /// Search users.
    Users { pattern: String },
    /// Show the logged-in user.
    Myself,
    /// Create an issue and print its key.
    Create {
        #[arg(long)]
        project: u64,
        #[arg(long)]
        issue_type: u64,
        #[arg(long)]
        summary: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        assignee: String,
    },
    /// Attach a file to an issue.
    Attach { key: String, file: PathBuf },
    /// Link two issues.
    Link { from: String, to: String },
}

/// Command line spelling of [`EstimateUpdateMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EstimateArg {
    Auto,
    Leave,
    Set,
    Reduce,
}

impl From<EstimateArg> for EstimateUpdateMethod {
    fn from(arg: EstimateArg) -> Self {
        match arg {
            EstimateArg::Auto => EstimateUpdateMethod::Auto,
            EstimateArg::Leave => EstimateUpdateMethod::Leave,
            EstimateArg::Set => EstimateUpdateMethod::SetTo,
            EstimateArg::Reduce => EstimateUpdateMethod::ManualDecrease,
        }
    }
}

/// Parse a duration in JIRA notation: whitespace-separated or concatenated
/// `<n>h`, `<n>m` and `<n>s` parts.
pub fn parse_duration(input: &str) -> std::result::Result<Duration, String> {
    let mut total = Duration::zero();
    let mut digits = String::new();
    let mut seen_unit = false;

    for c in input.trim().chars() {
        match c {
            '0'..='9' => digits.push(c),
            'h' | 'm' | 's' => {
                if digits.is_empty() {
                    return Err(format!("missing number before '{}' in '{}'", c, input));
                }
                let too_large = || format!("duration '{}' is too large", input);
                let n: i64 = digits.parse().map_err(|_| too_large())?;
                let part = match c {
                    'h' => Duration::try_hours(n),
                    'm' => Duration::try_minutes(n),
                    _ => Duration::try_seconds(n),
                };
                total = part
                    .and_then(|part| total.checked_add(&part))
                    .ok_or_else(too_large)?;
                digits.clear();
                seen_unit = true;
            }
            c if c.is_whitespace() && digits.is_empty() => {}
            _ => return Err(format!("invalid duration '{}'", input)),
        }
    }

    if !digits.is_empty() {
        return Err(format!("missing unit after '{}' in '{}'", digits, input));
    }
    if !seen_unit || total <= Duration::zero() {
        return Err(format!("duration '{}' must be positive", input));
    }
    Ok(total)
}

/// Run a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) if !path.exists() && matches!(cli.command, Command::AddProfile { .. }) => {
            Config::default()
        }
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Command::AddProfile {
        name,
        url,
        username,
        basic,
        default,
    } = cli.command
    {
        let mut profile = Profile::new(name, url, username);
        if basic {
            profile.auth = AuthMode::Basic;
        }
        let config = add_profile(config, profile, default);
        match &cli.config {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        return Ok(());
    }

    let profile = match &cli.profile {
        Some(name) => config.profile(name)?,
        None => config.default_profile()?,
    };

    if let Command::SetPassword = cli.command {
        return set_password(profile);
    }

    let secret = auth::get_secret(&profile.name)?;
    let transport = HttpTransport::from_profile(profile, &config.settings, &secret)?;
    let mut session = JiraSession::with_transport(transport);

    if !session.authenticate(&profile.username, &secret).await?
        || !session.validate_session().await?
    {
        return Err(ApiError::AccessDenied(session.error_message().to_string()).into());
    }
    info!(profile = %profile.name, "Session established");

    execute(&session, cli.command, config.settings.max_results).await
}

fn add_profile(mut config: Config, profile: Profile, make_default: bool) -> Config {
    if make_default {
        config.settings.default_profile = Some(profile.name.clone());
    }
    info!(profile = %profile.name, "Adding profile");
    config.upsert_profile(profile);
    config
}

fn set_password(profile: &Profile) -> Result<()> {
    eprintln!("Password or API token for '{}':", profile.username);
    let mut secret = String::new();
    std::io::stdin().lock().read_line(&mut secret)?;
    let secret = secret.trim_end_matches(['\r', '\n']);
    if secret.is_empty() {
        return Err(AppError::other("No secret given"));
    }

    auth::store_secret(&profile.name, secret)?;
    println!("Stored secret for profile '{}'", profile.name);
    Ok(())
}

/// Run one operation against an established session.
pub async fn execute<T: Transport>(
    session: &JiraSession<T>,
    command: Command,
    max_results: u32,
) -> Result<()> {
    match command {
        Command::AddProfile { .. } | Command::SetPassword => {
            Err(AppError::other("this command needs no session"))
        }
        Command::Login | Command::Myself => print_json(&session.get_myself().await?),
        Command::Filters => print_json(&found(session.get_favorite_filters().await?)?),
        Command::Search { jql, max } => print_json(&found(
            session
                .get_issues_by_jql(&jql, Some(max.unwrap_or(max_results)))
                .await?,
        )?),
        Command::Summary { key } => {
            println!("{}", session.get_issue_summary(&key).await?);
            Ok(())
        }
        Command::Timetracking { key } => {
            print_json(&found(session.get_issue_timetracking(&key).await?)?)
        }
        Command::Worklog {
            key,
            duration,
            comment,
            estimate,
            estimate_value,
        } => accepted(
            session
                .post_worklog(&key, duration, &comment, estimate.into(), &estimate_value)
                .await?,
            "worklog",
        ),
        Command::Comment { key, text } => {
            accepted(session.post_comment(&key, &text).await?, "comment")
        }
        Command::Transitions { key } => {
            print_json(&found(session.get_available_transitions(&key).await?)?)
        }
        Command::Transition { key, id } => {
            accepted(session.do_transition(&key, id).await?, "transition")
        }
        Command::CreateMeta => print_json(&session.get_create_issue_meta().await?),
        Command::Users { pattern } => print_json(&session.find_users(&pattern).await?),
        Command::Create {
            project,
            issue_type,
            summary,
            description,
            assignee,
        } => {
            let key = found(
                session
                    .create_issue(project, issue_type, &summary, &description, &assignee)
                    .await?,
            )?;
            println!("{}", key);
            Ok(())
        }
        Command::Attach { key, file } => Ok(session.add_attachment(&key, &file)?),
        Command::Link { from, to } => Ok(session.link_issues(&from, &to)?),
    }
}

fn found<T>(value: Option<T>) -> Result<T> {
    value.ok_or_else(|| AppError::other("JIRA denied access to this resource"))
}

fn accepted(ok: bool, what: &str) -> Result<()> {
    if ok {
        println!("{} posted", what);
        Ok(())
    } else {
        Err(AppError::other(format!("JIRA refused the {}", what)))
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::other(format!("Failed to format output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
