mod report;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};

use crate::api::ApiClient;
use crate::cli::{BearerArgs, Cli, Command, LikesArgs, LoginArgs, MissingFileArg, UnmarkArgs};
use crate::config::{ApiConfig, BearerToken, Credentials, login_options, session_path};
use crate::db::Database;
use crate::login::{AuthSession, FlowRunner};
use crate::unmark::{MissingFilePolicy, unmark_tweet};

use self::report::{print_json, session_summary, unmark_summary};

pub fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Login(args) => run_login(&cli, args)?,
        Command::Unmark(args) => run_unmark(&cli, args)?,
        Command::Likes(args) => run_likes(&cli, args)?,
        Command::Inbox(args) => run_inbox(&cli, args)?,
    }

    Ok(())
}

fn run_login(cli: &Cli, args: &LoginArgs) -> Result<()> {
    let config = ApiConfig {
        options: login_options(args),
        ..ApiConfig::new(BearerToken::new(args.bearer.bearer_token.as_str()))
    };
    let credentials = Credentials {
        username: args.username.clone(),
        password: args.password.clone(),
    };

    let session = FlowRunner::new(&config)
        .run(&credentials)
        .with_context(|| format!("login failed for {}", credentials.username))?;

    let path = session_path(cli)?;
    session.save(&path)?;
    println!("{}", session_summary(&session, &path));
    Ok(())
}

fn run_unmark(cli: &Cli, args: &UnmarkArgs) -> Result<()> {
    let mut db = Database::open(&cli.db)?;
    db.migrate()?;

    let report = unmark_tweet(
        &mut db,
        args.tweet_id,
        &cli.media_dir,
        missing_file_policy(args.on_missing_file),
    )
    .with_context(|| format!("failed to unmark tweet {}", args.tweet_id))?;

    println!("{}", unmark_summary(&report));
    Ok(())
}

fn run_likes(cli: &Cli, args: &LikesArgs) -> Result<()> {
    let config = read_config(&args.bearer);
    let path = session_path(cli)?;
    let session = AuthSession::load(&path)?;

    let (session, page) = ApiClient::new(&config)
        .likes(session, args.user_id, args.cursor.as_deref())
        .with_context(|| format!("failed to fetch likes for user {}", args.user_id))?;

    session.save(&path)?;
    print_json(&page)
}

fn run_inbox(cli: &Cli, args: &BearerArgs) -> Result<()> {
    let config = read_config(args);
    let path = session_path(cli)?;
    let session = AuthSession::load(&path)?;

    let (session, inbox) = ApiClient::new(&config)
        .dm_inbox(session)
        .context("failed to fetch the direct-message inbox")?;

    session.save(&path)?;
    print_json(&inbox)
}

fn read_config(args: &BearerArgs) -> ApiConfig {
    ApiConfig::new(BearerToken::new(args.bearer_token.as_str()))
}

fn missing_file_policy(arg: MissingFileArg) -> MissingFilePolicy {
    match arg {
        MissingFileArg::Continue => MissingFilePolicy::Continue,
        MissingFileArg::Abort => MissingFilePolicy::Abort,
    }
}
