use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "tweetvault",
    version,
    about = "Log in to the web API and manage the download state of archived tweets"
)]
pub struct Cli {
    /// SQLite archive to operate on
    #[arg(long, global = true, env = "TWEETVAULT_DB", default_value = "twitter.db")]
    pub db: PathBuf,

    /// Directory holding downloaded video files
    #[arg(
        long,
        global = true,
        env = "TWEETVAULT_MEDIA_DIR",
        default_value = "videos"
    )]
    pub media_dir: PathBuf,

    /// Saved login session (defaults to the user data directory)
    #[arg(long, global = true, env = "TWEETVAULT_SESSION")]
    pub session: Option<PathBuf>,

    /// Log each step at info level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the login flow and save the resulting session
    Login(LoginArgs),
    /// Delete a tweet's downloaded videos and clear its downloaded flags
    Unmark(UnmarkArgs),
    /// Fetch a page of a user's likes with the saved session
    Likes(LikesArgs),
    /// Fetch the direct-message inbox snapshot with the saved session
    Inbox(BearerArgs),
}

#[derive(Debug, Args)]
pub struct BearerArgs {
    #[arg(long, env = "TWITTER_BEARER_TOKEN", hide_env_values = true)]
    pub bearer_token: String,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    #[arg(long, env = "TWITTER_USERNAME")]
    pub username: String,

    #[arg(long, env = "TWITTER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(flatten)]
    pub bearer: BearerArgs,

    /// Do not send accumulated cookies back on later flow steps
    #[arg(long)]
    pub no_forward_cookies: bool,

    /// Send the subtask version table when starting the flow
    #[arg(long)]
    pub subtask_versions: bool,

    /// Value for x-twitter-client-language; empty to omit the header
    #[arg(long, default_value = "en")]
    pub client_language: String,

    /// Replacement instrumentation blob for the JS subtask
    #[arg(long, env = "TWITTER_JS_INSTRUMENTATION", hide_env_values = true)]
    pub js_instrumentation: Option<String>,
}

#[derive(Debug, Args)]
pub struct UnmarkArgs {
    pub tweet_id: i64,

    /// What to do when a recorded video file is already gone
    #[arg(long, value_enum, default_value_t = MissingFileArg::Continue)]
    pub on_missing_file: MissingFileArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingFileArg {
    Continue,
    Abort,
}

#[derive(Debug, Args)]
pub struct LikesArgs {
    pub user_id: i64,

    /// Pagination cursor from a previous page
    #[arg(long)]
    pub cursor: Option<String>,

    #[command(flatten)]
    pub bearer: BearerArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmark_takes_tweet_id_positionally() {
        let cli = Cli::try_parse_from(["tweetvault", "unmark", "42"]).expect("should parse");
        match cli.command {
            Command::Unmark(args) => {
                assert_eq!(args.tweet_id, 42);
                assert_eq!(args.on_missing_file, MissingFileArg::Continue);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.db, PathBuf::from("twitter.db"));
        assert_eq!(cli.media_dir, PathBuf::from("videos"));
    }

    #[test]
    fn login_flags_parse() {
        let cli = Cli::try_parse_from([
            "tweetvault",
            "login",
            "--username",
            "archivist",
            "--password",
            "pw",
            "--bearer-token",
            "tok",
            "--no-forward-cookies",
            "--client-language",
            "",
        ])
        .expect("should parse");
        let Command::Login(args) = cli.command else {
            panic!("expected login command");
        };
        assert!(args.no_forward_cookies);
        assert!(!args.subtask_versions);
        assert_eq!(args.client_language, "");
        assert_eq!(args.bearer.bearer_token, "tok");
    }
}
