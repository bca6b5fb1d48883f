use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::db::{self, Database};

#[derive(Debug, Error)]
pub enum UnmarkError {
    #[error("tweet {0} is not in the database")]
    NotFound(i64),
    #[error("cannot delete {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// What to do when a video recorded as downloaded has no file on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingFilePolicy {
    /// Log it and clear the flag anyway.
    #[default]
    Continue,
    /// Fail before touching anything.
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnmarkReport {
    pub tweet_id: i64,
    pub videos_cleared: usize,
    pub files_deleted: Vec<PathBuf>,
    pub files_missing: Vec<PathBuf>,
}

/// Deletes every video file recorded for `tweet_id` under `media_dir` and
/// clears the downloaded flags on the videos and the tweet.
///
/// Each file is removed before its flag is cleared. If a deletion fails, the
/// flags of videos whose files are already gone are still committed, the
/// failing video keeps its flag and the error is returned.
pub fn unmark_tweet(
    db: &mut Database,
    tweet_id: i64,
    media_dir: &Path,
    policy: MissingFilePolicy,
) -> Result<UnmarkReport, UnmarkError> {
    let tx = db.transaction()?;
    if !db::tweet_exists(&tx, tweet_id)? {
        return Err(UnmarkError::NotFound(tweet_id));
    }

    let mut videos = Vec::new();
    for video in db::videos_for_tweet(&tx, tweet_id)? {
        let path = media_path(media_dir, &video.local_filename)?;
        videos.push((video, path));
    }

    if policy == MissingFilePolicy::Abort {
        for (_, path) in videos.iter().filter(|(video, _)| video.is_downloaded) {
            if !path.exists() {
                return Err(UnmarkError::Filesystem {
                    path: path.clone(),
                    source: io::ErrorKind::NotFound.into(),
                });
            }
        }
    }

    let mut report = UnmarkReport {
        tweet_id,
        ..UnmarkReport::default()
    };
    let mut failure = None;
    for (video, path) in videos {
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(video = video.id, tweet = video.tweet_id, "deleted {}", path.display());
                report.files_deleted.push(path);
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if video.is_downloaded {
                    warn!(video = video.id, "{} was already gone", path.display());
                }
                report.files_missing.push(path);
            }
            Err(source) => {
                failure = Some(UnmarkError::Filesystem { path, source });
                break;
            }
        }
        db::mark_video_not_downloaded(&tx, video.id)?;
        report.videos_cleared += 1;
    }

    db::mark_tweet_content_not_downloaded(&tx, tweet_id)?;
    tx.commit()?;
    match failure {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

/// Resolves a recorded filename inside `media_dir`. Anything but a plain file
/// name is refused so a bad row cannot reach outside the media directory.
fn media_path(media_dir: &Path, local_filename: &str) -> Result<PathBuf, UnmarkError> {
    let mut components = Path::new(local_filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(media_dir.join(local_filename)),
        _ => Err(UnmarkError::Filesystem {
            path: PathBuf::from(local_filename),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "recorded filename is not a plain name inside the media directory",
            ),
        }),
    }
}
