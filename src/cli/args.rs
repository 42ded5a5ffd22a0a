//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, UserMode};

/// Douyin bulk downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "douyin-downloader",
    version,
    about = "Bulk download videos, image sets and audio from Douyin share links",
    long_about = "A CLI tool to batch download media referenced by Douyin share links.\n\n\
                  Supports single posts, user profiles (posts/likes/collections), \
                  collections and music pages, with incremental re-runs."
)]
pub struct Args {
    /// Share link, profile URL or raw item id. Repeatable.
    #[arg(short, long = "link", num_args = 1..)]
    pub link: Vec<String>,

    /// Base directory for downloads.
    #[arg(short, long)]
    pub path: Option<PathBuf>,

    /// Download the music track of each item (true/false).
    #[arg(short, long)]
    pub music: Option<bool>,

    /// Download video covers (true/false).
    #[arg(short, long)]
    pub cover: Option<bool>,

    /// Download author avatars (true/false).
    #[arg(short, long)]
    pub avatar: Option<bool>,

    /// Save the metadata snapshot next to the media (true/false).
    #[arg(short, long)]
    pub json: Option<bool>,

    /// One folder per item instead of a flat author folder (true/false).
    #[arg(long)]
    pub folderstyle: Option<bool>,

    /// Profile mode: post, like or mix. Repeatable.
    #[arg(short = 'M', long = "mode")]
    pub mode: Vec<UserMode>,

    /// Number of profile posts to download (0 = all).
    #[arg(long)]
    pub postnumber: Option<u64>,

    /// Number of liked posts to download (0 = all).
    #[arg(long)]
    pub likenumber: Option<u64>,

    /// Number of profile collections to enumerate (0 = all).
    #[arg(long)]
    pub allmixnumber: Option<u64>,

    /// Number of items per collection (0 = all).
    #[arg(long)]
    pub mixnumber: Option<u64>,

    /// Number of items per music page (0 = all).
    #[arg(long)]
    pub musicnumber: Option<u64>,

    /// Keep the acquisition ledger (true/false). Incremental mode needs it.
    #[arg(short, long)]
    pub database: Option<bool>,

    /// Incremental download for profile posts (true/false).
    #[arg(long)]
    pub postincrease: Option<bool>,

    /// Incremental download for profile likes (true/false).
    #[arg(long)]
    pub likeincrease: Option<bool>,

    /// Incremental download inside collections (true/false).
    #[arg(long)]
    pub mixincrease: Option<bool>,

    /// Incremental download under music pages (true/false).
    #[arg(long)]
    pub musicincrease: Option<bool>,

    /// Download worker pool width.
    #[arg(short, long)]
    pub thread: Option<usize>,

    /// Cookie string: "name1=value1; name2=value2".
    #[arg(long, env = "DOUYIN_COOKIE")]
    pub cookie: Option<String>,

    /// Only items created on or after this date (YYYY-MM-DD).
    #[arg(long)]
    pub start_time: Option<String>,

    /// Only items created on or before this date (YYYY-MM-DD).
    #[arg(long)]
    pub end_time: Option<String>,

    /// Path to configuration file.
    #[arg(short = 'F', long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if !self.link.is_empty() {
            config.link = self.link;
        }

        if let Some(path) = self.path {
            config.options.path = Some(path);
        }

        if let Some(music) = self.music {
            config.options.music = music;
        }
        if let Some(cover) = self.cover {
            config.options.cover = cover;
        }
        if let Some(avatar) = self.avatar {
            config.options.avatar = avatar;
        }
        if let Some(json) = self.json {
            config.options.json = json;
        }
        if let Some(folderstyle) = self.folderstyle {
            config.options.folderstyle = folderstyle;
        }

        if !self.mode.is_empty() {
            config.options.mode = self.mode;
        }

        if let Some(n) = self.postnumber {
            config.number.post = n;
        }
        if let Some(n) = self.likenumber {
            config.number.like = n;
        }
        if let Some(n) = self.allmixnumber {
            config.number.allmix = n;
        }
        if let Some(n) = self.mixnumber {
            config.number.mix = n;
        }
        if let Some(n) = self.musicnumber {
            config.number.music = n;
        }

        if let Some(database) = self.database {
            config.options.database = database;
        }

        if let Some(inc) = self.postincrease {
            config.increase.post = inc;
        }
        if let Some(inc) = self.likeincrease {
            config.increase.like = inc;
        }
        if let Some(inc) = self.mixincrease {
            config.increase.mix = inc;
        }
        if let Some(inc) = self.musicincrease {
            config.increase.music = inc;
        }

        if let Some(thread) = self.thread {
            config.options.thread = thread;
        }

        if let Some(cookie) = self.cookie {
            if !cookie.trim().is_empty() {
                config.account.cookie = Some(cookie);
            }
        }

        if let Some(start) = self.start_time {
            config.options.start_time = Some(start);
        }
        if let Some(end) = self.end_time {
            config.options.end_time = Some(end);
        }
    }
}
