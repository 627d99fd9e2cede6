//! Command topic parsing
//!
//! Inbound commands arrive as topic suffixes under a configured prefix:
//! ```text
//! <prefix>/start
//! <prefix>/stop
//! <prefix>/pulse/<ticks>
//! ```
//! Parsing strips the prefix and splits the remainder on `/`. Validation of the
//! resulting segments lives in [`crate::command`].

use std::fmt;

/// How the configured prefix is removed from an inbound topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicMatch {
    /// Strip `<prefix>/` only when the topic actually starts with it; any
    /// other topic is unrecognized
    #[default]
    Prefix,
    /// Remove the first occurrence of `<prefix>/` anywhere in the topic.
    /// Kept for compatibility with deployments that relied on it.
    Substring,
}

/// Ordered command segments; segment 0 is the verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPath(Vec<String>);

impl CommandPath {
    pub fn verb(&self) -> &str {
        // Never empty: split always yields at least one segment
        self.0.first().map(String::as_str).unwrap_or("")
    }

    pub fn args(&self) -> &[String] {
        self.0.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CommandPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

/// Strip the prefix from `topic` and split the remainder into a command path
///
/// In [`TopicMatch::Prefix`] mode a topic that does not start with the prefix
/// yields the unrecognized path `[""]`; in [`TopicMatch::Substring`] mode it is
/// split whole.
pub fn parse_topic(prefix: &str, topic: &str, mode: TopicMatch) -> CommandPath {
    let needle = format!("{}/", prefix);

    let suffix = match mode {
        TopicMatch::Prefix => match topic.strip_prefix(needle.as_str()) {
            Some(suffix) => suffix.to_string(),
            None => return CommandPath(vec![String::new()]),
        },
        TopicMatch::Substring => topic.replacen(needle.as_str(), "", 1),
    };

    CommandPath(suffix.split('/').map(str::to_string).collect())
}

/// Subscription filter that covers every command under `prefix`
pub fn command_filter(prefix: &str) -> String {
    format!("{}/#", prefix)
}

/// Match a topic against an MQTT filter with `+` and `#` wildcards
pub fn matches_filter(filter: &str, topic: &str) -> bool {
    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
