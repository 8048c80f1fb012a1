//! Parsing of transcript input lines into [`Command`]s.
//!
//! A line is split on whitespace; the first token is the verb and the rest
//! are positional arguments. Extra trailing arguments are ignored, except for
//! `create_post` (the content is the rest of the line) and
//! `scroll_through_feed` (each trailing token is a like flag).

use std::str::SplitWhitespace;

use crate::error::ParseError;
use crate::model::{PostId, UserId};

// Command verbs as they appear at the start of an input line.
pub const CREATE_USER: &str = "create_user";
pub const FOLLOW_USER: &str = "follow_user";
pub const UNFOLLOW_USER: &str = "unfollow_user";
pub const CREATE_POST: &str = "create_post";
pub const SEE_POST: &str = "see_post";
pub const SEE_ALL_POSTS_FROM_USER: &str = "see_all_posts_from_user";
pub const TOGGLE_LIKE: &str = "toggle_like";
pub const GENERATE_FEED: &str = "generate_feed";
pub const SCROLL_THROUGH_FEED: &str = "scroll_through_feed";
pub const SORT_POSTS: &str = "sort_posts";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateUser {
        user: UserId,
    },
    FollowUser {
        follower: UserId,
        followee: UserId,
    },
    UnfollowUser {
        follower: UserId,
        followee: UserId,
    },
    CreatePost {
        user: UserId,
        post: PostId,
        content: String,
    },
    SeePost {
        user: UserId,
        post: PostId,
    },
    SeeAllPostsFromUser {
        viewer: UserId,
        viewed: UserId,
    },
    ToggleLike {
        user: UserId,
        post: PostId,
    },
    GenerateFeed {
        user: UserId,
        count: usize,
    },
    /// `likes[i]` applies to the i-th post actually extracted from the feed.
    ScrollThroughFeed {
        user: UserId,
        count: usize,
        likes: Vec<bool>,
    },
    SortPosts {
        user: UserId,
    },
}

impl Command {
    /// Parses one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut tokens = line.split_whitespace();
        let Some(verb) = tokens.next() else {
            return Ok(None);
        };

        let cmd = match verb {
            CREATE_USER => {
                let mut args = Args::new(CREATE_USER, tokens);
                Command::CreateUser { user: args.id()? }
            }
            FOLLOW_USER => {
                let mut args = Args::new(FOLLOW_USER, tokens);
                Command::FollowUser {
                    follower: args.id()?,
                    followee: args.id()?,
                }
            }
            UNFOLLOW_USER => {
                let mut args = Args::new(UNFOLLOW_USER, tokens);
                Command::UnfollowUser {
                    follower: args.id()?,
                    followee: args.id()?,
                }
            }
            CREATE_POST => {
                let mut args = Args::new(CREATE_POST, tokens);
                Command::CreatePost {
                    user: args.id()?,
                    post: args.id()?,
                    content: args.rest()?,
                }
            }
            SEE_POST => {
                let mut args = Args::new(SEE_POST, tokens);
                Command::SeePost {
                    user: args.id()?,
                    post: args.id()?,
                }
            }
            SEE_ALL_POSTS_FROM_USER => {
                let mut args = Args::new(SEE_ALL_POSTS_FROM_USER, tokens);
                Command::SeeAllPostsFromUser {
                    viewer: args.id()?,
                    viewed: args.id()?,
                }
            }
            TOGGLE_LIKE => {
                let mut args = Args::new(TOGGLE_LIKE, tokens);
                Command::ToggleLike {
                    user: args.id()?,
                    post: args.id()?,
                }
            }
            GENERATE_FEED => {
                let mut args = Args::new(GENERATE_FEED, tokens);
                Command::GenerateFeed {
                    user: args.id()?,
                    count: args.count()?,
                }
            }
            SCROLL_THROUGH_FEED => {
                let mut args = Args::new(SCROLL_THROUGH_FEED, tokens);
                let user = args.id()?;
                let count = args.count()?;
                let likes = args.flags();
                Command::ScrollThroughFeed { user, count, likes }
            }
            SORT_POSTS => {
                let mut args = Args::new(SORT_POSTS, tokens);
                Command::SortPosts { user: args.id()? }
            }
            other => return Err(ParseError::UnknownVerb(other.to_string())),
        };
        Ok(Some(cmd))
    }

    /// The verb this command was parsed from.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::CreateUser { .. } => CREATE_USER,
            Command::FollowUser { .. } => FOLLOW_USER,
            Command::UnfollowUser { .. } => UNFOLLOW_USER,
            Command::CreatePost { .. } => CREATE_POST,
            Command::SeePost { .. } => SEE_POST,
            Command::SeeAllPostsFromUser { .. } => SEE_ALL_POSTS_FROM_USER,
            Command::ToggleLike { .. } => TOGGLE_LIKE,
            Command::GenerateFeed { .. } => GENERATE_FEED,
            Command::ScrollThroughFeed { .. } => SCROLL_THROUGH_FEED,
            Command::SortPosts { .. } => SORT_POSTS,
        }
    }
}

/// Positional argument reader for a single line.
struct Args<'a> {
    verb: &'static str,
    tokens: SplitWhitespace<'a>,
    position: usize,
}

impl<'a> Args<'a> {
    fn new(verb: &'static str, tokens: SplitWhitespace<'a>) -> Self {
        Self {
            verb,
            tokens,
            position: 0,
        }
    }

    fn take(&mut self) -> Result<&'a str, ParseError> {
        self.position += 1;
        self.tokens.next().ok_or(ParseError::MissingArgument {
            verb: self.verb,
            position: self.position,
        })
    }

    fn id(&mut self) -> Result<String, ParseError> {
        self.take().map(str::to_string)
    }

    /// A signed count; anything below one means zero extractions.
    fn count(&mut self) -> Result<usize, ParseError> {
        let token = self.take()?;
        let n = number(self.verb, token)?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    /// Every remaining token as a like flag. Only a token parsing to `1` means
    /// "like"; any other token, numeric or not, means "no like".
    fn flags(&mut self) -> Vec<bool> {
        self.tokens
            .by_ref()
            .map(|token| token.parse::<i64>() == Ok(1))
            .collect()
    }

    /// The remaining tokens joined by single spaces. At least one is required.
    fn rest(&mut self) -> Result<String, ParseError> {
        let first = self.take()?;
        let mut rest = first.to_string();
        for token in self.tokens.by_ref() {
            rest.push(' ');
            rest.push_str(token);
        }
        Ok(rest)
    }
}

fn number(verb: &'static str, token: &str) -> Result<i64, ParseError> {
    token.parse().map_err(|_| ParseError::InvalidNumber {
        verb,
        value: token.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("   \t ").unwrap(), None);
    }

    #[test]
    fn parses_every_verb() {
        assert_eq!(
            parse("create_user user1"),
            Command::CreateUser {
                user: "user1".into()
            }
        );
        assert_eq!(
            parse("follow_user user1 user2"),
            Command::FollowUser {
                follower: "user1".into(),
                followee: "user2".into()
            }
        );
        assert_eq!(
            parse("unfollow_user user1 user2"),
            Command::UnfollowUser {
                follower: "user1".into(),
                followee: "user2".into()
            }
        );
        assert_eq!(
            parse("see_post user1 post1"),
            Command::SeePost {
                user: "user1".into(),
                post: "post1".into()
            }
        );
        assert_eq!(
            parse("see_all_posts_from_user user1 user2"),
            Command::SeeAllPostsFromUser {
                viewer: "user1".into(),
                viewed: "user2".into()
            }
        );
        assert_eq!(
            parse("toggle_like user1 post1"),
            Command::ToggleLike {
                user: "user1".into(),
                post: "post1".into()
            }
        );
        assert_eq!(
            parse("generate_feed user1 5"),
            Command::GenerateFeed {
                user: "user1".into(),
                count: 5
            }
        );
        assert_eq!(
            parse("sort_posts user1"),
            Command::SortPosts {
                user: "user1".into()
            }
        );
    }

    #[test]
    fn create_post_content_takes_rest_of_line() {
        assert_eq!(
            parse("create_post user1 post1 hello   big world"),
            Command::CreatePost {
                user: "user1".into(),
                post: "post1".into(),
                content: "hello big world".into()
            }
        );
    }

    #[test]
    fn create_post_requires_content() {
        assert_eq!(
            Command::parse("create_post user1 post1"),
            Err(ParseError::MissingArgument {
                verb: CREATE_POST,
                position: 3
            })
        );
    }

    #[test]
    fn scroll_collects_flags() {
        assert_eq!(
            parse("scroll_through_feed user1 3 1 0 1"),
            Command::ScrollThroughFeed {
                user: "user1".into(),
                count: 3,
                likes: vec![true, false, true]
            }
        );
    }

    #[test]
    fn scroll_flags_other_than_one_mean_no_like() {
        match parse("scroll_through_feed user1 2 2 -1") {
            Command::ScrollThroughFeed { likes, .. } => assert_eq!(likes, vec![false, false]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn negative_count_means_zero() {
        assert_eq!(
            parse("generate_feed user1 -4"),
            Command::GenerateFeed {
                user: "user1".into(),
                count: 0
            }
        );
    }

    #[test]
    fn non_numeric_count_is_rejected() {
        assert_eq!(
            Command::parse("generate_feed user1 many"),
            Err(ParseError::InvalidNumber {
                verb: GENERATE_FEED,
                value: "many".into()
            })
        );
    }

    #[test]
    fn scroll_flags_never_reject_the_line() {
        assert_eq!(
            parse("scroll_through_feed user1 1 1 x"),
            Command::ScrollThroughFeed {
                user: "user1".into(),
                count: 1,
                likes: vec![true, false]
            }
        );
        match parse("scroll_through_feed user1 2 yes 01") {
            Command::ScrollThroughFeed { likes, .. } => assert_eq!(likes, vec![false, true]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_argument_reports_position() {
        assert_eq!(
            Command::parse("follow_user user1"),
            Err(ParseError::MissingArgument {
                verb: FOLLOW_USER,
                position: 2
            })
        );
    }

    #[test]
    fn unknown_verb() {
        assert_eq!(
            Command::parse("delete_user user1"),
            Err(ParseError::UnknownVerb("delete_user".into()))
        );
    }

    #[test]
    fn verb_round_trips_through_parse() {
        for line in [
            "create_user user1",
            "scroll_through_feed user1 0",
            "create_post user1 p c",
        ] {
            let verb = line.split_whitespace().next().unwrap();
            assert_eq!(parse(line).verb(), verb);
        }
    }
}
