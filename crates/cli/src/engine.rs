//! Feed engine that ties together the user table, the post table and the
//! ranking heaps.
use hashmap::OpenHashMap;
use heap::MaxHeap;

use crate::command::Command;
use crate::error::{CommandError, Rejection};
use crate::model::{FeedOrder, Post, PostId, RankedPost, User, UserId};

/// Prefix every user id must carry where ids are syntactically constrained.
pub const USER_ID_PREFIX: &str = "user";

/// Result of a `generate_feed` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub entries: Vec<RankedPost>,
    /// `true` if the candidates ran out before the requested count.
    pub exhausted: bool,
}

/// One post extracted while scrolling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollStep {
    pub post: PostId,
    pub liked: bool,
}

/// Result of a `scroll_through_feed` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scroll {
    pub steps: Vec<ScrollStep>,
    pub exhausted: bool,
}

/// Result of a `sort_posts` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortedPosts {
    NoPosts,
    Ranked(Vec<RankedPost>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeToggle {
    Liked,
    Unliked,
}

/// The processing context: every user and post known to this run.
///
/// # Command Path
///
/// 1. Validate every precondition of the command against the tables.
/// 2. Apply the mutation (if any) to users and posts.
/// 3. Report a typed outcome; [`FeedEngine::execute`] renders it as
///    transcript lines.
///
/// A rejected command leaves both tables untouched.
///
/// # Ranking
///
/// Feeds are never cached. Each request collects the unseen posts of every
/// followed user, heapifies them under [`FeedOrder`] and extracts the
/// maximum up to the requested count.
#[derive(Debug, Default)]
pub struct FeedEngine {
    users: OpenHashMap<UserId, User>,
    posts: OpenHashMap<PostId, Post>,
}

impl FeedEngine {
    /// Creates an engine with no users or posts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a user by id.
    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    /// Looks up a post by id.
    pub fn post(&self, id: &str) -> Option<&Post> {
        self.posts.get(id)
    }

    /// Registers a new user. The id must start with `user` and be unused.
    pub fn create_user(&mut self, id: &str) -> Result<(), Rejection> {
        check_prefix(id)?;
        if self.users.contains_key(id) {
            return Err(Rejection::DuplicateUser(id.to_string()));
        }
        self.users.insert(id.to_string(), User::new(id.to_string()));
        Ok(())
    }

    /// Makes `follower` follow `followee`. Both must exist and differ.
    pub fn follow_user(&mut self, follower: &str, followee: &str) -> Result<(), Rejection> {
        self.check_pair(follower, followee)?;
        let user = self.user_mut(follower)?;
        if user.is_following(followee) {
            return Err(Rejection::AlreadyFollowing {
                follower: follower.to_string(),
                followee: followee.to_string(),
            });
        }
        user.follow(followee);
        Ok(())
    }

    /// Makes `follower` stop following `followee`.
    pub fn unfollow_user(&mut self, follower: &str, followee: &str) -> Result<(), Rejection> {
        self.check_pair(follower, followee)?;
        let user = self.user_mut(follower)?;
        if !user.is_following(followee) {
            return Err(Rejection::NotFollowing {
                follower: follower.to_string(),
                followee: followee.to_string(),
            });
        }
        user.unfollow(followee);
        Ok(())
    }

    /// Publishes a new post authored by `user`.
    pub fn create_post(&mut self, user: &str, post: &str, content: &str) -> Result<(), Rejection> {
        if self.posts.contains_key(post) {
            return Err(Rejection::DuplicatePost(post.to_string()));
        }
        let author = self.user_mut(user)?;
        author.create_post(post.to_string());
        self.posts.insert(
            post.to_string(),
            Post::new(post.to_string(), user.to_string(), content.to_string()),
        );
        tracing::trace!(user, post, content, "post created");
        Ok(())
    }

    /// Marks an existing post as seen by `user`.
    pub fn see_post(&mut self, user: &str, post: &str) -> Result<(), Rejection> {
        self.require_post(post)?;
        self.user_mut(user)?.see(post);
        Ok(())
    }

    /// Marks every post `viewed` has authored so far as seen by `viewer`.
    pub fn see_all_posts_from_user(&mut self, viewer: &str, viewed: &str) -> Result<(), Rejection> {
        self.require_user(viewer)?;
        let authored: Vec<PostId> = self.require_user(viewed)?.authored_posts().cloned().collect();
        self.user_mut(viewer)?.see_all_posts(&authored);
        Ok(())
    }

    /// Likes `post` if `user` has not liked it yet, otherwise withdraws the like.
    pub fn toggle_like(&mut self, user: &str, post: &str) -> Result<LikeToggle, Rejection> {
        let Self { users, posts } = self;
        let user = users
            .get_mut(user)
            .ok_or_else(|| Rejection::UnknownUser(user.to_string()))?;
        let post = posts
            .get_mut(post)
            .ok_or_else(|| Rejection::UnknownPost(post.to_string()))?;

        if user.has_liked_post(post.id()) {
            user.unlike(post);
            Ok(LikeToggle::Unliked)
        } else {
            user.like(post);
            Ok(LikeToggle::Liked)
        }
    }

    /// Ranks up to `count` unseen posts from the users `user` follows.
    pub fn generate_feed(&self, user: &str, count: usize) -> Result<Feed, Rejection> {
        let mut heap = self.feed_heap(self.require_user(user)?);
        let mut entries = Vec::with_capacity(count.min(heap.len()));
        for _ in 0..count {
            match heap.delete_max() {
                Some(post) => entries.push(post),
                None => {
                    return Ok(Feed {
                        entries,
                        exhausted: true,
                    })
                }
            }
        }
        Ok(Feed {
            entries,
            exhausted: false,
        })
    }

    /// Walks the feed like [`generate_feed`](Self::generate_feed), marking
    /// each extracted post seen. `likes[i]` decides whether the i-th
    /// extracted post is also liked; a missing flag means no like.
    pub fn scroll_through_feed(
        &mut self,
        user: &str,
        count: usize,
        likes: &[bool],
    ) -> Result<Scroll, Rejection> {
        let mut heap = self.feed_heap(self.require_user(user)?);

        let Self { users, posts } = self;
        let user = users
            .get_mut(user)
            .ok_or_else(|| Rejection::UnknownUser(user.to_string()))?;

        let mut steps = Vec::with_capacity(count.min(heap.len()));
        for _ in 0..count {
            let Some(ranked) = heap.delete_max() else {
                return Ok(Scroll {
                    steps,
                    exhausted: true,
                });
            };
            let liked = likes.get(steps.len()).copied().unwrap_or(false);
            user.see(&ranked.id);
            if liked {
                if let Some(post) = posts.get_mut(&ranked.id) {
                    user.like(post);
                }
            }
            steps.push(ScrollStep {
                post: ranked.id,
                liked,
            });
        }
        Ok(Scroll {
            steps,
            exhausted: false,
        })
    }

    /// Ranks every post `user` has authored, greatest first.
    pub fn sort_posts(&self, user: &str) -> Result<SortedPosts, Rejection> {
        let user = self.require_user(user)?;
        if user.post_count() == 0 {
            return Ok(SortedPosts::NoPosts);
        }
        let ranked: Vec<RankedPost> = user
            .authored_posts()
            .filter_map(|id| self.posts.get(id))
            .map(Post::rank)
            .collect();
        let heap = MaxHeap::from_vec_with_order(ranked, FeedOrder);
        Ok(SortedPosts::Ranked(heap.into_sorted_iter().collect()))
    }

    /// Runs one command and renders its transcript lines.
    pub fn execute(&mut self, cmd: &Command) -> Result<Vec<String>, CommandError> {
        self.apply(cmd).map_err(|reason| CommandError {
            verb: cmd.verb(),
            reason,
        })
    }

    fn apply(&mut self, cmd: &Command) -> Result<Vec<String>, Rejection> {
        let lines = match cmd {
            Command::CreateUser { user } => {
                self.create_user(user)?;
                vec![format!("Created user with Id {}.", user)]
            }
            Command::FollowUser { follower, followee } => {
                self.follow_user(follower, followee)?;
                vec![format!("{} followed {}.", follower, followee)]
            }
            Command::UnfollowUser { follower, followee } => {
                self.unfollow_user(follower, followee)?;
                vec![format!("{} unfollowed {}.", follower, followee)]
            }
            Command::CreatePost {
                user,
                post,
                content,
            } => {
                self.create_post(user, post, content)?;
                vec![format!("{} created a post with Id {}.", user, post)]
            }
            Command::SeePost { user, post } => {
                self.see_post(user, post)?;
                vec![format!("{} saw {}.", user, post)]
            }
            Command::SeeAllPostsFromUser { viewer, viewed } => {
                self.see_all_posts_from_user(viewer, viewed)?;
                vec![format!("{} saw all posts of {}.", viewer, viewed)]
            }
            Command::ToggleLike { user, post } => match self.toggle_like(user, post)? {
                LikeToggle::Liked => vec![format!("{} liked {}.", user, post)],
                LikeToggle::Unliked => vec![format!("{} unliked {}.", user, post)],
            },
            Command::GenerateFeed { user, count } => {
                let feed = self.generate_feed(user, *count)?;
                let mut lines = vec![format!("Feed for {}:", user)];
                lines.extend(feed.entries.iter().map(|p| {
                    format!("Post ID: {}, Author: {}, Likes: {}", p.id, p.author, p.likes)
                }));
                if feed.exhausted {
                    lines.push(format!("No more posts available for {}.", user));
                }
                lines
            }
            Command::ScrollThroughFeed { user, count, likes } => {
                let scroll = self.scroll_through_feed(user, *count, likes)?;
                let mut lines = vec![format!("{} is scrolling through feed:", user)];
                lines.extend(scroll.steps.iter().map(|step| {
                    if step.liked {
                        format!(
                            "{} saw {} while scrolling and clicked the like button.",
                            user, step.post
                        )
                    } else {
                        format!("{} saw {} while scrolling.", user, step.post)
                    }
                }));
                if scroll.exhausted {
                    lines.push("No more posts in feed.".to_string());
                }
                lines
            }
            Command::SortPosts { user } => match self.sort_posts(user)? {
                SortedPosts::NoPosts => vec![format!("No posts from {}.", user)],
                SortedPosts::Ranked(posts) => {
                    let mut lines = vec![format!("Sorting {}'s posts:", user)];
                    lines.extend(
                        posts
                            .iter()
                            .map(|p| format!("{}, Likes: {}", p.id, p.likes)),
                    );
                    lines
                }
            },
        };
        Ok(lines)
    }

    /// Heapifies the posts of every followed user that `user` has not seen.
    fn feed_heap(&self, user: &User) -> MaxHeap<RankedPost, FeedOrder> {
        let candidates: Vec<RankedPost> = user
            .followings()
            .filter_map(|id| self.users.get(id))
            .flat_map(|followed| followed.authored_posts())
            .filter(|id| !user.has_seen_post(id))
            .filter_map(|id| self.posts.get(id))
            .map(Post::rank)
            .collect();
        tracing::trace!(user = user.id(), candidates = candidates.len(), "feed heap built");
        MaxHeap::from_vec_with_order(candidates, FeedOrder)
    }

    fn require_user(&self, id: &str) -> Result<&User, Rejection> {
        self.users
            .get(id)
            .ok_or_else(|| Rejection::UnknownUser(id.to_string()))
    }

    fn user_mut(&mut self, id: &str) -> Result<&mut User, Rejection> {
        self.users
            .get_mut(id)
            .ok_or_else(|| Rejection::UnknownUser(id.to_string()))
    }

    fn require_post(&self, id: &str) -> Result<&Post, Rejection> {
        self.posts
            .get(id)
            .ok_or_else(|| Rejection::UnknownPost(id.to_string()))
    }

    /// Shared checks of `follow_user` / `unfollow_user`.
    fn check_pair(&self, a: &str, b: &str) -> Result<(), Rejection> {
        check_prefix(a)?;
        check_prefix(b)?;
        self.require_user(a)?;
        self.require_user(b)?;
        if a == b {
            return Err(Rejection::SelfReference(a.to_string()));
        }
        Ok(())
    }
}

fn check_prefix(id: &str) -> Result<(), Rejection> {
    if id.starts_with(USER_ID_PREFIX) {
        Ok(())
    } else {
        Err(Rejection::InvalidUserId(id.to_string()))
    }
}
