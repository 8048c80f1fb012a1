//! Users and posts.
//!
//! Entities refer to each other by identifier only. The engine's user and
//! post tables own every entity; a post's author and a user's follow, seen
//! and liked sets are lookups into those tables.

use std::cmp::Ordering;

use hashmap::OpenHashMap;
use heap::{HeapOrder, MaxHeap};

/// Identifier of a user, e.g. `user1`.
pub type UserId = String;
/// Identifier of a post, e.g. `post1`.
pub type PostId = String;

/// A post and its live like count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    id: PostId,
    author: UserId,
    content: String,
    likes: u32,
}

impl Post {
    /// Creates a post with no likes.
    pub fn new(id: PostId, author: UserId, content: String) -> Self {
        Self {
            id,
            author,
            content,
            likes: 0,
        }
    }

    /// Returns the post identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the id of the user who wrote the post.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Returns the post text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the current like count.
    pub fn likes(&self) -> u32 {
        self.likes
    }

    /// Adds one like.
    pub fn increment_like(&mut self) {
        self.likes = self.likes.saturating_add(1);
    }

    /// Removes one like. Never goes below zero.
    pub fn decrement_like(&mut self) {
        self.likes = self.likes.saturating_sub(1);
    }

    /// Snapshot of the fields ranking depends on.
    pub fn rank(&self) -> RankedPost {
        RankedPost {
            likes: self.likes,
            id: self.id.clone(),
            author: self.author.clone(),
        }
    }
}

/// A post as it stood when a ranking heap was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPost {
    pub likes: u32,
    pub id: PostId,
    pub author: UserId,
}

/// Ranks posts by like count, then by identifier.
///
/// Under the max-heap, equal like counts surface the lexicographically
/// greater identifier first.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedOrder;

impl HeapOrder<RankedPost> for FeedOrder {
    fn compare(&self, a: &RankedPost, b: &RankedPost) -> Ordering {
        a.likes.cmp(&b.likes).then_with(|| a.id.cmp(&b.id))
    }
}

/// A user with their authored posts and per-user membership sets.
#[derive(Debug)]
pub struct User {
    id: UserId,
    /// Authored post ids. Posts enter with zero likes, so insertion rank is
    /// identifier order; live rankings are rebuilt from the post table.
    posts: MaxHeap<PostId>,
    followings: OpenHashMap<UserId, ()>,
    seen: OpenHashMap<PostId, ()>,
    liked: OpenHashMap<PostId, ()>,
}

impl User {
    /// Creates a user who follows nobody and has no posts.
    pub fn new(id: UserId) -> Self {
        Self {
            id,
            posts: MaxHeap::new(),
            followings: OpenHashMap::new(),
            seen: OpenHashMap::new(),
            liked: OpenHashMap::new(),
        }
    }

    /// Returns the user identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Starts following `user`.
    pub fn follow(&mut self, user: &str) {
        self.followings.insert(user.to_string(), ());
    }

    /// Stops following `user`.
    pub fn unfollow(&mut self, user: &str) {
        self.followings.remove(user);
    }

    /// Returns `true` if this user follows `user`.
    pub fn is_following(&self, user: &str) -> bool {
        self.followings.contains_key(user)
    }

    /// Iterates over followed user ids in no particular order.
    pub fn followings(&self) -> impl Iterator<Item = &UserId> {
        self.followings.keys()
    }

    /// Records `post` as authored by this user.
    pub fn create_post(&mut self, post: PostId) {
        self.posts.insert(post);
    }

    /// Authored post ids in heap storage order.
    pub fn authored_posts(&self) -> impl Iterator<Item = &PostId> {
        self.posts.iter()
    }

    /// Returns the number of authored posts.
    pub fn post_count(&self) -> usize {
        self.posts.len()
    }

    /// Marks `post` as seen.
    pub fn see(&mut self, post: &str) {
        self.seen.insert(post.to_string(), ());
    }

    /// Marks every given post as seen. Callers pass a snapshot of another
    /// user's authored posts.
    pub fn see_all_posts<'a, I>(&mut self, posts: I)
    where
        I: IntoIterator<Item = &'a PostId>,
    {
        for post in posts {
            self.see(post);
        }
    }

    /// Returns `true` if `post` has been seen.
    pub fn has_seen_post(&self, post: &str) -> bool {
        self.seen.contains_key(post)
    }

    /// Likes `post`, which also marks it seen.
    pub fn like(&mut self, post: &mut Post) {
        self.see(post.id());
        post.increment_like();
        self.liked.insert(post.id().to_string(), ());
    }

    /// Withdraws a like. The post stays seen.
    pub fn unlike(&mut self, post: &mut Post) {
        post.decrement_like();
        self.liked.remove(post.id());
    }

    /// Returns `true` if this user currently likes `post`.
    pub fn has_liked_post(&self, post: &str) -> bool {
        self.liked.contains_key(post)
    }
}
