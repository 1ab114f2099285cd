//! FILENAME: app/src/comments.rs
//! PURPOSE: Threaded comments attached to grid rows.
//! CONTEXT: A row can carry several threads. Each thread has replies, a
//! resolution status and pre-parsed user mentions (the editor does the
//! parsing; we only store the result). Threads are keyed by row id.

use crate::error::{TableError, TableResult};
use chrono::Utc;
use engine::RowId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// TYPES
// ============================================================================

/// A mention within a comment's rich content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentMention {
    /// The email of the mentioned user
    pub email: String,
    /// The display name of the mentioned user
    pub name: String,
    /// Start index in the rich content string
    pub start_index: usize,
    /// Length of the mention placeholder in the rich content
    pub length: usize,
}

/// Content type of a comment or reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum CommentContentType {
    Plain,
    /// Content with user mentions
    Mention,
}

impl CommentContentType {
    fn for_mentions(mentions: &[CommentMention]) -> Self {
        if mentions.is_empty() {
            CommentContentType::Plain
        } else {
            CommentContentType::Mention
        }
    }
}

/// Body shared by new comments, replies and edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub content: String,
    /// Rich content with mention placeholders
    pub rich_content: Option<String>,
    pub mentions: Vec<CommentMention>,
}

impl CommentBody {
    pub fn plain(content: &str) -> Self {
        CommentBody {
            content: content.to_string(),
            ..Default::default()
        }
    }

    pub fn with_mentions(content: &str, rich_content: &str, mentions: Vec<CommentMention>) -> Self {
        CommentBody {
            content: content.to_string(),
            rich_content: Some(rich_content.to_string()),
            mentions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub email: String,
    pub name: String,
}

impl Author {
    pub fn new(email: &str, name: &str) -> Self {
        Author {
            email: email.to_string(),
            name: name.to_string(),
        }
    }
}

/// A reply to a comment thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentReply {
    pub id: String,
    pub author_email: String,
    pub author_name: String,
    pub content: String,
    pub rich_content: Option<String>,
    pub mentions: Vec<CommentMention>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub modified_at: Option<String>,
}

/// A comment thread attached to a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub row_id: RowId,
    pub author_email: String,
    pub author_name: String,
    pub content: String,
    pub rich_content: Option<String>,
    pub content_type: CommentContentType,
    pub mentions: Vec<CommentMention>,
    /// Whether the thread is resolved
    pub resolved: bool,
    pub replies: Vec<CommentReply>,
    /// Creation timestamp (RFC 3339)
    pub created_at: String,
    pub modified_at: Option<String>,
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

impl Comment {
    pub fn new(row_id: RowId, author: &Author, body: CommentBody) -> Self {
        Comment {
            id: Uuid::new_v4().to_string(),
            row_id,
            author_email: author.email.clone(),
            author_name: author.name.clone(),
            content_type: CommentContentType::for_mentions(&body.mentions),
            content: body.content,
            rich_content: body.rich_content,
            mentions: body.mentions,
            resolved: false,
            replies: Vec::new(),
            created_at: now(),
            modified_at: None,
        }
    }

    /// Replaces content, rich content and mentions together.
    pub fn update_content(&mut self, body: CommentBody) {
        self.content_type = CommentContentType::for_mentions(&body.mentions);
        self.content = body.content;
        self.rich_content = body.rich_content;
        self.mentions = body.mentions;
        self.modified_at = Some(now());
    }

    pub fn add_reply(&mut self, reply: CommentReply) {
        self.replies.push(reply);
        self.modified_at = Some(now());
    }
}

impl CommentReply {
    pub fn new(author: &Author, body: CommentBody) -> Self {
        CommentReply {
            id: Uuid::new_v4().to_string(),
            author_email: author.email.clone(),
            author_name: author.name.clone(),
            content: body.content,
            rich_content: body.rich_content,
            mentions: body.mentions,
            created_at: now(),
            modified_at: None,
        }
    }

    pub fn update_content(&mut self, body: CommentBody) {
        self.content = body.content;
        self.rich_content = body.rich_content;
        self.mentions = body.mentions;
        self.modified_at = Some(now());
    }
}

/// Per-row badge information.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentIndicator {
    pub row_id: RowId,
    pub thread_count: usize,
    pub unresolved_count: usize,
    pub reply_count: usize,
}

// ============================================================================
// STORE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    threads: BTreeMap<RowId, Vec<Comment>>,
}

impl CommentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_mut(&mut self, comment_id: &str) -> TableResult<&mut Comment> {
        self.threads
            .values_mut()
            .flat_map(|comments| comments.iter_mut())
            .find(|c| c.id == comment_id)
            .ok_or_else(|| TableError::CommentNotFound(comment_id.to_string()))
    }

    /// Starts a new thread on `row_id`.
    pub fn add_comment(&mut self, row_id: RowId, author: &Author, body: CommentBody) -> Comment {
        let comment = Comment::new(row_id.clone(), author, body);
        self.threads.entry(row_id).or_default().push(comment.clone());
        comment
    }

    pub fn update_comment(&mut self, comment_id: &str, body: CommentBody) -> TableResult<Comment> {
        let comment = self.find_mut(comment_id)?;
        comment.update_content(body);
        Ok(comment.clone())
    }

    /// Deletes a thread and all its replies.
    pub fn delete_comment(&mut self, comment_id: &str) -> TableResult<Comment> {
        let not_found = || TableError::CommentNotFound(comment_id.to_string());
        let (row_id, index) = self
            .threads
            .iter()
            .find_map(|(row_id, comments)| {
                comments
                    .iter()
                    .position(|c| c.id == comment_id)
                    .map(|i| (row_id.clone(), i))
            })
            .ok_or_else(not_found)?;
        let comments = self.threads.get_mut(&row_id).ok_or_else(not_found)?;
        let removed = comments.remove(index);
        if comments.is_empty() {
            self.threads.remove(&row_id);
        }
        Ok(removed)
    }

    /// Resolves (`true`) or reopens (`false`) a thread.
    pub fn resolve_comment(&mut self, comment_id: &str, resolved: bool) -> TableResult<Comment> {
        let comment = self.find_mut(comment_id)?;
        comment.resolved = resolved;
        comment.modified_at = Some(now());
        Ok(comment.clone())
    }

    pub fn add_reply(&mut self, comment_id: &str, author: &Author, body: CommentBody) -> TableResult<CommentReply> {
        let comment = self.find_mut(comment_id)?;
        let reply = CommentReply::new(author, body);
        comment.add_reply(reply.clone());
        Ok(reply)
    }

    pub fn update_reply(&mut self, comment_id: &str, reply_id: &str, body: CommentBody) -> TableResult<CommentReply> {
        let comment = self.find_mut(comment_id)?;
        let reply = comment
            .replies
            .iter_mut()
            .find(|r| r.id == reply_id)
            .ok_or_else(|| TableError::ReplyNotFound(reply_id.to_string()))?;
        reply.update_content(body);
        Ok(reply.clone())
    }

    pub fn delete_reply(&mut self, comment_id: &str, reply_id: &str) -> TableResult<CommentReply> {
        let comment = self.find_mut(comment_id)?;
        let index = comment
            .replies
            .iter()
            .position(|r| r.id == reply_id)
            .ok_or_else(|| TableError::ReplyNotFound(reply_id.to_string()))?;
        let removed = comment.replies.remove(index);
        comment.modified_at = Some(now());
        Ok(removed)
    }

    pub fn get_comment(&self, comment_id: &str) -> Option<&Comment> {
        self.threads.values().flatten().find(|c| c.id == comment_id)
    }

    /// Threads of one row, oldest first.
    pub fn comments_for_row(&self, row_id: &RowId) -> &[Comment] {
        self.threads.get(row_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn comment_count(&self, row_id: &RowId) -> usize {
        self.comments_for_row(row_id).len()
    }

    pub fn has_comments(&self, row_id: &RowId) -> bool {
        self.comment_count(row_id) > 0
    }

    pub fn total_count(&self) -> usize {
        self.threads.values().map(Vec::len).sum()
    }

    pub fn indicators(&self) -> Vec<CommentIndicator> {
        self.threads
            .iter()
            .map(|(row_id, comments)| CommentIndicator {
                row_id: row_id.clone(),
                thread_count: comments.len(),
                unresolved_count: comments.iter().filter(|c| !c.resolved).count(),
                reply_count: comments.iter().map(|c| c.replies.len()).sum(),
            })
            .collect()
    }

    /// Drops every thread on `row_id` (used after the row is deleted).
    pub fn clear_row(&mut self, row_id: &RowId) -> usize {
        self.threads.remove(row_id).map_or(0, |comments| comments.len())
    }

    pub fn clear_all(&mut self) -> usize {
        let count = self.total_count();
        self.threads.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Author {
        Author::new("alice@example.com", "Alice")
    }

    #[test]
    fn test_mentions_set_content_type() {
        let mut store = CommentStore::new();
        let mention = CommentMention {
            email: "bob@example.com".into(),
            name: "Bob".into(),
            start_index: 4,
            length: 6,
        };
        let c = store.add_comment(
            RowId::Int(1),
            &alice(),
            CommentBody::with_mentions("Hey Bob", "Hey @[0]", vec![mention]),
        );
        assert_eq!(c.content_type, CommentContentType::Mention);

        let edited = store.update_comment(&c.id, CommentBody::plain("Hey all")).unwrap();
        assert_eq!(edited.content_type, CommentContentType::Plain);
        assert!(edited.mentions.is_empty());
        assert!(edited.modified_at.is_some());
    }

    #[test]
    fn test_delete_last_thread_removes_row_entry() {
        let mut store = CommentStore::new();
        let c = store.add_comment(RowId::Int(1), &alice(), CommentBody::plain("x"));
        store.delete_comment(&c.id).unwrap();
        assert!(!store.has_comments(&RowId::Int(1)));
        assert!(store.indicators().is_empty());
    }
}
