use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

const LATEST_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub(crate) struct Snippet {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) content: String,
    pub(crate) created: DateTime<Utc>,
    pub(crate) expires: DateTime<Utc>,
}

fn human_date(t: &DateTime<Utc>) -> String {
    t.format("%d %b %Y at %H:%M").to_string()
}

impl Snippet {
    pub(crate) fn human_created(&self) -> String {
        human_date(&self.created)
    }

    pub(crate) fn human_expires(&self) -> String {
        human_date(&self.expires)
    }

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Snippets kept in process memory. Expired snippets are never returned.
pub(crate) struct SnippetStore {
    snippets: RwLock<Vec<Snippet>>,
    next_id: AtomicI64,
}

impl Default for SnippetStore {
    fn default() -> Self {
        Self {
            snippets: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl SnippetStore {
    pub(crate) async fn insert(&self, title: &str, content: &str, expires_days: i64) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = Utc::now();
        self.snippets.write().await.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + Duration::days(expires_days),
        });
        tracing::debug!("Inserted snippet {id}");
        id
    }

    pub(crate) async fn get(&self, id: i64) -> Option<Snippet> {
        let now = Utc::now();
        self.snippets
            .read()
            .await
            .iter()
            .find(|s| s.id == id && s.is_live(now))
            .cloned()
    }

    /// Up to ten live snippets, newest first.
    pub(crate) async fn latest(&self) -> Vec<Snippet> {
        let now = Utc::now();
        self.snippets
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| s.is_live(now))
            .take(LATEST_LIMIT)
            .cloned()
            .collect()
    }

    pub(crate) async fn len(&self) -> usize {
        self.snippets.read().await.len()
    }
}
