//! SQLite-backed book store
//!
//! Every accessor call opens its own connection and releases it when the
//! call's scope ends, on success and failure alike. There is no pooling and
//! no shared transaction; SQLite serializes concurrent writers internally and
//! the busy timeout covers writer contention.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow};
use sqlx::{ConnectOptions, Row};
use std::path::Path;
use std::time::Duration;

use crate::metrics;

/// One book record as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub published: String,
    pub first_sentence: String,
}

/// Write payload for creating a book
///
/// `title` and `author` are required; the optional fields default to empty
/// strings, matching the stored representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub published: String,
    #[serde(default)]
    pub first_sentence: String,
}

/// Accessor mediating all reads and writes to the books table
#[derive(Debug, Clone)]
pub struct BookStore {
    options: SqliteConnectOptions,
}

impl BookStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        Self { options }
    }

    async fn connect(&self) -> Result<SqliteConnection, sqlx::Error> {
        self.options.connect().await
    }

    /// Apply the embedded migration set, creating the table if missing
    pub async fn migrate(&self) -> anyhow::Result<()> {
        use anyhow::Context;

        let mut conn = self.connect().await?;
        sqlx::migrate!("./migrations")
            .run(&mut conn)
            .await
            .context("Failed to run books database migrations")?;

        Ok(())
    }

    /// Fetch all books in the store's natural (insertion) order
    pub async fn list_all(&self) -> Result<Vec<Book>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query("SELECT id, title, author, published, first_sentence FROM books")
            .fetch_all(&mut conn)
            .await?;

        metrics::record_db_operation("read_all");
        Ok(rows.iter().map(book_from_row).collect())
    }

    /// Fetch one book by id; an absent row is `Ok(None)`, not an error
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Book>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(
            "SELECT id, title, author, published, first_sentence FROM books WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut conn)
        .await?;

        metrics::record_db_operation("read_one");
        Ok(row.as_ref().map(book_from_row))
    }

    /// Insert a book; the store assigns the id
    pub async fn insert(&self, book: &NewBook) -> Result<Book, sqlx::Error> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(
            "INSERT INTO books (title, author, published, first_sentence) VALUES (?, ?, ?, ?)",
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.published)
        .bind(&book.first_sentence)
        .execute(&mut conn)
        .await?;

        metrics::record_db_operation("create");
        Ok(Book {
            id: result.last_insert_rowid(),
            title: book.title.clone(),
            author: book.author.clone(),
            published: book.published.clone(),
            first_sentence: book.first_sentence.clone(),
        })
    }

    /// Fetch books matching a filter predicate with bound values
    ///
    /// The clause comes from the filter builder; only `?` placeholders and
    /// fixed column names reach the SQL text.
    pub async fn search(
        &self,
        where_clause: &str,
        params: &[String],
    ) -> Result<Vec<Book>, sqlx::Error> {
        let sql = format!(
            "SELECT id, title, author, published, first_sentence FROM books WHERE {}",
            where_clause
        );

        let mut conn = self.connect().await?;
        let mut query = sqlx::query(&sql);
        for value in params {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&mut conn).await?;

        metrics::record_db_operation("read_all");
        Ok(rows.iter().map(book_from_row).collect())
    }

    /// Fetch the lowest-id book, if any
    pub async fn first(&self) -> Result<Option<Book>, sqlx::Error> {
        let mut conn = self.connect().await?;
        let row = sqlx::query(
            "SELECT id, title, author, published, first_sentence FROM books ORDER BY id LIMIT 1",
        )
        .fetch_optional(&mut conn)
        .await?;

        metrics::record_db_operation("read_one");
        Ok(row.as_ref().map(book_from_row))
    }

    /// Count all books
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let mut conn = self.connect().await?;
        sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&mut conn)
            .await
    }
}

fn book_from_row(row: &SqliteRow) -> Book {
    // Externally seeded rows may hold NULL text columns; coerce to the
    // documented empty-string defaults.
    Book {
        id: row.get("id"),
        title: row.get::<Option<String>, _>("title").unwrap_or_default(),
        author: row.get::<Option<String>, _>("author").unwrap_or_default(),
        published: row.get::<Option<String>, _>("published").unwrap_or_default(),
        first_sentence: row
            .get::<Option<String>, _>("first_sentence")
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (BookStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = BookStore::new(dir.path().join("books.db"));
        store.migrate().await.unwrap();
        (store, dir)
    }

    fn sample_book(title: &str, author: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            published: String::new(),
            first_sentence: String::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let (store, _dir) = create_test_store().await;

        let first = store.insert(&sample_book("Dune", "Frank Herbert")).await.unwrap();
        let second = store.insert(&sample_book("Neuromancer", "William Gibson")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_get_by_id_returns_inserted_fields() {
        let (store, _dir) = create_test_store().await;

        let inserted = store
            .insert(&NewBook {
                title: "Dune".to_string(),
                author: "Frank Herbert".to_string(),
                published: "1965".to_string(),
                first_sentence: "In the week before their departure to Arrakis...".to_string(),
            })
            .await
            .unwrap();

        let fetched = store.get_by_id(inserted.id).await.unwrap().unwrap();
        assert_eq!(fetched, inserted);
    }

    #[tokio::test]
    async fn test_get_by_id_absent_is_none() {
        let (store, _dir) = create_test_store().await;
        assert_eq!(store.get_by_id(999_999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_list_all_preserves_insertion_order() {
        let (store, _dir) = create_test_store().await;

        store.insert(&sample_book("A", "First")).await.unwrap();
        store.insert(&sample_book("B", "Second")).await.unwrap();

        let books = store.list_all().await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].title, "A");
        assert_eq!(books[1].title, "B");
    }

    #[tokio::test]
    async fn test_search_binds_filter_values() {
        let (store, _dir) = create_test_store().await;

        store.insert(&sample_book("Dune", "Frank Herbert")).await.unwrap();
        store.insert(&sample_book("Dune Messiah", "Frank Herbert")).await.unwrap();
        store.insert(&sample_book("Neuromancer", "William Gibson")).await.unwrap();

        let books = store
            .search("author = ?", &["Frank Herbert".to_string()])
            .await
            .unwrap();

        assert_eq!(books.len(), 2);
        assert!(books.iter().all(|b| b.author == "Frank Herbert"));
    }

    #[tokio::test]
    async fn test_search_by_text_id_matches_integer_column() {
        let (store, _dir) = create_test_store().await;

        let inserted = store.insert(&sample_book("Dune", "Frank Herbert")).await.unwrap();

        let books = store
            .search("id = ?", &[inserted.id.to_string()])
            .await
            .unwrap();

        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, inserted.id);
    }

    #[tokio::test]
    async fn test_first_returns_lowest_id() {
        let (store, _dir) = create_test_store().await;

        assert_eq!(store.first().await.unwrap(), None);

        store.insert(&sample_book("A", "First")).await.unwrap();
        store.insert(&sample_book("B", "Second")).await.unwrap();

        let first = store.first().await.unwrap().unwrap();
        assert_eq!(first.title, "A");
    }

    #[tokio::test]
    async fn test_count_tracks_inserts() {
        let (store, _dir) = create_test_store().await;

        assert_eq!(store.count().await.unwrap(), 0);
        store.insert(&sample_book("A", "First")).await.unwrap();
        store.insert(&sample_book("B", "Second")).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_migrate_is_idempotent() {
        let (store, _dir) = create_test_store().await;
        store.migrate().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
