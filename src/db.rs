use crate::models::product::{Product, ProductWithRating};
use crate::models::review::{Review, ReviewWithAuthor};
use crate::models::user::User;
use chrono::Utc;
use leptos::logging;
use leptos::logging::log;
use rusqlite::{Connection, Error, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

// Define a struct to represent a database connection
#[derive(Debug)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// True when `err` is a constraint violation, which for our schema means
/// a UNIQUE clause fired (duplicate username, duplicate token user, or a
/// second review for the same (product, user) pair).
pub fn is_unique_violation(err: &Error) -> bool {
    matches!(err, Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation)
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn review_from_row(row: &rusqlite::Row<'_>) -> Result<Review, Error> {
    Ok(Review {
        id: row.get(0)?,
        product: row.get(1)?,
        user: row.get(2)?,
        rating: row.get::<_, i64>(3)? as u8,
        feedback: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl Database {
    // Create a new database connection
    pub fn new(db_path: &str) -> Result<Self, Error> {
        let conn = Connection::open(db_path)?;
        // SQLite keeps foreign keys off unless asked; cascades depend on it
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        logging::log!("Database connection established at: {}", db_path);
        Ok(Database {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // Create the database schema
    pub async fn create_schema(&self) -> Result<(), Error> {
        let conn = self.conn.lock().await;

        // 1. Users table
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                is_staff INTEGER NOT NULL DEFAULT 0
            );",
        )
        .map_err(|e| {
            eprintln!("Failed creating users table: {}", e);
            e
        })?;

        // 2. API tokens, one per user, minted lazily
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tokens (
                key TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            eprintln!("Failed creating tokens table: {}", e);
            e
        })?;

        // 3. Browser sessions backing the sessionid cookie
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            eprintln!("Failed creating sessions table: {}", e);
            e
        })?;

        // 4. Products table
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                price REAL NOT NULL
            );",
        )
        .map_err(|e| {
            eprintln!("Failed creating products table: {}", e);
            e
        })?;

        // 5. Reviews table; at most one review per (product, user)
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY,
                product_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                rating INTEGER NOT NULL,
                feedback TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (product_id, user_id),
                FOREIGN KEY (product_id) REFERENCES products(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );",
        )
        .map_err(|e| {
            eprintln!("Failed creating reviews table: {}", e);
            e
        })?;
        Ok(())
    }

    // ---- users ----

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        is_staff: bool,
    ) -> Result<User, Error> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (username, password_hash, is_staff) VALUES (?, ?, ?)",
            rusqlite::params![username, password_hash, is_staff as i64],
        )?;
        let id = conn.last_insert_rowid();
        log!("User created: {} (id {})", username, id);
        Ok(User {
            id,
            username: username.to_string(),
            is_staff,
        })
    }

    /// Looks a user up by name, returning the stored password hash
    /// alongside the public record so the caller can verify credentials.
    pub async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, username, password_hash, is_staff FROM users WHERE username = ?",
            [username],
            |row| {
                Ok((
                    User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        is_staff: row.get::<_, i64>(3)? != 0,
                    },
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, username, is_staff FROM users WHERE id = ?",
            [id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    is_staff: row.get::<_, i64>(2)? != 0,
                })
            },
        )
        .optional()
    }

    /// Creates the named staff account, or promotes it if the username is
    /// already taken. Used by the startup admin bootstrap.
    pub async fn ensure_staff_user(&self, username: &str, password_hash: &str) -> Result<(), Error> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO users (username, password_hash, is_staff) VALUES (?, ?, 1)
             ON CONFLICT(username) DO UPDATE SET is_staff = 1",
            rusqlite::params![username, password_hash],
        )?;
        Ok(())
    }

    // ---- tokens ----

    pub async fn get_or_create_token(&self, user_id: i64) -> Result<String, Error> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row("SELECT key FROM tokens WHERE user_id = ?", [user_id], |row| {
                row.get(0)
            })
            .optional()?;
        let key = match existing {
            Some(key) => key,
            None => {
                let key = Uuid::new_v4().simple().to_string();
                tx.execute(
                    "INSERT INTO tokens (key, user_id, created_at) VALUES (?, ?, ?)",
                    rusqlite::params![key, user_id, Utc::now().to_rfc3339()],
                )?;
                key
            }
        };

        tx.commit()?;
        Ok(key)
    }

    pub async fn find_user_by_token(&self, key: &str) -> Result<Option<User>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT u.id, u.username, u.is_staff
             FROM tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.key = ?",
            [key],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    is_staff: row.get::<_, i64>(2)? != 0,
                })
            },
        )
        .optional()
    }

    // ---- sessions ----

    pub async fn create_session(&self, user_id: i64) -> Result<String, Error> {
        let conn = self.conn.lock().await;
        let id = Uuid::new_v4().simple().to_string();
        conn.execute(
            "INSERT INTO sessions (id, user_id, created_at) VALUES (?, ?, ?)",
            rusqlite::params![id, user_id, Utc::now().to_rfc3339()],
        )?;
        Ok(id)
    }

    pub async fn find_user_by_session(&self, session_id: &str) -> Result<Option<User>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT u.id, u.username, u.is_staff
             FROM sessions s
             JOIN users u ON u.id = s.user_id
             WHERE s.id = ?",
            [session_id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    is_staff: row.get::<_, i64>(2)? != 0,
                })
            },
        )
        .optional()
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), Error> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM sessions WHERE id = ?", [session_id])?;
        Ok(())
    }

    // ---- products ----

    pub async fn insert_product(
        &self,
        name: &str,
        description: &str,
        price: f64,
    ) -> Result<Product, Error> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO products (name, description, price) VALUES (?, ?, ?)",
            rusqlite::params![name, description, price],
        )?;
        let id = conn.last_insert_rowid();
        log!("Product created: {} (id {})", name, id);
        Ok(Product {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price,
        })
    }

    /// Returns true when the product existed and was updated.
    pub async fn update_product(
        &self,
        id: i64,
        name: &str,
        description: &str,
        price: f64,
    ) -> Result<bool, Error> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE products SET name = ?, description = ?, price = ? WHERE id = ?",
            rusqlite::params![name, description, price, id],
        )?;
        Ok(changed > 0)
    }

    /// Deletes a product; its reviews go with it via ON DELETE CASCADE.
    pub async fn delete_product(&self, id: i64) -> Result<bool, Error> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("DELETE FROM products WHERE id = ?", [id])?;
        if changed > 0 {
            log!("Product deleted: {}", id);
        }
        Ok(changed > 0)
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, name, description, price FROM products WHERE id = ?",
            [id],
            |row| {
                Ok(Product {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    price: row.get(3)?,
                })
            },
        )
        .optional()
    }

    // Retrieve all products with their review aggregates. average_rating
    // stays NULL (None) for products without reviews; otherwise it is the
    // mean rating rounded to one decimal.
    pub async fn list_products_with_ratings(&self) -> Result<Vec<ProductWithRating>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.description, p.price,
                    AVG(r.rating) AS average_rating,
                    COUNT(r.id) AS review_count
             FROM products p
             LEFT JOIN reviews r ON r.product_id = p.id
             GROUP BY p.id
             ORDER BY p.id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProductWithRating {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                price: row.get(3)?,
                average_rating: row.get::<_, Option<f64>>(4)?.map(round_to_tenth),
                review_count: row.get(5)?,
            })
        })?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    pub async fn get_product_with_rating(
        &self,
        id: i64,
    ) -> Result<Option<ProductWithRating>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT p.id, p.name, p.description, p.price,
                    AVG(r.rating) AS average_rating,
                    COUNT(r.id) AS review_count
             FROM products p
             LEFT JOIN reviews r ON r.product_id = p.id
             WHERE p.id = ?
             GROUP BY p.id",
            [id],
            |row| {
                Ok(ProductWithRating {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    price: row.get(3)?,
                    average_rating: row.get::<_, Option<f64>>(4)?.map(round_to_tenth),
                    review_count: row.get(5)?,
                })
            },
        )
        .optional()
    }

    // ---- reviews ----

    /// Inserts a review. A second review by the same user for the same
    /// product trips the UNIQUE constraint; callers detect that with
    /// [`is_unique_violation`].
    pub async fn insert_review(
        &self,
        product_id: i64,
        user_id: i64,
        rating: u8,
        feedback: &str,
    ) -> Result<Review, Error> {
        let conn = self.conn.lock().await;
        let created_at = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO reviews (product_id, user_id, rating, feedback, created_at)
             VALUES (?, ?, ?, ?, ?)",
            rusqlite::params![product_id, user_id, rating as i64, feedback, created_at],
        )?;
        let id = conn.last_insert_rowid();
        log!("Review created: product {} user {} rating {}", product_id, user_id, rating);
        Ok(Review {
            id,
            product: product_id,
            user: user_id,
            rating,
            feedback: feedback.to_string(),
            created_at,
        })
    }

    pub async fn get_review(&self, id: i64) -> Result<Option<Review>, Error> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, product_id, user_id, rating, feedback, created_at
             FROM reviews WHERE id = ?",
            [id],
            review_from_row,
        )
        .optional()
    }

    // Retrieve reviews, optionally restricted to a single product
    pub async fn list_reviews(&self, product_id: Option<i64>) -> Result<Vec<Review>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = match product_id {
            Some(_) => conn.prepare(
                "SELECT id, product_id, user_id, rating, feedback, created_at
                 FROM reviews WHERE product_id = ? ORDER BY id",
            )?,
            None => conn.prepare(
                "SELECT id, product_id, user_id, rating, feedback, created_at
                 FROM reviews ORDER BY id",
            )?,
        };
        let rows = match product_id {
            Some(pid) => stmt.query_map([pid], review_from_row)?,
            None => stmt.query_map([], review_from_row)?,
        };

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(reviews)
    }

    /// Reviews for one product joined with author usernames, newest first.
    pub async fn reviews_with_authors(
        &self,
        product_id: i64,
    ) -> Result<Vec<ReviewWithAuthor>, Error> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.rating, r.feedback, r.created_at, u.username
             FROM reviews r
             JOIN users u ON u.id = r.user_id
             WHERE r.product_id = ?
             ORDER BY r.created_at DESC, r.id DESC",
        )?;
        let rows = stmt.query_map([product_id], |row| {
            Ok(ReviewWithAuthor {
                id: row.get(0)?,
                rating: row.get::<_, i64>(1)? as u8,
                feedback: row.get(2)?,
                created_at: row.get(3)?,
                username: row.get(4)?,
            })
        })?;

        let mut reviews = Vec::new();
        for row in rows {
            reviews.push(row?);
        }
        Ok(reviews)
    }

    pub async fn update_review(&self, id: i64, rating: u8, feedback: &str) -> Result<bool, Error> {
        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE reviews SET rating = ?, feedback = ? WHERE id = ?",
            rusqlite::params![rating as i64, feedback, id],
        )?;
        Ok(changed > 0)
    }

    pub async fn delete_review(&self, id: i64) -> Result<bool, Error> {
        let conn = self.conn.lock().await;
        let changed = conn.execute("DELETE FROM reviews WHERE id = ?", [id])?;
        Ok(changed > 0)
    }

    pub async fn user_has_reviewed(&self, product_id: i64, user_id: i64) -> Result<bool, Error> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM reviews WHERE product_id = ? AND user_id = ?",
            [product_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
