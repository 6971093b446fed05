use sqlx::FromRow;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: i64,       // assigned by the store, never reused
    pub name: String,
    pub email: String,      // unique, case-sensitive
    pub password: String,   // Argon2 hash
    pub created_at: i64,    // unix seconds
    pub updated_at: i64,    // unix seconds
}

/// A user that has not been given an identifier yet.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl NewUser {
    pub fn with_id(self, user_id: i64) -> User {
        User {
            user_id,
            name: self.name,
            email: self.email,
            password: self.password,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
