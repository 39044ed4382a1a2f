use thiserror::Error;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl DatabaseError {
    pub fn duplicate(entity: &str, field: &str) -> Self {
        Self::DuplicateEntry(format!("{} with {} already exists", entity, field))
    }

    /// Classify an error raised by an INSERT. Unique violations become
    /// `DuplicateEntry`, foreign key violations `ConstraintViolation`.
    pub fn from_insert(err: sqlx::Error, entity: &str, field: &str) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                return Self::duplicate(entity, field);
            }
            if db_err.is_foreign_key_violation() {
                return Self::ConstraintViolation(db_err.message().to_string());
            }
        }
        Self::ConnectionError(err)
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateEntry(_))
    }
}
