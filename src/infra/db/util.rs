use crate::application::store::StoreError;

pub fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::Database(db)
            if db
                .message()
                .contains("canceling statement due to statement timeout") =>
        {
            StoreError::Timeout
        }
        sqlx::Error::Database(db) => StoreError::query(
            db.code()
                .map(|code| code.into_owned())
                .unwrap_or_else(|| "unknown".to_string()),
            db.message(),
        ),
        err @ (sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::TypeNotFound { .. }) => StoreError::decode(err),
        other => StoreError::unavailable(other),
    }
}
