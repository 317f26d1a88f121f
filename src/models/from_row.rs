use rusqlite::Row;

/// Build a model from a row selected by column name.
pub trait FromSqliteRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}
