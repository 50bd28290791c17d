mod read;
mod types;

use super::PostgresStore;
