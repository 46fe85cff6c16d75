/// Database layer
///
/// - `pool`: PostgreSQL connection pool with a start-up health check
/// - `migrations`: Embedded schema migrations
///
/// Models live in the crate-level `models` module.

pub mod migrations;
pub mod pool;
