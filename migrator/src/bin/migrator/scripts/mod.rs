//! Migration and seed scripts.
//!
//! Module declarations are added by `migrator new`.

mod accounts;
