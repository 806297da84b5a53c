//! Repository ports (interfaces) grouped by catalog entity. Services and the
//! HTTP layer depend on these; the Postgres adapters live under
//! `database::postgres`.

pub mod books;
pub mod contributors;
pub mod genres;

pub use books::BooksRepository;
pub use contributors::ContributorsRepository;
pub use genres::GenresRepository;
