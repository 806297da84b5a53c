pub mod books;
pub mod contributors;
pub mod genres;

pub use books::PostgresBooksRepository;
pub use contributors::PostgresContributorsRepository;
pub use genres::PostgresGenresRepository;
