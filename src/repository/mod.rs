//! Repository layer for database operations

pub mod borrows;
pub mod copies;
pub mod editions;
pub mod fine_policies;
pub mod libraries;
pub mod reservations;
pub mod shipments;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub borrows: borrows::BorrowsRepository,
    pub copies: copies::CopiesRepository,
    pub editions: editions::EditionsRepository,
    pub fine_policies: fine_policies::FinePoliciesRepository,
    pub libraries: libraries::LibrariesRepository,
    pub reservations: reservations::ReservationsRepository,
    pub shipments: shipments::ShipmentsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            copies: copies::CopiesRepository::new(pool.clone()),
            editions: editions::EditionsRepository::new(pool.clone()),
            fine_policies: fine_policies::FinePoliciesRepository::new(pool.clone()),
            libraries: libraries::LibrariesRepository::new(pool.clone()),
            reservations: reservations::ReservationsRepository::new(pool.clone()),
            shipments: shipments::ShipmentsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}
