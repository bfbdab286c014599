pub mod accounts;
pub mod domain;
pub mod favorites;
pub mod ports;
pub mod session;

pub use accounts::{AccountError, LoginAttempt, Registration};
pub use domain::{AuthSession, Country, CountryCode, NewUser, SetMutation, User, UserCredentials};
pub use favorites::{FavoritesError, FavoritesResult, FavoritesService};
pub use ports::{
    AuthPayload, CountryDirectory, CredentialService, ExplorerApi, FavoritesUpdate, PortError,
    PortResult, UserStore,
};
pub use session::{ExplorerSession, Notice, SessionSnapshot};
