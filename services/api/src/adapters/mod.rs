pub mod countries;
pub mod db;
pub mod http_client;
pub mod memory;

pub use countries::RestCountriesAdapter;
pub use db::DbAdapter;
pub use http_client::HttpExplorerClient;
pub use memory::InMemoryStore;
