pub mod client;
pub mod query;
pub mod response;
pub mod transport;

pub use client::{AccessMode, ClientFactory, TenantClient};
pub use query::{Filter, FilterOperator, QueryBuilder};
pub use response::PostgrestResponse;
pub use transport::{RawResponse, ReqwestTransport, Transport};
