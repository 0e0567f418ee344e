pub mod jwt;
pub mod password;
pub mod roles;

pub use jwt::{issue, verify, Claims};
pub use roles::{authorize, Operation};
