pub mod attachment;
pub mod audit;
pub mod balance;
pub mod clock;
pub mod conflict;
pub mod error;
pub mod notify;
pub mod policy;
pub mod routing;
pub mod service;
pub mod status;
